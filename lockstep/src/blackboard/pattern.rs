// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Glob matching for interface type and id patterns.
//!
//! The only wildcard is `*`, matching any sequence of characters including the
//! empty one; everything else is literal. Type and id strings are opaque ASCII
//! tokens.

/// Match `text` against a glob `pattern`.
pub fn matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();

    // Iterative star backtracking: remember the position of the last `*` and
    // how much of the text it has swallowed so far.
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            // extend the last star by one character and retry
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
