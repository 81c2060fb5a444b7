// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! LOCKSTEP Error implementation

/// LOCKSTEP Error type
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// A rendezvous barrier round was forcefully interrupted. Carries the number
    /// of parties that had reached the barrier and the target party count.
    BarrierInterrupted { reached: usize, count: usize },
    /// A thread lifecycle operation was invoked in the wrong state
    Thread(&'static str),
    /// A thread's init sequence failed
    Init(String),
    /// An observer or listener callback failed
    Callback(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BarrierInterrupted { reached, count } => write!(
                f,
                "Barrier forcefully interrupted, only {} of {} threads reached the barrier",
                reached, count
            ),
            Error::Thread(description) => write!(f, "Thread error, {}", description),
            Error::Init(description) => write!(f, "Init failed: {}", description),
            Error::Callback(description) => write!(f, "Callback failed: {}", description),
        }
    }
}
