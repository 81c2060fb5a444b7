// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Reusable N-party rendezvous barrier with timeout and forced interrupt.
//!
//! The native barrier primitive has no timed wait, so the timed/interruptible
//! stage is built from a counter and a condvar. A plain [std::sync::Barrier]
//! serves as a second, hard synchronization stage that is only entered on fully
//! successful rounds, giving the same guarantees as a plain barrier in the
//! non-degenerate case.

use crate::error::Error;
use crate::thread::registry;
use std::sync::{Barrier, Condvar, Mutex};
use std::time::{Duration, Instant};

struct RoundState {
    /// Parties still expected in the current round
    threads_left: usize,
    /// Names of the parties that arrived in the current round
    passed: Vec<String>,
    /// Set by interrupt(); cleared by reset() or on the first arrival of a fresh round
    interrupted: bool,
    /// Set by the first party to observe its relative timeout expire
    timed_out: bool,
    /// Set by the last arrival; directs all parties into the hard barrier stage
    wait_at_hard_barrier: bool,
    /// Number of threads currently inside wait(), gates safe destruction
    in_wait: usize,
}

/// A reusable synchronization point for a fixed number of parties.
///
/// Each call to [wait](RendezvousBarrier::wait) blocks until the target number
/// of parties has arrived, the given relative timeout expires, or the barrier
/// is interrupted from outside. After a timeout or interrupt the barrier stays
/// in the failed state and must be [reset](RendezvousBarrier::reset) before it
/// can serve another round.
///
/// A barrier has a non-duplicable identity; share it across threads via `Arc`.
pub struct RendezvousBarrier {
    count: usize,
    state: Mutex<RoundState>,
    cond: Condvar,
    hard: Barrier,
}

impl RendezvousBarrier {
    /// Create a barrier for `count` parties.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn new(count: usize) -> RendezvousBarrier {
        assert!(count >= 1, "barrier party count must be at least 1");
        RendezvousBarrier {
            count,
            state: Mutex::new(RoundState {
                threads_left: 0,
                passed: Vec::new(),
                interrupted: false,
                timed_out: false,
                wait_at_hard_barrier: false,
                in_wait: 0,
            }),
            cond: Condvar::new(),
            hard: Barrier::new(count),
        }
    }

    /// Target party count of this barrier
    pub fn count(&self) -> usize {
        self.count
    }

    /// Register arrival and wait for the other parties.
    ///
    /// Blocks until as many parties have called `wait` as were given to the
    /// constructor. Returns `Ok(true)` if the round completed, `Ok(false)` if
    /// the relative `timeout` expired first (`None` waits unboundedly). A party
    /// arriving while the barrier is already interrupted or timed out returns
    /// `Ok(true)` immediately without registering, so only the first wave of
    /// callers pays the failure cost.
    ///
    /// # Errors
    ///
    /// Returns [Error::BarrierInterrupted] to every blocked party if the round
    /// was forcefully interrupted via [interrupt](RendezvousBarrier::interrupt).
    pub fn wait(&self, timeout: Option<Duration>) -> Result<bool, Error> {
        let mut state = self.state.lock().unwrap();
        state.in_wait += 1;

        if state.threads_left == 0 {
            // first arrival of a fresh round
            state.interrupted = false;
            state.timed_out = false;
            state.wait_at_hard_barrier = false;
            state.threads_left = self.count;
            state.passed.clear();
        } else if state.interrupted || state.timed_out {
            // late arrival into a failed round, needs reset() before reuse
            state.in_wait -= 1;
            return Ok(true);
        }

        state.threads_left -= 1;
        state.passed.push(registry::current_party_name());

        // The last arrival is responsible for waking the others, so no wakeup
        // can be missed regardless of arrival order.
        let waker = state.threads_left == 0;
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut local_timeout = false;

        while state.threads_left != 0 && !state.interrupted && !state.timed_out && !local_timeout {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        local_timeout = true;
                        break;
                    }
                    let (guard, result) = self.cond.wait_timeout(state, deadline - now).unwrap();
                    state = guard;
                    local_timeout = result.timed_out();
                }
                None => {
                    state = self.cond.wait(state).unwrap();
                }
            }
        }

        if local_timeout && state.threads_left != 0 {
            // first to observe the timeout, the other parties pick up the flag
            state.timed_out = true;
        }

        if state.interrupted {
            let reached = self.count - state.threads_left;
            state.in_wait -= 1;
            return Err(Error::BarrierInterrupted {
                reached,
                count: self.count,
            });
        }

        if waker {
            state.wait_at_hard_barrier = true;
        }
        if waker || local_timeout {
            self.cond.notify_all();
        }

        let wait_at_hard_barrier = state.wait_at_hard_barrier;
        drop(state);

        if wait_at_hard_barrier {
            // hard synchronization, all parties physically present
            self.hard.wait();
        }

        let mut state = self.state.lock().unwrap();
        state.in_wait -= 1;
        Ok(!state.timed_out)
    }

    /// Interrupt the barrier.
    ///
    /// All parties currently blocked in [wait](RendezvousBarrier::wait) return
    /// [Error::BarrierInterrupted] and no further party will block. Safe to call
    /// from any thread, including one not participating in the round. The
    /// barrier must be [reset](RendezvousBarrier::reset) before the next round.
    pub fn interrupt(&self) {
        let mut state = self.state.lock().unwrap();
        state.interrupted = true;
        self.cond.notify_all();
    }

    /// Clear the barrier after an interrupt or timeout.
    ///
    /// Restores the expected party count and clears the passed list. The caller
    /// must guarantee that no thread is inside
    /// [wait](RendezvousBarrier::wait), checked via
    /// [no_threads_in_wait](RendezvousBarrier::no_threads_in_wait).
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.interrupted = false;
        state.timed_out = false;
        state.threads_left = self.count;
        state.passed.clear();
    }

    /// Names of the parties that arrived in the most recent round.
    ///
    /// With some bookkeeping outside of the barrier this tells which expected
    /// parties failed to arrive.
    pub fn passed_threads(&self) -> Vec<String> {
        self.state.lock().unwrap().passed.clone()
    }

    /// True iff no thread is currently inside [wait](RendezvousBarrier::wait).
    ///
    /// Used to gate [reset](RendezvousBarrier::reset) and safe destruction.
    pub fn no_threads_in_wait(&self) -> bool {
        self.state.lock().unwrap().in_wait == 0
    }
}
