// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::managed::{ManagedThread, ThreadHandle};
use crate::barrier::RendezvousBarrier;
use crate::error::Error;
use std::sync::Arc;

/// Ordered group of managed threads driven as one timing phase.
///
/// The external scheduler assigns threads to phases and drives each phase
/// through batch operations: wake all members at the phase barrier, wait on
/// that barrier, and on shutdown run the two-phase finalization across the
/// whole group.
pub struct ThreadGroup {
    name: String,
    threads: Vec<ManagedThread>,
}

impl ThreadGroup {
    /// Create an empty group with a diagnostic name
    pub fn new(name: impl Into<String>) -> ThreadGroup {
        ThreadGroup {
            name: name.into(),
            threads: Vec::new(),
        }
    }

    /// Diagnostic name of the group
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a thread to the group
    pub fn add(&mut self, thread: ManagedThread) {
        self.threads.push(thread);
    }

    /// Number of threads in the group
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether the group is empty
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Shared handles of all members, in group order
    pub fn handles(&self) -> Vec<ThreadHandle> {
        self.threads.iter().map(|t| t.handle()).collect()
    }

    /// Iterate over the members
    pub fn iter(&self) -> std::slice::Iter<ManagedThread> {
        self.threads.iter()
    }

    /// Start all members, stopping at the first failure
    pub fn start_all(&mut self, wait: bool) -> Result<(), Error> {
        for thread in &mut self.threads {
            thread.start(wait)?;
        }
        Ok(())
    }

    /// Wake all members for one more loop iteration
    pub fn wakeup_all(&self) {
        for thread in &self.threads {
            thread.wakeup();
        }
    }

    /// Wake all members and have each rendezvous at the phase barrier after
    /// its next loop iteration. The barrier's party count covers the group
    /// members plus any waiting scheduler party.
    pub fn wakeup_all_at(&self, barrier: &Arc<RendezvousBarrier>) {
        for thread in &self.threads {
            thread.wakeup_at(barrier.clone());
        }
    }

    /// Request cancellation of all members
    pub fn cancel_all(&self) {
        for thread in &self.threads {
            thread.cancel();
        }
    }

    /// Join all members, stopping at the first failure
    pub fn join_all(&mut self) -> Result<(), Error> {
        for thread in &mut self.threads {
            thread.join()?;
        }
        Ok(())
    }

    /// Ask every member whether it is safe to stop.
    ///
    /// Returns true iff all members accept; on refusal the caller reverts the
    /// accepted members via [cancel_finalize_all](ThreadGroup::cancel_finalize_all).
    pub fn prepare_finalize_all(&self) -> bool {
        let mut all_accepted = true;
        for thread in &self.threads {
            all_accepted &= thread.prepare_finalize();
        }
        all_accepted
    }

    /// Abort pending finalize requests of all members
    pub fn cancel_finalize_all(&self) {
        for thread in &self.threads {
            thread.cancel_finalize();
        }
    }

    /// Run teardown on all members, stopping at the first failure
    pub fn finalize_all(&self) -> Result<(), Error> {
        for thread in &self.threads {
            thread.finalize()?;
        }
        Ok(())
    }
}
