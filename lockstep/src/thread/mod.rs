// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Managed threads: schedulable units of work on native OS threads, with
//! free-running and wait-for-wakeup operating modes, cooperative cancellation
//! and a two-phase finalization protocol.

mod group;
mod listener;
mod managed;
pub(crate) mod registry;

pub use group::ThreadGroup;
pub use listener::{LoopListener, NotificationListener};
pub use managed::{ManagedThread, OpMode, Runnable, ThreadHandle, FLAG_BAD};
pub use registry::current_thread;
