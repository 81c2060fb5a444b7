// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! LOCKSTEP is the concurrency and notification core of a modular robot-control
//! middleware: independently developed plugins run in lockstep phases of a
//! real-time control cycle and exchange typed state over a shared blackboard.
//!
//! # Managed Threads
//!
//! [Managed threads](crate::thread::ManagedThread) are the units of execution. Each one
//! wraps a native OS thread running user logic behind the [Runnable](crate::thread::Runnable)
//! trait and operates either free-running or in wait-for-wakeup mode, where it sleeps
//! between control cycles until explicitly woken.
//!
//! # Phase Locking
//!
//! An external scheduler drives a control cycle by waking the threads assigned to a
//! timing phase and waiting on a [RendezvousBarrier](crate::barrier::RendezvousBarrier)
//! until all of them have completed, with timeout and forced-interrupt escape hatches.
//!
//! # Blackboard Notifications
//!
//! Components discover named, typed interfaces and react to their messages through
//! [crate::blackboard]: lifecycle events matched by (type, id) glob patterns, message
//! listeners bound to a single interface instance, and a wake adapter that turns
//! "message arrived" into a thread wakeup.

pub mod barrier;
pub mod blackboard;
pub mod error;
pub mod thread;

/// Re-export the public API
pub mod prelude {
    pub use crate::barrier::RendezvousBarrier;
    pub use crate::blackboard::{
        InterfaceId, LifecycleNotifier, LifecycleObserver, MessageListener, MessageNotifier,
        ObserverInterest, OnMessageWaker,
    };
    pub use crate::error::Error;
    pub use crate::thread::{
        LoopListener, ManagedThread, NotificationListener, OpMode, Runnable, ThreadGroup,
        ThreadHandle,
    };
}
