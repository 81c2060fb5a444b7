// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::ThreadHandle;

/// Listener informed about thread startup events.
///
/// Registered via [ManagedThread::add_notification_listener](super::ManagedThread::add_notification_listener).
/// Callbacks run on the managed thread itself and must be fast and non-blocking;
/// they must not register or remove listeners on the same thread.
pub trait NotificationListener: Send + Sync {
    /// Called once the thread has completed its init sequence and entered its loop
    fn thread_started(&self, thread: &ThreadHandle);

    /// Called if the thread's init sequence failed; the thread is flagged bad
    fn thread_init_failed(&self, thread: &ThreadHandle);
}

/// Listener informed before and after each loop iteration of a thread.
pub trait LoopListener: Send + Sync {
    /// Called right before the thread's step
    fn pre_loop(&self, thread: &ThreadHandle);

    /// Called right after the thread's step
    fn post_loop(&self, thread: &ThreadHandle);
}
