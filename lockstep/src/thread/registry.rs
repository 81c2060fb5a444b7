// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Process-wide registry mapping native thread ids to managed-thread handles,
//! so the current managed thread can be recovered from any call stack.

use super::ThreadHandle;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::thread;

static REGISTRY: OnceLock<Mutex<HashMap<thread::ThreadId, ThreadHandle>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<thread::ThreadId, ThreadHandle>> {
    REGISTRY.get_or_init(Default::default)
}

/// Register the calling native thread as the given managed thread.
///
/// Called on thread entry; the entry is removed again on thread exit.
pub(crate) fn register(handle: ThreadHandle) {
    registry()
        .lock()
        .unwrap()
        .insert(thread::current().id(), handle);
}

/// Remove the calling native thread's registry entry
pub(crate) fn deregister() {
    registry().lock().unwrap().remove(&thread::current().id());
}

/// Handle of the managed thread the caller is running on, if any.
///
/// Returns `None` on native threads not owned by a [ManagedThread](super::ManagedThread).
pub fn current_thread() -> Option<ThreadHandle> {
    registry()
        .lock()
        .unwrap()
        .get(&thread::current().id())
        .cloned()
}

/// Diagnostic name of the calling party: the managed-thread name when the
/// caller is a managed thread, the native thread name otherwise.
pub(crate) fn current_party_name() -> String {
    if let Some(handle) = current_thread() {
        return handle.name().to_string();
    }
    let current = thread::current();
    current
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", current.id()))
}
