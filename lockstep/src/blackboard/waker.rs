// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::message::{InterfaceId, MessageListener, MessageNotifier};
use crate::error::Error;
use crate::thread::{OpMode, ThreadHandle};
use std::sync::Arc;

struct WakeListener {
    thread: ThreadHandle,
}

impl MessageListener for WakeListener {
    fn message_received(&self, _interface: &InterfaceId) -> Result<(), Error> {
        if self.thread.op_mode() == OpMode::WaitForWakeup {
            self.thread.wakeup();
        }
        Ok(())
    }
}

/// Wake a thread whenever a message arrives on one interface instance.
///
/// Lets a consumer thread block in wait-for-wakeup mode until there is a
/// message to process instead of busy-polling the queue. The adapter registers
/// itself with the notifier on construction and deregisters on drop; it owns
/// neither the thread nor the interface.
pub struct OnMessageWaker {
    notifier: Arc<MessageNotifier>,
    interface: InterfaceId,
    listener: Arc<WakeListener>,
}

impl OnMessageWaker {
    /// Bind `thread` to message arrivals on `interface`
    pub fn new(
        notifier: Arc<MessageNotifier>,
        interface: InterfaceId,
        thread: ThreadHandle,
    ) -> OnMessageWaker {
        let listener = Arc::new(WakeListener { thread });
        notifier.register_listener(&interface, listener.clone());
        OnMessageWaker {
            notifier,
            interface,
            listener,
        }
    }

    /// The observed interface instance
    pub fn interface(&self) -> &InterfaceId {
        &self.interface
    }

    /// The thread woken on message arrival
    pub fn thread(&self) -> &ThreadHandle {
        &self.listener.thread
    }
}

impl Drop for OnMessageWaker {
    fn drop(&mut self) {
        let listener: Arc<dyn MessageListener> = self.listener.clone();
        self.notifier.deregister_listener(&self.interface, &listener);
    }
}
