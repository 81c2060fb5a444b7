// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Error;
use log::warn;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// Identity of one interface instance on the blackboard: a (type, id) pair of
/// opaque ASCII tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceId {
    interface_type: String,
    id: String,
}

impl InterfaceId {
    pub fn new(interface_type: impl Into<String>, id: impl Into<String>) -> InterfaceId {
        InterfaceId {
            interface_type: interface_type.into(),
            id: id.into(),
        }
    }

    /// Type token of the interface
    pub fn interface_type(&self) -> &str {
        &self.interface_type
    }

    /// Id token of the interface
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unique identifier of the instance, `Type::id`
    pub fn uid(&self) -> String {
        format!("{}::{}", self.interface_type, self.id)
    }
}

impl Display for InterfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.interface_type, self.id)
    }
}

/// Listener for messages arriving on one interface instance.
///
/// The listener is told that a message was enqueued; it never reads or
/// consumes the message itself, that is the receiving thread's job through
/// the interface's own read API.
pub trait MessageListener: Send + Sync {
    fn message_received(&self, interface: &InterfaceId) -> Result<(), Error>;
}

/// Dispatch hub for message-arrival events.
///
/// The interface-management subsystem calls
/// [notify_message](MessageNotifier::notify_message) whenever a message is
/// enqueued on an instance's queue; all listeners bound to that exact instance
/// are delivered to in registration order, on the publisher's thread. Failing
/// callbacks are logged and contained.
#[derive(Default)]
pub struct MessageNotifier {
    listeners: Mutex<HashMap<InterfaceId, Vec<Arc<dyn MessageListener>>>>,
}

impl MessageNotifier {
    pub fn new() -> MessageNotifier {
        Default::default()
    }

    /// Bind a listener to an interface instance; idempotent per listener identity
    pub fn register_listener(&self, interface: &InterfaceId, listener: Arc<dyn MessageListener>) {
        let mut listeners = self.listeners.lock().unwrap();
        let bound = listeners.entry(interface.clone()).or_default();
        if !bound.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            bound.push(listener);
        }
    }

    /// Remove a listener binding.
    ///
    /// Blocks while a fan-out on the instance is in flight; once this returns
    /// the listener will not be delivered to anymore.
    pub fn deregister_listener(&self, interface: &InterfaceId, listener: &Arc<dyn MessageListener>) {
        let mut listeners = self.listeners.lock().unwrap();
        if let Some(bound) = listeners.get_mut(interface) {
            bound.retain(|l| !Arc::ptr_eq(l, listener));
            if bound.is_empty() {
                listeners.remove(interface);
            }
        }
    }

    /// Report that a message was enqueued on the given instance
    pub fn notify_message(&self, interface: &InterfaceId) {
        let listeners = self.listeners.lock().unwrap();
        if let Some(bound) = listeners.get(interface) {
            for listener in bound {
                if let Err(e) = listener.message_received(interface) {
                    warn!("Message listener failed for {interface}: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingListener {
        received: AtomicUsize,
        fail: bool,
    }

    impl MessageListener for CountingListener {
        fn message_received(&self, _interface: &InterfaceId) -> Result<(), Error> {
            self.received.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Callback("listener rigged to fail".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn listener_observes_exactly_one_instance() {
        let notifier = MessageNotifier::new();
        let laser = InterfaceId::new("LaserInterface", "front");
        let camera = InterfaceId::new("CameraInterface", "front");
        let listener = Arc::new(CountingListener::default());
        notifier.register_listener(&laser, listener.clone());

        notifier.notify_message(&laser);
        notifier.notify_message(&camera);
        assert_eq!(listener.received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let notifier = MessageNotifier::new();
        let laser = InterfaceId::new("LaserInterface", "front");
        let listener = Arc::new(CountingListener::default());
        notifier.register_listener(&laser, listener.clone());
        notifier.register_listener(&laser, listener.clone());

        notifier.notify_message(&laser);
        assert_eq!(listener.received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_listener_does_not_abort_fanout() {
        let notifier = MessageNotifier::new();
        let laser = InterfaceId::new("LaserInterface", "front");
        let failing = Arc::new(CountingListener {
            fail: true,
            ..Default::default()
        });
        let healthy = Arc::new(CountingListener::default());
        notifier.register_listener(&laser, failing.clone());
        notifier.register_listener(&laser, healthy.clone());

        notifier.notify_message(&laser);
        assert_eq!(failing.received.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deregistered_listener_no_longer_delivered() {
        let notifier = MessageNotifier::new();
        let laser = InterfaceId::new("LaserInterface", "front");
        let listener = Arc::new(CountingListener::default());
        let as_dyn: Arc<dyn MessageListener> = listener.clone();
        notifier.register_listener(&laser, as_dyn.clone());

        notifier.notify_message(&laser);
        notifier.deregister_listener(&laser, &as_dyn);
        notifier.notify_message(&laser);
        assert_eq!(listener.received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interface_uid_format() {
        let laser = InterfaceId::new("LaserInterface", "front");
        assert_eq!(laser.uid(), "LaserInterface::front");
        assert_eq!(laser.to_string(), "LaserInterface::front");
    }
}
