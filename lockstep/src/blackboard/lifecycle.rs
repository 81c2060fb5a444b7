// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::pattern;
use crate::error::Error;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Observer of interface lifecycle events.
///
/// Registered with a [LifecycleNotifier] together with the
/// [ObserverInterest] patterns selecting the events to deliver.
pub trait LifecycleObserver: Send + Sync {
    /// A matching interface instance was created
    fn interface_created(&self, interface_type: &str, id: &str) -> Result<(), Error> {
        let _ = (interface_type, id);
        Ok(())
    }

    /// A matching interface instance was destroyed
    fn interface_destroyed(&self, interface_type: &str, id: &str) -> Result<(), Error> {
        let _ = (interface_type, id);
        Ok(())
    }
}

/// Pattern sets describing which lifecycle events an observer wants.
///
/// Two independent sets, one for the created-event stream and one for the
/// destroyed-event stream, each mapping a type glob to its id globs. Duplicate
/// pattern pairs are idempotent.
#[derive(Debug, Default, Clone)]
pub struct ObserverInterest {
    create: HashMap<String, Vec<String>>,
    destroy: HashMap<String, Vec<String>>,
}

impl ObserverInterest {
    pub fn new() -> ObserverInterest {
        Default::default()
    }

    /// Observe creation of interfaces matching the type pattern, any id
    pub fn create(self, type_pattern: &str) -> Self {
        self.create_with_id(type_pattern, "*")
    }

    /// Observe creation of interfaces matching both patterns
    pub fn create_with_id(mut self, type_pattern: &str, id_pattern: &str) -> Self {
        Self::add(&mut self.create, type_pattern, id_pattern);
        self
    }

    /// Observe destruction of interfaces matching the type pattern, any id
    pub fn destroy(self, type_pattern: &str) -> Self {
        self.destroy_with_id(type_pattern, "*")
    }

    /// Observe destruction of interfaces matching both patterns
    pub fn destroy_with_id(mut self, type_pattern: &str, id_pattern: &str) -> Self {
        Self::add(&mut self.destroy, type_pattern, id_pattern);
        self
    }

    fn add(map: &mut HashMap<String, Vec<String>>, type_pattern: &str, id_pattern: &str) {
        let id_patterns = map.entry(type_pattern.to_string()).or_default();
        if !id_patterns.iter().any(|p| p == id_pattern) {
            id_patterns.push(id_pattern.to_string());
        }
    }

    fn merge(&mut self, other: ObserverInterest) {
        for (type_pattern, id_patterns) in other.create {
            for id_pattern in id_patterns {
                Self::add(&mut self.create, &type_pattern, &id_pattern);
            }
        }
        for (type_pattern, id_patterns) in other.destroy {
            for id_pattern in id_patterns {
                Self::add(&mut self.destroy, &type_pattern, &id_pattern);
            }
        }
    }

    fn matches(map: &HashMap<String, Vec<String>>, interface_type: &str, id: &str) -> bool {
        map.iter().any(|(type_pattern, id_patterns)| {
            pattern::matches(type_pattern, interface_type)
                && id_patterns.iter().any(|p| pattern::matches(p, id))
        })
    }

    fn matches_create(&self, interface_type: &str, id: &str) -> bool {
        Self::matches(&self.create, interface_type, id)
    }

    fn matches_destroy(&self, interface_type: &str, id: &str) -> bool {
        Self::matches(&self.destroy, interface_type, id)
    }
}

struct ObserverEntry {
    observer: Arc<dyn LifecycleObserver>,
    interest: ObserverInterest,
}

/// Dispatch hub for interface lifecycle events.
///
/// The interface-management subsystem reports every instantiation and teardown
/// of a named, typed interface here; registered observers whose patterns match
/// receive the event exactly once, in registration order, on the publisher's
/// thread. A failing observer callback is logged and does not abort delivery
/// to the remaining observers.
#[derive(Default)]
pub struct LifecycleNotifier {
    observers: Mutex<Vec<ObserverEntry>>,
}

impl LifecycleNotifier {
    pub fn new() -> LifecycleNotifier {
        Default::default()
    }

    /// Register an observer with its interest patterns.
    ///
    /// Re-registering an already known observer merges the given interest into
    /// the existing one; duplicate patterns have no effect.
    pub fn register(&self, observer: Arc<dyn LifecycleObserver>, interest: ObserverInterest) {
        let mut observers = self.observers.lock().unwrap();
        if let Some(entry) = observers
            .iter_mut()
            .find(|e| Arc::ptr_eq(&e.observer, &observer))
        {
            entry.interest.merge(interest);
        } else {
            observers.push(ObserverEntry { observer, interest });
        }
    }

    /// Remove an observer.
    ///
    /// Blocks while a notification fan-out is in flight; once this returns the
    /// observer will not be delivered to anymore and may be freed.
    pub fn deregister(&self, observer: &Arc<dyn LifecycleObserver>) {
        let mut observers = self.observers.lock().unwrap();
        observers.retain(|e| !Arc::ptr_eq(&e.observer, observer));
    }

    /// Report that an interface instance was created
    pub fn notify_created(&self, interface_type: &str, id: &str) {
        let observers = self.observers.lock().unwrap();
        for entry in observers.iter() {
            if entry.interest.matches_create(interface_type, id) {
                if let Err(e) = entry.observer.interface_created(interface_type, id) {
                    warn!("Interface-created observer failed for {interface_type}::{id}: {e}");
                }
            }
        }
    }

    /// Report that an interface instance was destroyed
    pub fn notify_destroyed(&self, interface_type: &str, id: &str) {
        let observers = self.observers.lock().unwrap();
        for entry in observers.iter() {
            if entry.interest.matches_destroy(interface_type, id) {
                if let Err(e) = entry.observer.interface_destroyed(interface_type, id) {
                    warn!("Interface-destroyed observer failed for {interface_type}::{id}: {e}");
                }
            }
        }
    }
}
