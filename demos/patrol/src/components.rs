// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Plugin components of the patrol demo.
//!
//! Each component is ordinary user logic behind the [Runnable] trait; the
//! scheduling core drives them through phase barriers without knowing what
//! they compute.

use lockstep::prelude::*;
use log::{debug, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Simulated laser sensor: acquires a scan each sense phase and reports a
/// message on its blackboard interface.
pub struct LaserSensor {
    pub interface: InterfaceId,
    pub messages: Arc<MessageNotifier>,
    pub scans: Arc<AtomicUsize>,
}

impl Runnable for LaserSensor {
    fn init(&mut self) -> Result<(), Error> {
        info!("Laser sensor on {} ready", self.interface);
        Ok(())
    }

    fn step(&mut self) -> Result<(), Error> {
        let scan = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Acquired scan #{scan}");
        // hand the scan to the interface owner; here only the arrival event matters
        self.messages.notify_message(&self.interface);
        Ok(())
    }

    fn finalize(&mut self) {
        info!("Laser sensor shut down after {} scans", self.scans.load(Ordering::SeqCst));
    }
}

/// Filter stage run in the act phase
pub struct ScanFilter {
    pub filtered: Arc<AtomicUsize>,
}

impl Runnable for ScanFilter {
    fn step(&mut self) -> Result<(), Error> {
        self.filtered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Motor actuator run in the act phase
pub struct MotorActuator;

impl Runnable for MotorActuator {
    fn step(&mut self) -> Result<(), Error> {
        debug!("Applying motor command");
        Ok(())
    }
}

/// Free consumer woken by the on-message waker, independent of the phases
pub struct ScanConsumer {
    pub consumed: Arc<AtomicUsize>,
}

impl Runnable for ScanConsumer {
    fn step(&mut self) -> Result<(), Error> {
        let consumed = self.consumed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Consumed scan message #{consumed}");
        Ok(())
    }
}

/// Observer logging laser interface lifecycle events
pub struct LaserWatcher;

impl LifecycleObserver for LaserWatcher {
    fn interface_created(&self, interface_type: &str, id: &str) -> Result<(), Error> {
        info!("Interface {interface_type}::{id} appeared");
        Ok(())
    }

    fn interface_destroyed(&self, interface_type: &str, id: &str) -> Result<(), Error> {
        info!("Interface {interface_type}::{id} vanished");
        Ok(())
    }
}
