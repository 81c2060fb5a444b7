// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Patrol demo: a minimal control cycle over the lockstep core.
//!
//! Acts as the scheduler collaborator: per cycle it wakes the sense-phase
//! threads, waits at the phase barrier, then drives the act phase the same
//! way. A free consumer thread is woken through the on-message waker whenever
//! the sensor reports a scan message.

mod components;

use components::{LaserSensor, LaserWatcher, MotorActuator, ScanConsumer, ScanFilter};
use lockstep::prelude::*;
use log::{info, warn, LevelFilter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CYCLE_TIME: Duration = Duration::from_millis(100);
const PHASE_TIMEOUT: Duration = Duration::from_millis(50);
const CYCLES: usize = 10;

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .init();

    let lifecycle = LifecycleNotifier::new();
    let messages = Arc::new(MessageNotifier::new());
    let laser = InterfaceId::new("LaserInterface", "front");

    // watch laser interfaces, whatever their id
    let watcher: Arc<dyn LifecycleObserver> = Arc::new(LaserWatcher);
    lifecycle.register(watcher.clone(), ObserverInterest::new().create("Laser*").destroy("Laser*"));

    let scans = Arc::new(AtomicUsize::new(0));
    let filtered = Arc::new(AtomicUsize::new(0));
    let consumed = Arc::new(AtomicUsize::new(0));

    let mut sense_phase = ThreadGroup::new("sense");
    sense_phase.add(ManagedThread::new(
        "laser-sensor",
        OpMode::WaitForWakeup,
        Box::new(LaserSensor {
            interface: laser.clone(),
            messages: messages.clone(),
            scans: scans.clone(),
        }),
    ));

    let mut act_phase = ThreadGroup::new("act");
    act_phase.add(ManagedThread::new(
        "scan-filter",
        OpMode::WaitForWakeup,
        Box::new(ScanFilter {
            filtered: filtered.clone(),
        }),
    ));
    act_phase.add(ManagedThread::new(
        "motor-actuator",
        OpMode::WaitForWakeup,
        Box::new(MotorActuator),
    ));

    let mut consumer = ManagedThread::new(
        "scan-consumer",
        OpMode::WaitForWakeup,
        Box::new(ScanConsumer {
            consumed: consumed.clone(),
        }),
    );
    let waker = OnMessageWaker::new(messages.clone(), laser.clone(), consumer.handle());

    sense_phase.start_all(true).expect("could not start sense phase");
    act_phase.start_all(true).expect("could not start act phase");
    consumer.start(true).expect("could not start consumer");

    // the interface-management subsystem would report this on instantiation
    lifecycle.notify_created(laser.interface_type(), laser.id());

    // one barrier per phase: group members plus this scheduler thread
    let sense_barrier = Arc::new(RendezvousBarrier::new(sense_phase.len() + 1));
    let act_barrier = Arc::new(RendezvousBarrier::new(act_phase.len() + 1));

    for cycle in 1..=CYCLES {
        let cycle_start = Instant::now();

        run_phase(&sense_phase, &sense_barrier);
        run_phase(&act_phase, &act_barrier);

        let elapsed = cycle_start.elapsed();
        let time_left = CYCLE_TIME.saturating_sub(elapsed);
        if time_left.is_zero() {
            warn!("Cycle {cycle} overran its budget: {elapsed:?}");
        } else {
            std::thread::sleep(time_left);
        }
    }

    lifecycle.notify_destroyed(laser.interface_type(), laser.id());
    drop(waker);

    // orderly shutdown: ask first, then tear down, then stop the threads
    if sense_phase.prepare_finalize_all() && act_phase.prepare_finalize_all() {
        sense_phase.finalize_all().expect("sense finalize failed");
        act_phase.finalize_all().expect("act finalize failed");
    } else {
        sense_phase.cancel_finalize_all();
        act_phase.cancel_finalize_all();
    }
    sense_phase.cancel_all();
    act_phase.cancel_all();
    consumer.cancel();
    sense_phase.join_all().expect("sense phase join failed");
    act_phase.join_all().expect("act phase join failed");
    consumer.join().expect("consumer join failed");

    lifecycle.deregister(&watcher);

    info!(
        "Patrol done: {} scans, {} filtered, {} consumed",
        scans.load(Ordering::SeqCst),
        filtered.load(Ordering::SeqCst),
        consumed.load(Ordering::SeqCst)
    );
}

/// Drive one timing phase: wake the group at its barrier and rendezvous
fn run_phase(phase: &ThreadGroup, barrier: &Arc<RendezvousBarrier>) {
    phase.wakeup_all_at(barrier);
    match barrier.wait(Some(PHASE_TIMEOUT)) {
        Ok(true) => {}
        Ok(false) => {
            let passed = barrier.passed_threads();
            warn!("Phase {} timed out, only {:?} arrived", phase.name(), passed);
            while !barrier.no_threads_in_wait() {
                std::thread::sleep(Duration::from_millis(1));
            }
            barrier.reset();
        }
        Err(e) => warn!("Phase {} interrupted: {e}", phase.name()),
    }
}
