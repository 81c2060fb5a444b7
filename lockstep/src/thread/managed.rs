// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::listener::{LoopListener, NotificationListener};
use super::registry;
use crate::barrier::RendezvousBarrier;
use crate::error::Error;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Flag bit marking a thread as bad after a failed init or step
pub const FLAG_BAD: u32 = 0x8000_0000;

/// Thread operating mode.
///
/// A free-running thread calls its step again immediately after the previous
/// one finished. A wait-for-wakeup thread pauses after each step and sleeps
/// until an explicit [wakeup](ThreadHandle::wakeup).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    FreeRunning,
    WaitForWakeup,
}

/// User logic executed by a [ManagedThread].
///
/// The canonical sequence is `init → once → step* → finalize`, with the
/// two-phase shutdown asking [prepare_finalize](Runnable::prepare_finalize)
/// before [finalize](Runnable::finalize) may run.
pub trait Runnable: Send {
    /// Called once on the new native thread before the loop is entered.
    ///
    /// An error is reported to the thread's notification listeners and flags
    /// the thread bad; the native thread then exits without panicking.
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Called once after a successful init, before the first step
    fn once(&mut self) {}

    /// One loop iteration.
    ///
    /// An error is logged and flags the thread bad; the loop continues unless
    /// cancellation was requested.
    fn step(&mut self) -> Result<(), Error>;

    /// Asked whether it is safe to finalize now; may refuse to finish an
    /// in-flight operation first. Serialized against [step](Runnable::step).
    fn prepare_finalize(&mut self) -> bool {
        true
    }

    /// Teardown, run only after an accepted prepare
    fn finalize(&mut self) {}
}

/// Wakeup bookkeeping, guarded by the thread's sleep lock
struct SleepState {
    op_mode: OpMode,
    pending_wakeups: usize,
    coalesce_wakeups: bool,
    waiting: bool,
    /// Barrier to rendezvous at after the next step (phase lock)
    barrier: Option<Arc<RendezvousBarrier>>,
}

struct Listeners {
    notification: Vec<Arc<dyn NotificationListener>>,
    looping: Vec<Arc<dyn LoopListener>>,
}

/// State shared between the owner handle, the native thread and any
/// [ThreadHandle] clones held by the registry or wake adapters.
struct ThreadInner {
    name: String,
    sleep: Mutex<SleepState>,
    sleep_cond: Condvar,
    runner: Mutex<Box<dyn Runnable>>,
    listeners: Mutex<Listeners>,
    started: AtomicBool,
    cancelled: AtomicBool,
    detached: AtomicBool,
    finalize_prepared: AtomicBool,
    flags: AtomicU32,
}

/// Lightweight shared handle to a managed thread.
///
/// Cloneable reference used by the thread registry, barrier bookkeeping,
/// listeners and wake adapters. The thread identity itself stays
/// non-duplicable: only [ManagedThread] can start, join or finalize.
#[derive(Clone)]
pub struct ThreadHandle {
    inner: Arc<ThreadInner>,
}

impl ThreadHandle {
    /// Diagnostic name of the thread
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current operating mode
    pub fn op_mode(&self) -> OpMode {
        self.inner.sleep.lock().unwrap().op_mode
    }

    /// Whether the thread has been started and not yet joined
    pub fn started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Whether cancellation has been requested
    pub fn cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the thread is currently blocked awaiting a wakeup
    pub fn waiting(&self) -> bool {
        self.inner.sleep.lock().unwrap().waiting
    }

    /// Wake a wait-for-wakeup thread for one more loop iteration.
    ///
    /// Wakeups issued while the thread is not sleeping are recorded in the
    /// pending-wakeup count, coalesced to at most one unless
    /// [set_coalesce_wakeups](ManagedThread::set_coalesce_wakeups) disabled
    /// coalescing. A no-op for free-running threads.
    pub fn wakeup(&self) {
        let mut sleep = self.inner.sleep.lock().unwrap();
        if sleep.op_mode != OpMode::WaitForWakeup {
            return;
        }
        if sleep.coalesce_wakeups {
            sleep.pending_wakeups = 1;
        } else {
            sleep.pending_wakeups += 1;
        }
        self.inner.sleep_cond.notify_one();
    }

    /// Wake the thread and have it rendezvous at `barrier` right after its
    /// next loop iteration completes.
    ///
    /// All threads of one timing phase share the phase's barrier, which
    /// phase-locks their execution against the scheduler.
    pub fn wakeup_at(&self, barrier: Arc<RendezvousBarrier>) {
        let mut sleep = self.inner.sleep.lock().unwrap();
        if sleep.op_mode != OpMode::WaitForWakeup {
            warn!(
                "Ignoring barrier wakeup for free-running thread {}",
                self.inner.name
            );
            return;
        }
        sleep.barrier = Some(barrier);
        if sleep.coalesce_wakeups {
            sleep.pending_wakeups = 1;
        } else {
            sleep.pending_wakeups += 1;
        }
        self.inner.sleep_cond.notify_one();
    }

    /// Request cooperative cancellation.
    ///
    /// Takes effect at the loop's defined test points only, never while the
    /// thread holds a lock. Wakes the thread if it is sleeping.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let _sleep = self.inner.sleep.lock().unwrap();
        self.inner.sleep_cond.notify_all();
    }

    /// User flag bitmask
    pub fn flags(&self) -> u32 {
        self.inner.flags.load(Ordering::SeqCst)
    }

    /// Set the given flag bits
    pub fn set_flag(&self, flag: u32) {
        self.inner.flags.fetch_or(flag, Ordering::SeqCst);
    }

    /// Clear the given flag bits
    pub fn unset_flag(&self, flag: u32) {
        self.inner.flags.fetch_and(!flag, Ordering::SeqCst);
    }

    /// Whether the thread has been flagged bad (failed init or step)
    pub fn flagged_bad(&self) -> bool {
        self.flags() & FLAG_BAD != 0
    }

    /// Inform all notification listeners of a failed init and flag the thread
    /// bad. Called by the thread's own init path; never panics.
    pub fn notify_of_failed_init(&self) {
        self.set_flag(FLAG_BAD);
        let listeners = self.inner.listeners.lock().unwrap();
        for listener in &listeners.notification {
            listener.thread_init_failed(self);
        }
    }

    fn notify_of_startup(&self) {
        let listeners = self.inner.listeners.lock().unwrap();
        for listener in &listeners.notification {
            listener.thread_started(self);
        }
    }
}

impl PartialEq for ThreadHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Outcome of the startup handshake sent from the new native thread
enum StartupOutcome {
    Running,
    InitFailed,
}

/// A unit of schedulable work on a native OS thread.
///
/// Exactly one native thread maps to one `ManagedThread` for its entire
/// started lifetime. The type is deliberately not `Clone`: a thread's
/// identity cannot be duplicated.
pub struct ManagedThread {
    handle: ThreadHandle,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl ManagedThread {
    /// Create a managed thread running `runner` in the given mode.
    ///
    /// The native thread is not spawned until [start](ManagedThread::start).
    pub fn new(name: impl Into<String>, op_mode: OpMode, runner: Box<dyn Runnable>) -> Self {
        let inner = ThreadInner {
            name: name.into(),
            sleep: Mutex::new(SleepState {
                op_mode,
                pending_wakeups: 0,
                coalesce_wakeups: true,
                waiting: false,
                barrier: None,
            }),
            sleep_cond: Condvar::new(),
            runner: Mutex::new(runner),
            listeners: Mutex::new(Listeners {
                notification: Vec::new(),
                looping: Vec::new(),
            }),
            started: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            finalize_prepared: AtomicBool::new(false),
            flags: AtomicU32::new(0),
        };
        ManagedThread {
            handle: ThreadHandle {
                inner: Arc::new(inner),
            },
            join_handle: None,
        }
    }

    /// Shared handle to this thread
    pub fn handle(&self) -> ThreadHandle {
        self.handle.clone()
    }

    /// Diagnostic name of the thread
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Change the operating mode; only allowed before the thread was started
    pub fn set_op_mode(&self, op_mode: OpMode) -> Result<(), Error> {
        if self.handle.started() {
            return Err(Error::Thread("cannot change op mode of a started thread"));
        }
        self.handle.inner.sleep.lock().unwrap().op_mode = op_mode;
        Ok(())
    }

    /// Control wakeup coalescing (enabled by default).
    ///
    /// With coalescing, any number of wakeups issued before the thread goes
    /// back to sleep results in at most one further loop iteration; without,
    /// every wakeup is counted and consumed individually.
    pub fn set_coalesce_wakeups(&self, coalesce: bool) {
        self.handle.inner.sleep.lock().unwrap().coalesce_wakeups = coalesce;
    }

    /// Start the thread.
    ///
    /// Spawns the native thread running `init → (sleep | step)* → exit`. With
    /// `wait`, blocks the caller until the new thread has entered its loop or
    /// reported an init failure (reported to notification listeners and via
    /// [flagged_bad](ThreadHandle::flagged_bad), not as an error here).
    /// Starting an already-started thread stops it first and restarts it.
    ///
    /// # Errors
    ///
    /// Fails if the thread was detached or the native thread cannot be spawned.
    pub fn start(&mut self, wait: bool) -> Result<(), Error> {
        if self.handle.inner.detached.load(Ordering::SeqCst) {
            return Err(Error::Thread("cannot start a detached thread"));
        }
        if self.join_handle.is_some() {
            // idempotent restart: stop the running thread first
            debug!("Restarting thread {}", self.name());
            self.handle.cancel();
            self.join()?;
        }

        self.handle.inner.cancelled.store(false, Ordering::SeqCst);
        self.handle
            .inner
            .finalize_prepared
            .store(false, Ordering::SeqCst);
        {
            let mut sleep = self.handle.inner.sleep.lock().unwrap();
            sleep.pending_wakeups = 0;
            sleep.barrier = None;
            sleep.waiting = false;
        }

        let (startup_sender, startup_receiver) = mpsc::channel();
        let handle = self.handle.clone();
        let join_handle = thread::Builder::new()
            .name(self.name().to_string())
            .spawn(move || entry(handle, startup_sender))
            .map_err(|_| Error::Thread("could not spawn native thread"))?;
        self.join_handle = Some(join_handle);
        self.handle.inner.started.store(true, Ordering::SeqCst);

        if wait {
            // handshake: the new thread reports once it entered its loop
            match startup_receiver.recv() {
                Ok(StartupOutcome::Running) => {}
                Ok(StartupOutcome::InitFailed) => {
                    debug!("Thread {} failed its init sequence", self.name());
                }
                Err(_) => return Err(Error::Thread("thread exited before startup handshake")),
            }
        }
        Ok(())
    }

    /// Block until the native thread has fully exited and reclaim it.
    pub fn join(&mut self) -> Result<(), Error> {
        let join_handle = self
            .join_handle
            .take()
            .ok_or(Error::Thread("thread not started or already joined"))?;
        join_handle
            .join()
            .map_err(|_| Error::Thread("thread panicked"))?;
        self.handle.inner.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Hand the native thread off to the runtime for cleanup.
    ///
    /// A detached thread can neither be joined nor restarted.
    pub fn detach(&mut self) {
        self.handle.inner.detached.store(true, Ordering::SeqCst);
        self.join_handle.take();
    }

    /// Request cooperative cancellation, see [ThreadHandle::cancel]
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Wake the thread, see [ThreadHandle::wakeup]
    pub fn wakeup(&self) {
        self.handle.wakeup();
    }

    /// Wake the thread with a phase barrier, see [ThreadHandle::wakeup_at]
    pub fn wakeup_at(&self, barrier: Arc<RendezvousBarrier>) {
        self.handle.wakeup_at(barrier);
    }

    /// Ask the thread's user logic whether it is safe to stop now.
    ///
    /// Serialized against a step in flight through the runner lock. Returns
    /// the runner's verdict and records an accepted prepare.
    pub fn prepare_finalize(&self) -> bool {
        let accepted = self.handle.inner.runner.lock().unwrap().prepare_finalize();
        self.handle
            .inner
            .finalize_prepared
            .store(accepted, Ordering::SeqCst);
        accepted
    }

    /// Abort a pending finalize request
    pub fn cancel_finalize(&self) {
        self.handle
            .inner
            .finalize_prepared
            .store(false, Ordering::SeqCst);
    }

    /// Run the runner's teardown.
    ///
    /// # Errors
    ///
    /// Fails unless a preceding [prepare_finalize](ManagedThread::prepare_finalize)
    /// was accepted.
    pub fn finalize(&self) -> Result<(), Error> {
        if !self.handle.inner.finalize_prepared.load(Ordering::SeqCst) {
            return Err(Error::Thread("finalize without accepted prepare"));
        }
        self.handle.inner.runner.lock().unwrap().finalize();
        self.handle
            .inner
            .finalize_prepared
            .store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Register a notification listener; idempotent per listener identity
    pub fn add_notification_listener(&self, listener: Arc<dyn NotificationListener>) {
        let mut listeners = self.handle.inner.listeners.lock().unwrap();
        if !listeners
            .notification
            .iter()
            .any(|l| Arc::ptr_eq(l, &listener))
        {
            listeners.notification.push(listener);
        }
    }

    /// Remove a previously registered notification listener
    pub fn remove_notification_listener(&self, listener: &Arc<dyn NotificationListener>) {
        let mut listeners = self.handle.inner.listeners.lock().unwrap();
        listeners.notification.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Register a loop listener; idempotent per listener identity
    pub fn add_loop_listener(&self, listener: Arc<dyn LoopListener>) {
        let mut listeners = self.handle.inner.listeners.lock().unwrap();
        if !listeners.looping.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.looping.push(listener);
        }
    }

    /// Remove a previously registered loop listener
    pub fn remove_loop_listener(&self, listener: &Arc<dyn LoopListener>) {
        let mut listeners = self.handle.inner.listeners.lock().unwrap();
        listeners.looping.retain(|l| !Arc::ptr_eq(l, listener));
    }
}

/// Native thread main function
fn entry(handle: ThreadHandle, startup_sender: mpsc::Sender<StartupOutcome>) {
    registry::register(handle.clone());

    let init_result = handle.inner.runner.lock().unwrap().init();
    match init_result {
        Ok(()) => {
            handle.notify_of_startup();
            // the starter may not be waiting for the handshake
            let _ = startup_sender.send(StartupOutcome::Running);
        }
        Err(e) => {
            error!("Init of thread {} failed: {}", handle.name(), e);
            handle.notify_of_failed_init();
            let _ = startup_sender.send(StartupOutcome::InitFailed);
            registry::deregister();
            return;
        }
    }

    handle.inner.runner.lock().unwrap().once();

    loop {
        wait_for_wakeup(&handle.inner);
        // cancellation test point
        if handle.cancelled() {
            break;
        }

        {
            let listeners = handle.inner.listeners.lock().unwrap();
            for listener in &listeners.looping {
                listener.pre_loop(&handle);
            }
        }

        if let Err(e) = handle.inner.runner.lock().unwrap().step() {
            error!("Step of thread {} failed: {}", handle.name(), e);
            handle.set_flag(FLAG_BAD);
        }

        {
            let listeners = handle.inner.listeners.lock().unwrap();
            for listener in &listeners.looping {
                listener.post_loop(&handle);
            }
        }

        // phase lock: rendezvous if a barrier was supplied with the wakeup
        let barrier = handle.inner.sleep.lock().unwrap().barrier.take();
        if let Some(barrier) = barrier {
            if let Err(e) = barrier.wait(None) {
                warn!("Thread {} interrupted at phase barrier: {}", handle.name(), e);
            }
        }

        // cancellation test point
        if handle.cancelled() {
            break;
        }
    }

    registry::deregister();
}

/// Sleep until a wakeup is pending; consumes one pending wakeup.
/// Returns immediately for free-running threads or on cancellation.
fn wait_for_wakeup(inner: &ThreadInner) {
    let mut sleep = inner.sleep.lock().unwrap();
    if sleep.op_mode != OpMode::WaitForWakeup {
        return;
    }
    sleep.waiting = true;
    while sleep.pending_wakeups == 0 && !inner.cancelled.load(Ordering::SeqCst) {
        sleep = inner.sleep_cond.wait(sleep).unwrap();
    }
    sleep.pending_wakeups = sleep.pending_wakeups.saturating_sub(1);
    sleep.waiting = false;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::thread::registry;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Runner that counts steps and reports each step start over a channel
    struct CountingRunner {
        steps: Arc<AtomicUsize>,
        step_started: Option<mpsc::Sender<()>>,
        step_duration: Duration,
        init_error: Option<&'static str>,
        accept_finalize: bool,
        finalized: Arc<AtomicBool>,
    }

    impl CountingRunner {
        fn new(steps: Arc<AtomicUsize>) -> Self {
            CountingRunner {
                steps,
                step_started: None,
                step_duration: Duration::ZERO,
                init_error: None,
                accept_finalize: true,
                finalized: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Runnable for CountingRunner {
        fn init(&mut self) -> Result<(), Error> {
            match self.init_error {
                Some(description) => Err(Error::Init(description.into())),
                None => Ok(()),
            }
        }

        fn step(&mut self) -> Result<(), Error> {
            self.steps.fetch_add(1, Ordering::SeqCst);
            if let Some(sender) = &self.step_started {
                let _ = sender.send(());
            }
            if !self.step_duration.is_zero() {
                thread::sleep(self.step_duration);
            }
            Ok(())
        }

        fn prepare_finalize(&mut self) -> bool {
            self.accept_finalize
        }

        fn finalize(&mut self) {
            self.finalized.store(true, Ordering::SeqCst);
        }
    }

    struct RecordingListener {
        started: AtomicBool,
        init_failed: AtomicBool,
    }

    impl NotificationListener for RecordingListener {
        fn thread_started(&self, _thread: &ThreadHandle) {
            self.started.store(true, Ordering::SeqCst);
        }

        fn thread_init_failed(&self, _thread: &ThreadHandle) {
            self.init_failed.store(true, Ordering::SeqCst);
        }
    }

    fn wakeup_thread(runner: CountingRunner) -> ManagedThread {
        ManagedThread::new("wakeup-test", OpMode::WaitForWakeup, Box::new(runner))
    }

    #[test]
    fn free_running_thread_steps_until_cancelled() {
        let steps = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner::new(steps.clone());
        let mut thread = ManagedThread::new("free-runner", OpMode::FreeRunning, Box::new(runner));
        thread.start(true).unwrap();
        thread::sleep(Duration::from_millis(50));
        thread.cancel();
        thread.join().unwrap();
        assert!(steps.load(Ordering::SeqCst) > 0);
        assert!(!thread.handle().started());
    }

    #[test]
    fn wakeups_are_coalesced_by_default() {
        let steps = Arc::new(AtomicUsize::new(0));
        let (step_sender, step_receiver) = mpsc::channel();
        let mut runner = CountingRunner::new(steps.clone());
        runner.step_started = Some(step_sender);
        runner.step_duration = Duration::from_millis(100);
        let mut thread = wakeup_thread(runner);
        thread.start(true).unwrap();

        thread.wakeup();
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("first step did not start");
        // both issued while the thread is busy inside its step
        thread.wakeup();
        thread.wakeup();

        // one coalesced wakeup pending: exactly one more step
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("second step did not start");
        assert!(step_receiver
            .recv_timeout(Duration::from_millis(300))
            .is_err());
        assert_eq!(steps.load(Ordering::SeqCst), 2);

        thread.cancel();
        thread.join().unwrap();
    }

    #[test]
    fn uncoalesced_wakeups_are_counted() {
        let steps = Arc::new(AtomicUsize::new(0));
        let (step_sender, step_receiver) = mpsc::channel();
        let mut runner = CountingRunner::new(steps.clone());
        runner.step_started = Some(step_sender);
        runner.step_duration = Duration::from_millis(100);
        let mut thread = wakeup_thread(runner);
        thread.set_coalesce_wakeups(false);
        thread.start(true).unwrap();

        thread.wakeup();
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("first step did not start");
        thread.wakeup();
        thread.wakeup();

        // two pending wakeups: two more steps
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("second step did not start");
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("third step did not start");
        assert!(step_receiver
            .recv_timeout(Duration::from_millis(300))
            .is_err());
        assert_eq!(steps.load(Ordering::SeqCst), 3);

        thread.cancel();
        thread.join().unwrap();
    }

    #[test]
    fn failed_init_notifies_listeners_and_flags_bad() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut runner = CountingRunner::new(steps.clone());
        runner.init_error = Some("sensor not connected");
        let mut thread = ManagedThread::new("bad-init", OpMode::FreeRunning, Box::new(runner));
        let listener = Arc::new(RecordingListener {
            started: AtomicBool::new(false),
            init_failed: AtomicBool::new(false),
        });
        thread.add_notification_listener(listener.clone());

        thread.start(true).unwrap();
        thread.join().unwrap();

        assert!(thread.handle().flagged_bad());
        assert!(listener.init_failed.load(Ordering::SeqCst));
        assert!(!listener.started.load(Ordering::SeqCst));
        assert_eq!(steps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn successful_startup_notifies_listeners() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut thread = wakeup_thread(CountingRunner::new(steps));
        let listener = Arc::new(RecordingListener {
            started: AtomicBool::new(false),
            init_failed: AtomicBool::new(false),
        });
        thread.add_notification_listener(listener.clone());

        thread.start(true).unwrap();
        assert!(listener.started.load(Ordering::SeqCst));

        thread.cancel();
        thread.join().unwrap();
    }

    #[test]
    fn finalize_requires_accepted_prepare() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut runner = CountingRunner::new(steps);
        runner.accept_finalize = false;
        let finalized = runner.finalized.clone();
        let mut thread = wakeup_thread(runner);
        thread.start(true).unwrap();

        assert!(!thread.prepare_finalize());
        assert!(thread.finalize().is_err());
        thread.cancel_finalize();
        assert!(!finalized.load(Ordering::SeqCst));

        thread.cancel();
        thread.join().unwrap();
    }

    #[test]
    fn two_phase_shutdown_runs_teardown() {
        let steps = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner::new(steps);
        let finalized = runner.finalized.clone();
        let mut thread = wakeup_thread(runner);
        thread.start(true).unwrap();

        assert!(thread.prepare_finalize());
        thread.finalize().unwrap();
        assert!(finalized.load(Ordering::SeqCst));

        thread.cancel();
        thread.join().unwrap();
    }

    #[test]
    fn restart_is_idempotent() {
        let steps = Arc::new(AtomicUsize::new(0));
        let (step_sender, step_receiver) = mpsc::channel();
        let mut runner = CountingRunner::new(steps.clone());
        runner.step_started = Some(step_sender);
        let mut thread = wakeup_thread(runner);
        thread.start(true).unwrap();
        thread.wakeup();
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("step did not run before restart");
        // second start stops the running thread and spawns a fresh one
        thread.start(true).unwrap();
        thread.wakeup();
        step_receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("step did not run after restart");
        thread.cancel();
        thread.join().unwrap();
        assert_eq!(steps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn detached_thread_cannot_be_restarted() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut thread = wakeup_thread(CountingRunner::new(steps));
        thread.start(true).unwrap();
        thread.cancel();
        thread.detach();
        assert!(thread.start(true).is_err());
        assert!(thread.join().is_err());
    }

    #[test]
    fn registry_resolves_current_thread() {
        struct NameProbe {
            seen: Arc<Mutex<Option<String>>>,
        }
        impl Runnable for NameProbe {
            fn step(&mut self) -> Result<(), Error> {
                let name = registry::current_thread().map(|h| h.name().to_string());
                *self.seen.lock().unwrap() = name;
                Ok(())
            }
        }

        let seen = Arc::new(Mutex::new(None));
        let runner = NameProbe { seen: seen.clone() };
        let mut thread = ManagedThread::new("probe", OpMode::WaitForWakeup, Box::new(runner));
        thread.start(true).unwrap();
        thread.wakeup();
        thread::sleep(Duration::from_millis(50));
        thread.cancel();
        thread.join().unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("probe"));
        assert!(registry::current_thread().is_none());
    }

    #[test]
    fn phase_barrier_joined_after_step() {
        let steps = Arc::new(AtomicUsize::new(0));
        let mut thread = wakeup_thread(CountingRunner::new(steps.clone()));
        thread.start(true).unwrap();

        let barrier = Arc::new(RendezvousBarrier::new(2));
        thread.wakeup_at(barrier.clone());
        assert!(barrier.wait(Some(Duration::from_secs(1))).unwrap());
        assert_eq!(steps.load(Ordering::SeqCst), 1);
        assert!(barrier
            .passed_threads()
            .contains(&"wakeup-test".to_string()));

        thread.cancel();
        thread.join().unwrap();
    }
}
