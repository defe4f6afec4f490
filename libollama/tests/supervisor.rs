// libollama/tests/supervisor.rs
//
// Integration tests for the inference service supervisor and shutdown guard.
//
// Tests cover:
// - Already running service: nothing spawned
// - Spawned service answering after a few polls
// - Service that never answers: bounded polling, then failure
// - No duplicate spawn across repeated ensure_ready calls
// - Teardown runs once and never touches a service it did not start
// - A shutdown during startup polling cuts the polling short

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use libollama::{
    LivenessProbe, ProcessLauncher, ServiceError, ServiceProcess, ServiceState, ShutdownGuard,
    Sleeper, Supervisor, ThreadSleeper,
};

#[derive(Debug, Default)]
struct Counters {
    probes: AtomicUsize,
    launches: AtomicUsize,
    kills: AtomicUsize,
    sleeps: AtomicUsize,
}

/// Probe answering from a script; once the script runs out it repeats the
/// last answer.
struct ScriptedProbe {
    script: VecDeque<bool>,
    last: bool,
    counters: Arc<Counters>,
}

impl LivenessProbe for ScriptedProbe {
    fn probe(&mut self) -> Result<(), ServiceError> {
        self.counters.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        if self.last {
            Ok(())
        } else {
            Err(ServiceError::Http("connection refused".into()))
        }
    }
}

struct FakeProcess {
    counters: Arc<Counters>,
}

impl ServiceProcess for FakeProcess {
    fn id(&self) -> u32 {
        4242
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(false)
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.counters.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeLauncher {
    counters: Arc<Counters>,
    fail: bool,
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&mut self) -> io::Result<Box<dyn ServiceProcess>> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "ollama: not found"));
        }
        Ok(Box::new(FakeProcess {
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct CountingSleeper {
    counters: Arc<Counters>,
}

impl Sleeper for CountingSleeper {
    fn sleep(&mut self, duration: Duration) {
        assert_eq!(duration, Duration::from_secs(1));
        self.counters.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

fn supervisor(script: &[bool], launch_fails: bool) -> (Supervisor, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let supervisor = Supervisor::new(
        Box::new(ScriptedProbe {
            script: script.iter().copied().collect(),
            last: false,
            counters: Arc::clone(&counters),
        }),
        Box::new(FakeLauncher {
            counters: Arc::clone(&counters),
            fail: launch_fails,
        }),
        Box::new(CountingSleeper {
            counters: Arc::clone(&counters),
        }),
        Duration::from_secs(1),
        10,
    );
    (supervisor, counters)
}

fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[test]
fn test_already_running_spawns_nothing() {
    let (mut sup, counters) = supervisor(&[true], false);
    sup.ensure_ready().unwrap();

    assert_eq!(sup.state(), ServiceState::Ready);
    assert_eq!(count(&counters.probes), 1);
    assert_eq!(count(&counters.launches), 0);
    assert!(!sup.owns_process());

    // teardown must not touch a service we did not start
    assert!(!sup.shutdown().unwrap());
    drop(sup);
    assert_eq!(count(&counters.kills), 0);
}

#[test]
fn test_ready_after_three_polls() {
    // initial probe fails, then two failed polls, third poll answers
    let (mut sup, counters) = supervisor(&[false, false, false, true], false);
    sup.ensure_ready().unwrap();

    assert_eq!(sup.state(), ServiceState::Ready);
    assert_eq!(count(&counters.launches), 1);
    assert_eq!(count(&counters.probes), 4);
    assert_eq!(count(&counters.sleeps), 3);
    assert!(sup.owns_process());
}

#[test]
fn test_never_ready_gives_up() {
    let (mut sup, counters) = supervisor(&[false], false);
    let err = sup.ensure_ready().unwrap_err();

    assert!(matches!(err, ServiceError::Unavailable { attempts: 10 }));
    assert_eq!(sup.state(), ServiceState::Failed);
    assert_eq!(count(&counters.launches), 1);
    assert_eq!(count(&counters.probes), 11);
    assert_eq!(count(&counters.sleeps), 10);

    // nothing keeps polling in the background
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(count(&counters.probes), 11);
}

#[test]
fn test_no_duplicate_spawn() {
    let (mut sup, counters) = supervisor(&[false], false);
    assert!(sup.ensure_ready().is_err());
    assert!(sup.ensure_ready().is_err());
    assert_eq!(count(&counters.launches), 1);

    let (mut sup, counters) = supervisor(&[false, true], false);
    sup.ensure_ready().unwrap();
    sup.ensure_ready().unwrap();
    assert_eq!(count(&counters.launches), 1);
    assert_eq!(count(&counters.probes), 2);
}

#[test]
fn test_spawn_failure() {
    let (mut sup, counters) = supervisor(&[false], true);
    let err = sup.ensure_ready().unwrap_err();
    assert!(matches!(err, ServiceError::Spawn(_)));
    assert_eq!(sup.state(), ServiceState::Failed);
    assert_eq!(count(&counters.sleeps), 0);
}

#[test]
fn test_teardown_runs_once() {
    let (mut sup, counters) = supervisor(&[false, true], false);
    sup.ensure_ready().unwrap();

    let guard = ShutdownGuard::new(Arc::new(Mutex::new(sup)));
    assert!(guard.trigger("SIGTERM"));
    assert!(!guard.trigger("quit"));
    assert!(guard.has_fired());
    assert_eq!(count(&counters.kills), 1);

    // dropping the last handle does not kill again
    drop(guard);
    assert_eq!(count(&counters.kills), 1);
}

#[test]
fn test_guard_clones_share_state() {
    let (mut sup, counters) = supervisor(&[false, true], false);
    sup.ensure_ready().unwrap();

    let guard = ShutdownGuard::new(Arc::new(Mutex::new(sup)));
    let from_signal = guard.clone();
    let handle = std::thread::spawn(move || from_signal.trigger("SIGINT"));
    let fired_here = guard.trigger("quit");
    let fired_there = handle.join().unwrap();

    assert!(fired_here ^ fired_there);
    assert_eq!(count(&counters.kills), 1);
}

#[test]
fn test_drop_tears_down_owned_process() {
    let (mut sup, counters) = supervisor(&[false, true], false);
    sup.ensure_ready().unwrap();
    drop(sup);
    assert_eq!(count(&counters.kills), 1);
}

#[test]
fn test_shutdown_during_startup_stops_polling() {
    let counters = Arc::new(Counters::default());
    let supervisor = Supervisor::new(
        Box::new(ScriptedProbe {
            script: VecDeque::new(),
            last: false,
            counters: Arc::clone(&counters),
        }),
        Box::new(FakeLauncher {
            counters: Arc::clone(&counters),
            fail: false,
        }),
        Box::new(ThreadSleeper),
        Duration::from_millis(100),
        10,
    );
    let shared = Arc::new(Mutex::new(supervisor));
    let guard = ShutdownGuard::new(Arc::clone(&shared));

    // startup holds the lock for the whole polling window, like the binary does
    let startup = {
        let shared = Arc::clone(&shared);
        std::thread::spawn(move || shared.lock().unwrap().ensure_ready())
    };
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    assert!(guard.trigger("SIGINT"));
    let waited = started.elapsed();
    assert!(waited < Duration::from_millis(500), "teardown waited {waited:?}");

    let result = startup.join().unwrap();
    assert!(matches!(result, Err(ServiceError::Aborted)));
    assert_eq!(count(&counters.launches), 1);
    assert_eq!(count(&counters.kills), 1);
    assert!(count(&counters.probes) < 4);

    let mut sup = shared.lock().unwrap();
    assert_eq!(sup.state(), ServiceState::Failed);
    assert!(!sup.owns_process());
    assert!(matches!(sup.ensure_ready(), Err(ServiceError::Aborted)));
    drop(sup);
    assert_eq!(count(&counters.launches), 1);
}

#[test]
fn test_shutdown_before_startup_spawns_nothing() {
    let (sup, counters) = supervisor(&[false], false);
    let shared = Arc::new(Mutex::new(sup));
    let guard = ShutdownGuard::new(Arc::clone(&shared));
    assert!(guard.trigger("SIGTERM"));

    let err = shared.lock().unwrap().ensure_ready().unwrap_err();
    assert!(matches!(err, ServiceError::Aborted));
    assert_eq!(count(&counters.probes), 1);
    assert_eq!(count(&counters.launches), 0);
    assert_eq!(count(&counters.sleeps), 0);
}
