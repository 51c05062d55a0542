//! Monitor Integration Tests
//!
//! Drives the full scheduler → probe → recorder → observer pipeline with
//! scripted probes on a paused Tokio clock.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conntester::{
    HealthState, Monitor, MonitorConfig, MonitorError, MonitorObserver, Probe, SchedulerState,
    Statistics, StatusTransition, Thresholds,
};

// =============================================================================
// Test Helpers
// =============================================================================

type Script = fn(usize) -> (Duration, Option<f64>);

/// Probe whose delay and outcome depend on the call index.
struct ScriptedProbe {
    calls: Arc<AtomicUsize>,
    script: Script,
}

impl ScriptedProbe {
    fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                script,
            },
            calls,
        )
    }
}

#[async_trait::async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, _host: &str, _timeout: Duration) -> Option<f64> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, latency) = (self.script)(n);
        tokio::time::sleep(delay).await;
        latency
    }
}

/// Observer keeping everything it is told.
#[derive(Default)]
struct Collected {
    stats: Mutex<Vec<Statistics>>,
    transitions: Mutex<Vec<(HealthState, HealthState)>>,
}

impl Collected {
    fn stats(&self) -> Vec<Statistics> {
        self.stats.lock().unwrap().clone()
    }

    fn transitions(&self) -> Vec<(HealthState, HealthState)> {
        self.transitions.lock().unwrap().clone()
    }
}

impl MonitorObserver for Collected {
    fn on_statistics(&self, stats: &Statistics) {
        self.stats.lock().unwrap().push(*stats);
    }

    fn on_status_change(&self, transition: &StatusTransition) {
        self.transitions
            .lock()
            .unwrap()
            .push((transition.from, transition.to));
    }
}

fn config(interval_ms: u64, timeout_ms: u64, capacity: usize) -> MonitorConfig {
    MonitorConfig::new("test.local")
        .with_interval(Duration::from_millis(interval_ms))
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_capacity(NonZeroUsize::new(capacity).unwrap())
        .with_thresholds(Thresholds::new(100, 10, 50))
}

fn monitor_with(config: MonitorConfig, probe: ScriptedProbe) -> (Monitor, Arc<Collected>) {
    let collected = Arc::new(Collected::default());
    let mut monitor = Monitor::new(config, probe);
    monitor.add_observer(collected.clone()).unwrap();
    (monitor, collected)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_lifecycle_transitions() {
    let (probe, _) = ScriptedProbe::new(|_| (Duration::from_millis(5), Some(5.0)));
    let mut monitor = Monitor::new(config(100, 50, 10), probe);
    assert_eq!(monitor.state(), SchedulerState::Idle);

    monitor.start().unwrap();
    assert_eq!(monitor.state(), SchedulerState::Running);

    let err = monitor.start().unwrap_err();
    assert!(matches!(
        err,
        MonitorError::InvalidState {
            state: SchedulerState::Running,
            ..
        }
    ));

    monitor.stop().await.unwrap();
    assert_eq!(monitor.state(), SchedulerState::Stopped);

    // Idempotent.
    monitor.stop().await.unwrap();
    assert_eq!(monitor.state(), SchedulerState::Stopped);

    // Terminal.
    assert!(monitor.start().is_err());
    let extra = Arc::new(Collected::default());
    assert!(monitor.add_observer(extra).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stop_idle_monitor() {
    let (probe, calls) = ScriptedProbe::new(|_| (Duration::ZERO, Some(1.0)));
    let mut monitor = Monitor::new(config(100, 50, 10), probe);

    monitor.stop().await.unwrap();
    assert_eq!(monitor.state(), SchedulerState::Stopped);
    assert!(monitor.shutdown().await.unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_zero_interval_and_timeout() {
    for (interval_ms, timeout_ms) in [(0, 50), (100, 0)] {
        let (probe, calls) = ScriptedProbe::new(|_| (Duration::ZERO, Some(1.0)));
        let (mut monitor, collected) = monitor_with(config(interval_ms, timeout_ms, 10), probe);

        let err = monitor.start().unwrap_err();
        assert!(matches!(err, MonitorError::InvalidConfig(_)), "{err}");
        assert_eq!(monitor.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(collected.stats().is_empty());

        // Nothing was spawned, so stopping is clean.
        monitor.stop().await.unwrap();
        assert!(monitor.shutdown().await.unwrap().is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_probes_after_stop() {
    let (probe, calls) = ScriptedProbe::new(|_| (Duration::from_millis(10), Some(10.0)));
    let mut monitor = Monitor::new(config(100, 50, 10), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(450)).await;
    monitor.stop().await.unwrap();

    let at_stop = calls.load(Ordering::SeqCst);
    assert_eq!(at_stop, 5);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(calls.load(Ordering::SeqCst), at_stop);
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_wait_for_inflight_probes() {
    // Every probe hangs far beyond the timeout.
    let (probe, _) = ScriptedProbe::new(|_| (Duration::from_secs(3600), Some(1.0)));
    let (mut monitor, collected) = monitor_with(config(100, 1000, 10), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    let before = tokio::time::Instant::now();
    monitor.stop().await.unwrap();
    assert!(before.elapsed() < Duration::from_millis(100));

    // Each in-flight probe still resolves through its timeout.
    let recorder = monitor
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorder.history().len(), 3);
    assert_eq!(recorder.statistics().loss_pct, 100);
    assert_eq!(collected.stats().len(), 3);
}

// =============================================================================
// Classification Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_transition_hook_fires_once_per_change() {
    // Five answered probes, then nothing but timeouts.
    let (probe, _) = ScriptedProbe::new(|n| {
        if n < 5 {
            (Duration::from_millis(20), Some(20.0))
        } else {
            (Duration::from_secs(10), Some(20.0))
        }
    });
    let (mut monitor, collected) = monitor_with(config(100, 50, 3), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    let recorder = monitor.shutdown().await.unwrap().unwrap();

    assert_eq!(
        collected.transitions(),
        vec![
            (HealthState::Lost, HealthState::Good),
            (HealthState::Good, HealthState::Bad),
            (HealthState::Bad, HealthState::Lost),
        ]
    );
    assert_eq!(recorder.status(), HealthState::Lost);

    let stats = collected.stats();
    assert_eq!(stats.len(), 11);
    assert_eq!(stats[0].mean_latency_ms, Some(20));
    assert_eq!(stats[5].loss_pct, 33);
    assert_eq!(stats[5].last_latency_ms, Some(20));
    assert_eq!(stats.last().unwrap().loss_pct, 100);
}

#[tokio::test(start_paused = true)]
async fn test_dead_link_keeps_running_silently() {
    let (probe, calls) = ScriptedProbe::new(|_| (Duration::ZERO, None));
    let (mut monitor, collected) = monitor_with(config(10, 5, 20), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(995)).await;
    let recorder = monitor.shutdown().await.unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 100);
    assert!(collected.transitions().is_empty());
    assert!(
        collected
            .stats()
            .iter()
            .all(|s| s.loss_pct == 100 && s.mean_latency_ms.is_none())
    );
    assert_eq!(recorder.history().len(), 20);
    assert_eq!(recorder.status(), HealthState::Lost);
}

#[tokio::test(start_paused = true)]
async fn test_slow_link_is_bad() {
    let (probe, _) = ScriptedProbe::new(|_| (Duration::from_millis(150), Some(150.0)));
    let (mut monitor, collected) = monitor_with(config(100, 500, 5), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let recorder = monitor.shutdown().await.unwrap().unwrap();

    assert_eq!(
        collected.transitions(),
        vec![(HealthState::Lost, HealthState::Bad)]
    );
    assert_eq!(recorder.statistics().mean_latency_ms, Some(150));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_out_of_order_completions_keep_dispatch_order() {
    // Even probes are slow, odd probes fast: completions arrive out of order.
    let (probe, calls) = ScriptedProbe::new(|n| {
        if n % 2 == 0 {
            (Duration::from_millis(250), Some(250.0))
        } else {
            (Duration::from_millis(10), Some(10.0))
        }
    });
    let (mut monitor, _) = monitor_with(config(100, 1000, 100), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(950)).await;
    let recorder = monitor.shutdown().await.unwrap().unwrap();

    let dispatched = calls.load(Ordering::SeqCst);
    assert_eq!(dispatched, 10);
    let snapshot = recorder.history().snapshot();
    assert_eq!(snapshot.len(), dispatched);

    let latencies: Vec<_> = snapshot.iter().map(|s| s.latency_ms).collect();
    let expected: Vec<_> = (0..dispatched)
        .map(|n| Some(if n % 2 == 0 { 250.0 } else { 10.0 }))
        .collect();
    assert_eq!(latencies, expected);

    let taken: Vec<_> = snapshot.iter().map(|s| s.taken_at).collect();
    assert!(taken.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_completions_respect_capacity() {
    // Overlapping probes with scattered delays, some past the timeout.
    let (probe, calls) = ScriptedProbe::new(|n| {
        let delay = Duration::from_millis(((n * 37) % 200) as u64);
        (delay, Some((n % 90) as f64))
    });
    let (mut monitor, collected) = monitor_with(config(1, 100, 8), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let recorder = monitor.shutdown().await.unwrap().unwrap();

    let stats = collected.stats();
    assert!(calls.load(Ordering::SeqCst) > 1000);
    assert_eq!(stats.len(), calls.load(Ordering::SeqCst));
    assert!(stats.iter().all(|s| s.samples <= 8 && s.loss_pct <= 100));
    assert_eq!(recorder.history().len(), 8);

    let taken: Vec<_> = recorder
        .history()
        .snapshot()
        .iter()
        .map(|s| s.taken_at)
        .collect();
    assert!(taken.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_capacity_one_reflects_latest_sample() {
    let (probe, _) = ScriptedProbe::new(|n| {
        let latency = if n % 2 == 0 { Some(30.0) } else { None };
        (Duration::from_millis(1), latency)
    });
    let (mut monitor, collected) = monitor_with(config(100, 50, 1), probe);

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    monitor.shutdown().await.unwrap();

    let stats = collected.stats();
    assert_eq!(stats.len(), 4);
    for (n, s) in stats.iter().enumerate() {
        assert_eq!(s.samples, 1);
        if n % 2 == 0 {
            assert_eq!((s.mean_latency_ms, s.loss_pct), (Some(30), 0));
        } else {
            assert_eq!((s.mean_latency_ms, s.loss_pct), (None, 100));
        }
    }
    assert_eq!(
        collected.transitions(),
        vec![
            (HealthState::Lost, HealthState::Good),
            (HealthState::Good, HealthState::Lost),
            (HealthState::Lost, HealthState::Good),
            (HealthState::Good, HealthState::Lost),
        ]
    );
}
