//! Integration tests for [`HostDispatcher`].
//!
//! Host names drive the scripted worker: `slow-*` sleeps past any test
//! timeout, `fail-*` returns an error, `panic-*` panics, `intr-*`
//! reports an interruption; anything else sleeps briefly and succeeds.

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{shared, Active, Concurrency, Hooks};
use yardstick_dispatch::{
    DispatchConfig, HostDispatcher, HostWorker, WorkError, WorkResult, Worker,
};

struct ScriptedHostWorker {
    delay: Duration,
    timeout: Option<Duration>,
    tracker: Arc<Concurrency>,
    cancelled: Arc<AtomicUsize>,
    hooks: Arc<Hooks>,
    indices: Mutex<BTreeSet<usize>>,
}

impl ScriptedHostWorker {
    fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            timeout: None,
            tracker: shared(),
            cancelled: shared(),
            hooks: shared(),
            indices: Mutex::new(BTreeSet::new()),
        }
    }
}

impl Worker for ScriptedHostWorker {
    fn name(&self) -> &str {
        "ScriptedHostWorker"
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn before_work(&self) {
        self.hooks.before.fetch_add(1, Ordering::SeqCst);
    }

    fn after_work(&self) {
        self.hooks.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HostWorker for ScriptedHostWorker {
    async fn do_work(&self, host: &str, index: usize) -> Result<WorkResult, WorkError> {
        self.indices.lock().unwrap().insert(index);
        let active = Active::new(&self.tracker, host, &self.cancelled);

        if host.starts_with("slow-") {
            tokio::time::sleep(Duration::from_secs(10)).await;
        } else if host.starts_with("fail-") {
            active.finish();
            return Err(WorkError::Failed(format!("{host} is down")));
        } else if host.starts_with("panic-") {
            active.finish();
            panic!("worker blew up on {host}");
        } else if host.starts_with("intr-") {
            active.finish();
            return Err(WorkError::Interrupted);
        } else {
            tokio::time::sleep(self.delay).await;
        }

        active.finish();
        Ok(WorkResult::check(false))
    }
}

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn dispatcher(pool: usize, timeout_ms: u64) -> HostDispatcher {
    HostDispatcher::new(
        DispatchConfig::for_hosts()
            .with_pool_size(pool)
            .with_timeout(Duration::from_millis(timeout_ms)),
    )
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_entry_yields_a_result_including_duplicates() {
    let worker = Arc::new(ScriptedHostWorker::new(10));
    let list = hosts(&["a", "b", "a", "c", "d"]);

    let results = dispatcher(4, 1_000)
        .work_on_hosts(Arc::clone(&worker), &list)
        .await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| *r == WorkResult::check(false)));
    assert_eq!(
        *worker.indices.lock().unwrap(),
        (0..5).collect::<BTreeSet<_>>()
    );
    assert_eq!(worker.hooks.counts(), (1, 1));
}

#[tokio::test]
async fn empty_host_list_still_runs_hooks() {
    let worker = Arc::new(ScriptedHostWorker::new(10));
    let results = dispatcher(2, 100).work_on_hosts(Arc::clone(&worker), &[]).await;
    assert!(results.is_empty());
    assert_eq!(worker.hooks.counts(), (1, 1));
}

#[tokio::test]
async fn accepts_trait_objects() {
    let worker: Arc<dyn HostWorker> = Arc::new(ScriptedHostWorker::new(1));
    let results = dispatcher(2, 1_000)
        .work_on_hosts(worker, &hosts(&["a", "b"]))
        .await;
    assert_eq!(results.len(), 2);
}

// ---------------------------------------------------------------------------
// Parallelism bound
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_pool_size() {
    let worker = Arc::new(ScriptedHostWorker::new(30));
    let list: Vec<String> = (0..8).map(|i| format!("h{i}")).collect();

    let start = Instant::now();
    let results = dispatcher(2, 5_000)
        .work_on_hosts(Arc::clone(&worker), &list)
        .await;

    assert_eq!(results.len(), 8);
    assert!(worker.tracker.max_active() <= 2);
    // Four rounds of two at 30ms each.
    assert!(start.elapsed() >= Duration::from_millis(120));
}

// ---------------------------------------------------------------------------
// Timeouts and failures
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_host_is_omitted_while_siblings_report() {
    let worker = Arc::new(ScriptedHostWorker::new(10));
    let list = hosts(&["slow-1", "a", "b"]);

    let start = Instant::now();
    let results = dispatcher(4, 200)
        .work_on_hosts(Arc::clone(&worker), &list)
        .await;

    assert_eq!(results.len(), 2);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(worker.hooks.counts(), (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_timeout_overrides_dispatcher_timeout() {
    let mut worker = ScriptedHostWorker::new(10);
    worker.timeout = Some(Duration::from_millis(100));
    let worker = Arc::new(worker);

    let start = Instant::now();
    let results = dispatcher(4, 60_000)
        .work_on_hosts(Arc::clone(&worker), &hosts(&["slow-1", "a"]))
        .await;

    assert_eq!(results.len(), 1);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_and_panics_are_skipped() {
    let worker = Arc::new(ScriptedHostWorker::new(10));
    let list = hosts(&["fail-1", "a", "panic-1", "b"]);

    let results = dispatcher(4, 1_000)
        .work_on_hosts(Arc::clone(&worker), &list)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(worker.hooks.counts(), (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interruption_never_cancels_sibling_hosts() {
    let worker = Arc::new(ScriptedHostWorker::new(100));
    let list = hosts(&["intr-1", "a", "b"]);

    let results = dispatcher(4, 1_000)
        .work_on_hosts(Arc::clone(&worker), &list)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(worker.cancelled.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opting_in_to_cancellation_stops_host_dispatch() {
    let worker = Arc::new(ScriptedHostWorker::new(50));
    let list = hosts(&["a", "intr-1", "slow-1", "slow-2"]);

    let results = HostDispatcher::new(
        DispatchConfig::for_hosts()
            .with_pool_size(4)
            .with_timeout(Duration::from_secs(5))
            .cancel_siblings_on_interrupt(true),
    )
    .work_on_hosts(Arc::clone(&worker), &list)
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(worker.cancelled.load(Ordering::SeqCst), 2);
}
