//! Shared instrumentation for dispatcher integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Tracks how many invocations are active, overall and per host.
#[derive(Default)]
pub struct Concurrency {
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    active: usize,
    max_active: usize,
    per_host: HashMap<String, (usize, usize)>,
}

impl Concurrency {
    pub fn enter(&self, host: &str) {
        let mut s = self.inner.lock().unwrap();
        s.active += 1;
        s.max_active = s.max_active.max(s.active);
        let entry = s.per_host.entry(host.to_string()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.max(entry.0);
    }

    pub fn exit(&self, host: &str) {
        let mut s = self.inner.lock().unwrap();
        s.active -= 1;
        if let Some(entry) = s.per_host.get_mut(host) {
            entry.0 -= 1;
        }
    }

    pub fn max_active(&self) -> usize {
        self.inner.lock().unwrap().max_active
    }

    pub fn max_on_host(&self, host: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .per_host
            .get(host)
            .map(|e| e.1)
            .unwrap_or(0)
    }
}

/// Scoped enter/exit that also counts invocations dropped before they
/// finished (i.e. cancelled).
pub struct Active<'a> {
    tracker: &'a Concurrency,
    host: String,
    cancelled: &'a AtomicUsize,
    finished: bool,
}

impl<'a> Active<'a> {
    pub fn new(tracker: &'a Concurrency, host: &str, cancelled: &'a AtomicUsize) -> Self {
        tracker.enter(host);
        Self {
            tracker,
            host: host.to_string(),
            cancelled,
            finished: false,
        }
    }

    pub fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.tracker.exit(&self.host);
        if !self.finished {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Counts lifecycle hook invocations.
#[derive(Default)]
pub struct Hooks {
    pub before: AtomicUsize,
    pub after: AtomicUsize,
}

impl Hooks {
    pub fn counts(&self) -> (usize, usize) {
        (
            self.before.load(Ordering::SeqCst),
            self.after.load(Ordering::SeqCst),
        )
    }
}

pub fn shared<T: Default>() -> Arc<T> {
    Arc::new(T::default())
}
