use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    sim_ticks: AtomicU64,
    machines_advanced: AtomicU64,
    polls: AtomicU64,
    poll_failures: AtomicU64,
    visible_alerts_peak: AtomicU64,
    carousel_advances: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_sim_ticks(&self, delta: u64) {
        self.inner.sim_ticks.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_machines_advanced(&self, delta: u64) {
        self.inner.machines_advanced.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_polls(&self, delta: u64) {
        self.inner.polls.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_poll_failures(&self, delta: u64) {
        self.inner.poll_failures.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_carousel_advances(&self, delta: u64) {
        self.inner.carousel_advances.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_visible_peak(&self, visible: u64) {
        self.inner.visible_alerts_peak.fetch_max(visible, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sim_ticks: self.inner.sim_ticks.load(Ordering::Relaxed),
            machines_advanced: self.inner.machines_advanced.load(Ordering::Relaxed),
            polls: self.inner.polls.load(Ordering::Relaxed),
            poll_failures: self.inner.poll_failures.load(Ordering::Relaxed),
            visible_alerts_peak: self.inner.visible_alerts_peak.load(Ordering::Relaxed),
            carousel_advances: self.inner.carousel_advances.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sim_ticks: u64,
    pub machines_advanced: u64,
    pub polls: u64,
    pub poll_failures: u64,
    pub visible_alerts_peak: u64,
    pub carousel_advances: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Line<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let line = Line { label, counters: self, elapsed_ms: elapsed.map(|d| d.as_millis()) };
        serde_json::to_string(&line).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsRegistry::default();
        let other = metrics.clone();
        metrics.inc_polls(2);
        other.inc_poll_failures(1);
        other.record_visible_peak(4);
        metrics.record_visible_peak(3);
        let snap = metrics.snapshot();
        assert_eq!(snap.polls, 2);
        assert_eq!(snap.poll_failures, 1);
        assert_eq!(snap.visible_alerts_peak, 4);
    }

    #[test]
    fn json_line_flattens_counters() {
        let metrics = MetricsRegistry::default();
        metrics.inc_sim_ticks(5);
        let line = metrics.snapshot().to_json_line("final", Some(Duration::from_millis(1500)));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["label"], "final");
        assert_eq!(value["sim_ticks"], 5);
        assert_eq!(value["elapsed_ms"], 1500);
    }
}
