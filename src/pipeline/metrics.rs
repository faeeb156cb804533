// src/pipeline/metrics.rs
//
// Counters for the point-stream pipeline. Clones share the same atomics, so a
// strategy and the driver can both hold one.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct GestureMetrics {
    pub points: Arc<AtomicU64>,
    pub frames: Arc<AtomicU64>,
    pub windows_fitted: Arc<AtomicU64>,
    pub windows_skipped: Arc<AtomicU64>,
    pub gestures_matched: Arc<AtomicU64>,
    pub gestures_vetoed: Arc<AtomicU64>,
    pub trials_marked: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for GestureMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMetrics {
    pub fn new() -> Self {
        Self {
            points: Arc::new(AtomicU64::new(0)),
            frames: Arc::new(AtomicU64::new(0)),
            windows_fitted: Arc::new(AtomicU64::new(0)),
            windows_skipped: Arc::new(AtomicU64::new(0)),
            gestures_matched: Arc::new(AtomicU64::new(0)),
            gestures_vetoed: Arc::new(AtomicU64::new(0)),
            trials_marked: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn points_per_sec(&self) -> f64 {
        let points = self.points.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            points as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            points: self.points.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            windows_fitted: self.windows_fitted.load(Ordering::Relaxed),
            windows_skipped: self.windows_skipped.load(Ordering::Relaxed),
            gestures_matched: self.gestures_matched.load(Ordering::Relaxed),
            gestures_vetoed: self.gestures_vetoed.load(Ordering::Relaxed),
            trials_marked: self.trials_marked.load(Ordering::Relaxed),
            points_per_sec: self.points_per_sec(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub points: u64,
    pub frames: u64,
    pub windows_fitted: u64,
    pub windows_skipped: u64,
    pub gestures_matched: u64,
    pub gestures_vetoed: u64,
    pub trials_marked: u64,
    pub points_per_sec: f64,
    pub elapsed_secs: f64,
}
