// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring application performance

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Application metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Shared between the state manager, the fetch task and the GUI controller,
/// and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Fetches that produced a record list
    pub fetches_succeeded: AtomicU64,

    /// Fetches that ended in an error
    pub fetches_failed: AtomicU64,

    /// Total time spent waiting on fetches in milliseconds
    pub total_fetch_time_ms: AtomicU64,

    pub edits_saved: AtomicU64,

    pub edits_cancelled: AtomicU64,

    /// Number of state transitions applied
    pub state_updates: AtomicU64,

    /// Number of state change events delivered to at least one subscriber
    pub state_broadcasts: AtomicU64,

    /// Number of times the table was re-rendered
    pub renders: AtomicU64,

    /// Number of UI updates queued from background tasks
    pub ui_updates: AtomicU64,

    /// Number of UI update channel full errors
    pub ui_update_channel_full: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            fetches_succeeded: AtomicU64::new(0),
            fetches_failed: AtomicU64::new(0),
            total_fetch_time_ms: AtomicU64::new(0),
            edits_saved: AtomicU64::new(0),
            edits_cancelled: AtomicU64::new(0),
            state_updates: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            ui_update_channel_full: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed fetch and how long it took
    pub fn record_fetch(&self, duration: Duration, succeeded: bool) {
        if succeeded {
            self.fetches_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fetches_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_edit_saved(&self) {
        self.edits_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_edit_cancelled(&self) {
        self.edits_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_update(&self) {
        self.state_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcast(&self) {
        self.state_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_channel_full(&self) {
        self.ui_update_channel_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average fetch latency in milliseconds across all attempts
    pub fn avg_fetch_time_ms(&self) -> f64 {
        let total = self.total_fetch_time_ms.load(Ordering::Relaxed);
        let count = self.fetches_succeeded.load(Ordering::Relaxed)
            + self.fetches_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Fetches: {} ok, {} failed (avg: {:.2}ms)",
            self.fetches_succeeded.load(Ordering::Relaxed),
            self.fetches_failed.load(Ordering::Relaxed),
            self.avg_fetch_time_ms()
        );
        tracing::info!(
            "Edits: {} saved, {} cancelled",
            self.edits_saved.load(Ordering::Relaxed),
            self.edits_cancelled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State updates: {}, broadcasts: {}, renders: {}",
            self.state_updates.load(Ordering::Relaxed),
            self.state_broadcasts.load(Ordering::Relaxed),
            self.renders.load(Ordering::Relaxed)
        );
        tracing::info!(
            "UI updates: {}, channel full errors: {}",
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_update_channel_full.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
