use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::backend::BackendError;

/// Backend and workflow counters
#[derive(Debug, Default)]
pub struct BackendMetrics {
    pub total_requests: AtomicU64,
    pub transport_errors: AtomicU64,
    pub not_found: AtomicU64,
    pub persists: AtomicU64,
    pub rejected_guards: AtomicU64,
}

impl BackendMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a failed backend call. `NotFound` is tallied apart from real failures.
    pub fn record_error(&self, error: &BackendError) {
        if error.is_not_found() {
            self.not_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.transport_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_persist(&self) {
        self.persists.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_guard(&self) {
        self.rejected_guards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> BackendStats {
        BackendStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            persists: self.persists.load(Ordering::Relaxed),
            rejected_guards: self.rejected_guards.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Inspection backend metrics: requests={}, transport_errors={}, not_found={}, persists={}, rejected_guards={}",
            stats.total_requests,
            stats.transport_errors,
            stats.not_found,
            stats.persists,
            stats.rejected_guards
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStats {
    pub total_requests: u64,
    pub transport_errors: u64,
    pub not_found: u64,
    pub persists: u64,
    pub rejected_guards: u64,
}

/// Global metrics instance
static BACKEND_METRICS: std::sync::LazyLock<BackendMetrics> =
    std::sync::LazyLock::new(BackendMetrics::new);

pub fn backend_metrics() -> &'static BackendMetrics {
    &BACKEND_METRICS
}

const SLOW_OPERATION: Duration = Duration::from_secs(2);

/// Time an operation; anything slower than two seconds is logged as a warning.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        if duration >= SLOW_OPERATION {
            warn!(
                operation = %self.operation,
                duration_ms = duration.as_millis(),
                "Slow backend operation"
            );
        } else {
            info!(
                operation = %self.operation,
                duration_ms = duration.as_millis(),
                "Operation completed"
            );
        }
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_not_a_transport_error() {
        let metrics = BackendMetrics::new();
        metrics.record_request();
        metrics.record_error(&BackendError::not_found("progress for P-1"));
        metrics.record_request();
        metrics.record_error(&BackendError::Unavailable {
            reason: "maintenance".to_string(),
        });

        let stats = metrics.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.transport_errors, 1);
    }

    #[test]
    fn test_timer_reports_duration() {
        let timer = OperationTimer::new("save_progress");
        assert!(timer.finish() < SLOW_OPERATION);
    }
}
