//! Engine counters and snapshot reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free counters updated on every evaluation.
///
/// Cache hits are counted but excluded from the latency average; a served
/// snapshot says nothing about evaluation cost.
#[derive(Debug, Default)]
pub struct EngineStats {
    total_evaluations: AtomicU64,
    successful_evaluations: AtomicU64,
    failed_evaluations: AtomicU64,
    violations_detected: AtomicU64,
    blocks_applied: AtomicU64,
    cache_hits: AtomicU64,
    total_latency_micros: AtomicU64,
}

/// Point-in-time view of the engine counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_evaluations: u64,
    pub successful_evaluations: u64,
    pub failed_evaluations: u64,
    pub violations_detected: u64,
    pub blocks_applied: u64,
    pub cache_hits: u64,
    pub average_latency_ms: f64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, violations: u64, blocks: u64, latency_micros: u64) {
        self.total_evaluations.fetch_add(1, Ordering::Relaxed);
        self.successful_evaluations.fetch_add(1, Ordering::Relaxed);
        self.violations_detected
            .fetch_add(violations, Ordering::Relaxed);
        self.blocks_applied.fetch_add(blocks, Ordering::Relaxed);
        self.total_latency_micros
            .fetch_add(latency_micros, Ordering::Relaxed);
    }

    pub fn record_failure(&self, latency_micros: u64) {
        self.total_evaluations.fetch_add(1, Ordering::Relaxed);
        self.failed_evaluations.fetch_add(1, Ordering::Relaxed);
        self.total_latency_micros
            .fetch_add(latency_micros, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total_evaluations.load(Ordering::Relaxed);
        let total_latency_micros = self.total_latency_micros.load(Ordering::Relaxed);
        let average_latency_ms = if total > 0 {
            total_latency_micros as f64 / total as f64 / 1000.0
        } else {
            0.0
        };

        StatsSnapshot {
            total_evaluations: total,
            successful_evaluations: self.successful_evaluations.load(Ordering::Relaxed),
            failed_evaluations: self.failed_evaluations.load(Ordering::Relaxed),
            violations_detected: self.violations_detected.load(Ordering::Relaxed),
            blocks_applied: self.blocks_applied.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            average_latency_ms,
        }
    }
}
