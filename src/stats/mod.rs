use crate::core::Endpoint;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct CaptureStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub responses_observed: usize,
    pub responses_ignored: usize,
    pub error_statuses: usize,
    pub empty_bodies: usize,
    pub parse_failures: usize,
    pub write_failures: usize,
    pub reloads: usize,
    pub bytes_captured: usize,
    pub captures: BTreeMap<Endpoint, usize>,
}

impl CaptureStats {
    fn new() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            responses_observed: 0,
            responses_ignored: 0,
            error_statuses: 0,
            empty_bodies: 0,
            parse_failures: 0,
            write_failures: 0,
            reloads: 0,
            bytes_captured: 0,
            captures: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<CaptureStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(CaptureStats::new())),
        }
    }

    pub fn record_observed(&self) {
        self.stats.write().responses_observed += 1;
    }

    pub fn record_ignored(&self) {
        self.stats.write().responses_ignored += 1;
    }

    /// A watched response that came back with a non-2xx status.
    pub fn record_error_status(&self) {
        self.stats.write().error_statuses += 1;
    }

    pub fn record_empty_body(&self) {
        self.stats.write().empty_bodies += 1;
    }

    pub fn record_parse_failure(&self) {
        self.stats.write().parse_failures += 1;
    }

    pub fn record_write_failure(&self) {
        self.stats.write().write_failures += 1;
    }

    pub fn record_capture(&self, endpoint: Endpoint, size: usize) {
        let mut stats = self.stats.write();
        *stats.captures.entry(endpoint).or_insert(0) += 1;
        stats.bytes_captured += size;
    }

    pub fn record_reload(&self) {
        self.stats.write().reloads += 1;
    }

    /// Clears every counter and restarts the clock.
    pub fn reset(&self) {
        *self.stats.write() = CaptureStats::new();
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> CaptureStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nCapture Statistics:");
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Responses Observed: {}", stats.responses_observed);
        println!("Responses Ignored: {}", stats.responses_ignored);
        println!("Error Statuses: {}", stats.error_statuses);
        println!("Empty Bodies: {}", stats.empty_bodies);
        println!("Parse Failures: {}", stats.parse_failures);
        println!("Write Failures: {}", stats.write_failures);
        println!("Reloads: {}", stats.reloads);
        println!(
            "Data Captured: {:.2} KB",
            stats.bytes_captured as f64 / 1_000.0
        );

        if !stats.captures.is_empty() {
            println!("\nCaptures:");
            for (endpoint, count) in &stats.captures {
                println!("  {}: {}", endpoint, count);
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
