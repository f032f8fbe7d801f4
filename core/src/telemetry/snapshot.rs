// ## src/telemetry/snapshot.rs

//! telemetry/snapshot.rs
//! Immutable summary of one engine run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};
use crate::types::StreamError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub workers: usize,
    pub chunks: u64,
    pub hashes: u64,
    pub bytes_plaintext: u64,
    pub bytes_ciphertext: u64,
    pub bytes_overhead: u64,
    pub throughput_plaintext_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer, workers: usize) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_plaintext as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            workers,
            chunks: counters.chunks,
            hashes: counters.hashes,
            bytes_plaintext: counters.bytes_plaintext,
            bytes_ciphertext: counters.bytes_ciphertext,
            bytes_overhead: counters.bytes_overhead,
            throughput_plaintext_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// CTR never changes length, so plaintext and ciphertext byte counts must agree.
    pub fn sanity_check(&self) -> bool {
        self.bytes_plaintext == self.bytes_ciphertext && self.hashes <= self.chunks
    }

    /// Physical bytes produced (encrypt) or consumed (decrypt).
    pub fn physical_bytes(&self) -> u64 {
        self.bytes_ciphertext + self.bytes_overhead
    }

    pub fn to_json(&self) -> Result<String, StreamError> {
        serde_json::to_string(self)
            .map_err(|e| StreamError::Validation(format!("telemetry serialization failed: {}", e)))
    }
}
