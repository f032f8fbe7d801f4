// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters used by streams and engine workers.
//!
//! Summary: Collects chunk/hash counts and byte counts during encrypt/decrypt.
//! Converted into an immutable `TelemetrySnapshot` when an engine run ends.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Deterministic counters collected during stream processing.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub headers: u64,
    pub chunks: u64,
    pub hashes: u64,
    pub bytes_plaintext: u64,
    pub bytes_ciphertext: u64,
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record the stream header as overhead.
    pub fn add_header(&mut self, header_len: usize) {
        self.headers += 1;
        self.bytes_overhead += header_len as u64;
    }

    /// Record one transformed batch.
    ///
    /// - `chunks`: integrity chunks (or 1 for a batch without integrity)
    /// - `pt_len`/`ct_len`: plaintext and ciphertext bytes (equal in CTR mode)
    pub fn add_data(&mut self, chunks: usize, pt_len: usize, ct_len: usize) {
        self.chunks += chunks as u64;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_ciphertext += ct_len as u64;
    }

    /// Record hash blocks written or verified.
    pub fn add_hashes(&mut self, count: usize, hash_size: usize) {
        self.hashes += count as u64;
        self.bytes_overhead += (count * hash_size) as u64;
    }

    /// Physical bytes: ciphertext plus header and hash overhead.
    pub fn physical_bytes(&self) -> u64 {
        self.bytes_ciphertext + self.bytes_overhead
    }

    // Workers keep their own counters and the coordinator merges them after the join,
    // so no locks or atomics are needed while processing.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.headers += other.headers;
        self.chunks += other.chunks;
        self.hashes += other.hashes;
        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_overhead += other.bytes_overhead;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
