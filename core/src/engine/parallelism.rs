//! engine/parallelism.rs
//! Engine configuration and segment partitioning.
//!
//! Partition rules:
//! - `min_part` is the chunk size with hashes, the AES block size otherwise.
//! - Inputs no longer than `min_part` run on one worker.
//! - `part = ceil(len / threads)` rounded up to a multiple of `min_part`.
//! - `running = len / part` (at least 1, at most `threads`); the last segment absorbs the rest.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::crypto::ProviderType;
use crate::integrity::HashAlgorithm;
use crate::types::StreamError;

/// Whole-buffer engine configuration. Loadable from JSON; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads. Values below 1 are treated as 1.
    pub threads: usize,
    /// Per-stream buffer size; rounded to the stream align size.
    pub buffer_size: usize,
    pub provider: ProviderType,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            provider: ProviderType::default(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

impl EngineConfig {
    pub fn single_threaded() -> Self {
        Self { threads: 1, ..Self::default() }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.max(1)
    }

    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        serde_json::from_str(json)
            .map_err(|e| StreamError::Validation(format!("invalid engine config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, StreamError> {
        serde_json::to_string(self)
            .map_err(|e| StreamError::Validation(format!("engine config serialization failed: {}", e)))
    }
}

/// One worker's logical byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub len: u64,
}

impl Segment {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Split `len` logical bytes into ordered, `min_part`-aligned segments.
///
/// Empty input yields no segments.
pub fn partition(len: u64, threads: usize, min_part: usize) -> Vec<Segment> {
    if len == 0 {
        return Vec::new();
    }
    let threads = threads.max(1) as u64;
    let min_part = min_part.max(1) as u64;
    if threads == 1 || len <= min_part {
        return vec![Segment { index: 0, start: 0, len }];
    }

    let part = len.div_ceil(threads).div_ceil(min_part) * min_part;
    let running = (len / part).clamp(1, threads);

    (0..running)
        .map(|i| {
            let start = i * part;
            let seg_len = if i + 1 == running { len - start } else { part };
            Segment { index: i as usize, start, len: seg_len }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers(segments: &[Segment], len: u64) -> bool {
        let mut next = 0;
        for s in segments {
            if s.start != next {
                return false;
            }
            next = s.end();
        }
        next == len
    }

    #[test]
    fn small_input_runs_single_worker() {
        assert_eq!(partition(100, 8, 256), vec![Segment { index: 0, start: 0, len: 100 }]);
        assert_eq!(partition(256, 8, 256).len(), 1);
        assert!(partition(0, 4, 16).is_empty());
    }

    #[test]
    fn parts_are_aligned_and_cover_input() {
        let len = 10 * 1024 * 1024;
        let chunk = 256 * 1024;
        let segs = partition(len, 4, chunk);
        assert_eq!(segs.len(), 4);
        assert!(covers(&segs, len));
        assert!(segs.iter().all(|s| s.start % chunk as u64 == 0));
    }

    #[test]
    fn last_segment_absorbs_remainder() {
        let segs = partition(1_000_003, 4, 16);
        // ceil(1_000_003 / 4) = 250_001 -> 250_016
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].len, 250_016);
        assert_eq!(segs[2].len, 1_000_003 - 2 * 250_016);
        assert!(covers(&segs, 1_000_003));
    }

    #[test]
    fn rounding_never_goes_below_min_part() {
        // 3 chunks over 8 threads: one chunk per worker
        let segs = partition(3 * 64, 8, 64);
        assert_eq!(segs.len(), 3);
        assert!(segs.iter().all(|s| s.len == 64));
    }

    #[test]
    fn zero_threads_behaves_like_one() {
        assert_eq!(partition(4096, 0, 16).len(), 1);
        assert_eq!(EngineConfig::default().with_threads(0).effective_threads(), 1);
    }

    #[test]
    fn config_loads_partial_json() {
        let cfg = EngineConfig::from_json(r#"{"threads": 3, "provider": "AesCtr"}"#).unwrap();
        assert_eq!(cfg.threads, 3);
        assert_eq!(cfg.provider, ProviderType::AesCtr);
        assert_eq!(cfg.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(EngineConfig::from_json("{ nope").is_err());
    }
}
