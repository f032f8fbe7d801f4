//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for stream and engine runs.
//!
//! Notes:
//! - Each stream/worker owns its counters; the engine merges them after the join barrier.
//! - Snapshots are serde-serializable for logs and benchmarks.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
