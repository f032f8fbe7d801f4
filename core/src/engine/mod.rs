//! engine: whole-buffer parallel encrypt/decrypt.
//!
//! The input is partitioned into aligned segments (see `parallelism`); each segment runs
//! on its own thread with its own `AesStream` and writes into a disjoint region of a
//! pre-sized output. Output is byte-identical to a single-threaded run.

pub mod parallelism;
pub mod segment_worker;
pub mod core;

pub use parallelism::{partition, EngineConfig, Segment};
pub use self::core::{Decryptor, Encryptor};
