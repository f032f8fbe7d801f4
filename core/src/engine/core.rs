// ## `core.rs`: stable public API

//! engine/core.rs
//! `Encryptor` / `Decryptor`: whole-buffer parallel operations.
//!
//! Contract:
//! - Output is byte-identical for every thread count.
//! - Either the complete, verified result is returned or one error; never partial output.
//! - A failing segment cancels its siblings cooperatively. Among the failures that are not
//!   `Cancelled`, the lowest segment index decides the error.

use std::sync::atomic::AtomicBool;
use std::thread;

use crossbeam::channel::unbounded;
use tracing::{debug, warn};

use crate::aes_stream::{get_output_size_with_hash, AesStream, StreamOptions};
use crate::constants::{BLOCK_SIZE, HEADER_LENGTH, NONCE_LENGTH};
use crate::crypto::SecurityError;
use crate::engine::parallelism::{partition, EngineConfig, Segment};
use crate::engine::segment_worker::{decrypt_segment, encrypt_segment, SegmentContext, SegmentReport};
use crate::headers::Header;
use crate::integrity::{logical_to_physical, Integrity};
use crate::streams::SliceStream;
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{EncryptionFormat, EncryptionMode, StreamError};

/// Parallel whole-buffer encryptor.
#[derive(Debug, Clone, Default)]
pub struct Encryptor {
    config: EngineConfig,
}

impl Encryptor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_threads(threads: usize) -> Self {
        Self::new(EngineConfig::default().with_threads(threads))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encrypt `data` under `key`/`nonce`.
    ///
    /// - `integrity` requires `hash_key`; `chunk_size` `None`/0 selects the default chunk.
    /// - Empty input yields the header alone (or nothing for the header-less format).
    #[allow(clippy::too_many_arguments)]
    pub fn encrypt(
        &self,
        data: &[u8],
        key: &[u8],
        nonce: &[u8],
        format: EncryptionFormat,
        integrity: bool,
        hash_key: Option<&[u8]>,
        chunk_size: Option<usize>,
    ) -> Result<Vec<u8>, StreamError> {
        self.encrypt_with_telemetry(data, key, nonce, format, integrity, hash_key, chunk_size)
            .map(|(out, _)| out)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encrypt_with_telemetry(
        &self,
        data: &[u8],
        key: &[u8],
        nonce: &[u8],
        format: EncryptionFormat,
        integrity: bool,
        hash_key: Option<&[u8]>,
        chunk_size: Option<usize>,
    ) -> Result<(Vec<u8>, TelemetrySnapshot), StreamError> {
        let mut timer = TelemetryTimer::new();
        let options = stream_options(&self.config, format, integrity, hash_key, chunk_size)?;

        // Resolve the layout once so every worker agrees on it.
        let layout = if integrity {
            Integrity::new(true, hash_key, chunk_size.unwrap_or(0), options.hash_provider.clone())?
        } else {
            Integrity::disabled()
        };
        let chunk = layout.chunk_size();
        let hash = layout.hash_size();
        let options = options.with_chunk_size(chunk);

        let header = if format.has_header() {
            let nonce: [u8; NONCE_LENGTH] = nonce.try_into().map_err(|_| {
                SecurityError::InvalidNonceLength { expected: NONCE_LENGTH, actual: nonce.len() }
            })?;
            Some(Header::new(nonce, chunk as u32))
        } else {
            None
        };
        let header_len = if header.is_some() { HEADER_LENGTH } else { 0 };

        let len = data.len() as u64;
        let total = get_output_size_with_hash(EncryptionMode::Encrypt, len, format, chunk, hash);
        let mut out = vec![0u8; total as usize];

        let min_part = if chunk > 0 { chunk } else { BLOCK_SIZE };
        let mut segments = partition(len, self.config.effective_threads(), min_part);
        if segments.is_empty() {
            // Segment 0 still writes the header and validates key and nonce.
            segments.push(Segment { index: 0, start: 0, len: 0 });
        }
        debug!(len, total, chunk, segments = segments.len(), "encrypt partitioned");

        // Carve the output into disjoint physical windows, one per segment.
        let mut jobs = Vec::with_capacity(segments.len());
        let mut rest: &mut [u8] = &mut out;
        let mut consumed = 0u64;
        for (i, seg) in segments.iter().enumerate() {
            let end = if i + 1 == segments.len() {
                total
            } else {
                logical_to_physical(seg.end(), chunk, hash, header_len)
            };
            let (window, tail) = std::mem::take(&mut rest).split_at_mut((end - consumed) as usize);
            jobs.push((*seg, (consumed, window)));
            rest = tail;
            consumed = end;
        }

        let cancel = AtomicBool::new(false);
        let ctx = SegmentContext { key, nonce: Some(nonce), header, options, cancel_flag: &cancel };
        let reports = run_segments(&ctx, jobs, |seg, (origin, window)| {
            let input = &data[seg.start as usize..seg.end() as usize];
            encrypt_segment(&ctx, seg, input, window, origin)
        })?;

        let snapshot = summarize(&reports, &mut timer);
        Ok((out, snapshot))
    }
}

/// Parallel whole-buffer decryptor.
#[derive(Debug, Clone, Default)]
pub struct Decryptor {
    config: EngineConfig,
}

impl Decryptor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_threads(threads: usize) -> Self {
        Self::new(EngineConfig::default().with_threads(threads))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decrypt `data`.
    ///
    /// - Header format: nonce and chunk size come from the header; `nonce` is ignored.
    /// - Header-less format: `nonce` is required and `chunk_size` describes the hashed
    ///   layout (`None`/0 with integrity selects the default chunk).
    /// - Empty input yields empty output.
    #[allow(clippy::too_many_arguments)]
    pub fn decrypt(
        &self,
        data: &[u8],
        key: &[u8],
        nonce: Option<&[u8]>,
        format: EncryptionFormat,
        integrity: bool,
        hash_key: Option<&[u8]>,
        chunk_size: Option<usize>,
    ) -> Result<Vec<u8>, StreamError> {
        self.decrypt_with_telemetry(data, key, nonce, format, integrity, hash_key, chunk_size)
            .map(|(out, _)| out)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decrypt_with_telemetry(
        &self,
        data: &[u8],
        key: &[u8],
        nonce: Option<&[u8]>,
        format: EncryptionFormat,
        integrity: bool,
        hash_key: Option<&[u8]>,
        chunk_size: Option<usize>,
    ) -> Result<(Vec<u8>, TelemetrySnapshot), StreamError> {
        let mut timer = TelemetryTimer::new();
        let options = stream_options(&self.config, format, integrity, hash_key, chunk_size)?;
        if data.is_empty() {
            return Ok((Vec::new(), summarize(&[], &mut timer)));
        }

        // Probe once: parses the header, fixes the layout and rejects truncated input.
        let (length, align) = {
            let probe = AesStream::new(
                key,
                nonce,
                EncryptionMode::Decrypt,
                SliceStream::new(data),
                options.clone(),
            )?;
            probe.check_trailing_hash()?;
            (probe.length()?, probe.align_size())
        };

        let mut out = vec![0u8; length as usize];
        let segments = partition(length, self.config.effective_threads(), align);
        debug!(physical = data.len(), length, align, segments = segments.len(), "decrypt partitioned");
        if segments.is_empty() {
            return Ok((out, summarize(&[], &mut timer)));
        }

        let mut jobs = Vec::with_capacity(segments.len());
        let mut rest: &mut [u8] = &mut out;
        for seg in &segments {
            let (slot, tail) = std::mem::take(&mut rest).split_at_mut(seg.len as usize);
            jobs.push((*seg, slot));
            rest = tail;
        }

        let cancel = AtomicBool::new(false);
        let ctx = SegmentContext { key, nonce, header: None, options, cancel_flag: &cancel };
        let reports = run_segments(&ctx, jobs, |seg, slot| {
            decrypt_segment(&ctx, seg, data, slot)
        })?;

        let snapshot = summarize(&reports, &mut timer);
        Ok((out, snapshot))
    }
}

fn stream_options(
    config: &EngineConfig,
    format: EncryptionFormat,
    integrity: bool,
    hash_key: Option<&[u8]>,
    chunk_size: Option<usize>,
) -> Result<StreamOptions, StreamError> {
    let mut options = StreamOptions::new()
        .with_format(format)
        .with_provider(config.provider)
        .with_hash_provider(config.hash_algorithm.provider())
        .with_buffer_size(config.buffer_size);
    if let Some(chunk) = chunk_size {
        options = options.with_chunk_size(chunk);
    }
    if integrity {
        let hash_key = hash_key.ok_or(SecurityError::MissingHashKey)?;
        options = options.with_integrity(hash_key);
    }
    Ok(options)
}

/// Run one job per segment and join them all.
///
/// A single job runs on the calling thread. Results are reported over a channel; a worker
/// that panics is reported as `WorkerPanicked`.
fn run_segments<W, F>(
    ctx: &SegmentContext<'_>,
    jobs: Vec<(Segment, W)>,
    work: F,
) -> Result<Vec<SegmentReport>, StreamError>
where
    W: Send,
    F: Fn(Segment, W) -> Result<SegmentReport, StreamError> + Sync,
{
    if jobs.len() == 1 {
        let mut reports = Vec::with_capacity(1);
        for (segment, job) in jobs {
            reports.push(work(segment, job)?);
        }
        return Ok(reports);
    }

    let (tx, rx) = unbounded::<(usize, Result<SegmentReport, StreamError>)>();
    let mut results: Vec<(usize, Result<SegmentReport, StreamError>)> = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(segment, job)| {
                let tx = tx.clone();
                let work = &work;
                let handle = scope.spawn(move || {
                    let result = work(segment, job);
                    if let Err(e) = &result {
                        if !matches!(e, StreamError::Cancelled) {
                            warn!(segment = segment.index, error = %e, "segment failed, cancelling siblings");
                            ctx.cancel();
                        }
                    }
                    // The receiver outlives the scope.
                    let _ = tx.send((segment.index, result));
                });
                (segment.index, handle)
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|(index, handle)| {
                handle.join().err().map(|_| {
                    ctx.cancel();
                    (index, Err(StreamError::WorkerPanicked { segment: index }))
                })
            })
            .collect()
    });
    drop(tx);
    results.extend(rx.try_iter());
    results.sort_by_key(|(index, _)| *index);

    let mut reports = Vec::with_capacity(results.len());
    let mut cancelled = false;
    for (_, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(StreamError::Cancelled) => cancelled = true,
            Err(e) => return Err(e),
        }
    }
    if cancelled {
        return Err(StreamError::Cancelled);
    }
    Ok(reports)
}

fn summarize(reports: &[SegmentReport], timer: &mut TelemetryTimer) -> TelemetrySnapshot {
    let mut counters = TelemetryCounters::default();
    for report in reports {
        counters.merge(&report.counters);
        timer.stage_times.merge(&report.stage_times);
    }
    timer.finish();
    TelemetrySnapshot::from(&counters, timer, reports.len())
}
