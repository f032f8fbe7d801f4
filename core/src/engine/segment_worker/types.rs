use std::sync::atomic::{AtomicBool, Ordering};

use crate::aes_stream::StreamOptions;
use crate::engine::parallelism::Segment;
use crate::headers::Header;
use crate::telemetry::{StageTimes, TelemetryCounters};
use crate::types::StreamError;

/// Immutable state shared by every worker of one engine run.
#[derive(Debug)]
pub struct SegmentContext<'a> {
    pub key: &'a [u8],
    pub nonce: Option<&'a [u8]>,
    /// Header written by segment 0; later encrypt segments open against it.
    pub header: Option<Header>,
    pub options: StreamOptions,
    pub cancel_flag: &'a AtomicBool,
}

impl SegmentContext<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Release);
    }

    /// `Err(Cancelled)` once a sibling has failed.
    pub fn check_cancelled(&self) -> Result<(), StreamError> {
        if self.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        Ok(())
    }
}

/// Per-worker result, merged by the coordinator after the join barrier.
#[derive(Debug, Clone)]
pub struct SegmentReport {
    pub segment: Segment,
    pub counters: TelemetryCounters,
    pub stage_times: StageTimes,
}
