// # 📂 `src/engine/segment_worker/decrypt.rs`

use std::io;

use tracing::debug;

use crate::aes_stream::AesStream;
use crate::engine::parallelism::Segment;
use crate::streams::SliceStream;
use crate::types::{EncryptionMode, StreamError};

use super::types::{SegmentContext, SegmentReport};

/// Decrypt the plaintext range of `segment` from the shared physical `input` into `out`.
///
/// Every worker reads the header itself; only segment 0 reports it in telemetry.
pub fn decrypt_segment(
    ctx: &SegmentContext<'_>,
    segment: Segment,
    input: &[u8],
    out: &mut [u8],
) -> Result<SegmentReport, StreamError> {
    ctx.check_cancelled()?;

    let mut stream = AesStream::new(
        ctx.key,
        ctx.nonce,
        EncryptionMode::Decrypt,
        SliceStream::new(input),
        ctx.options.clone(),
    )?;
    if segment.index > 0 {
        stream.reset_telemetry();
    }
    stream.set_position(segment.start)?;

    debug!(segment = segment.index, start = segment.start, len = segment.len, "decrypt segment started");

    let step = stream.buffer_size();
    let mut filled = 0;
    while filled < out.len() {
        ctx.check_cancelled()?;
        let end = (filled + step).min(out.len());
        let n = stream.read(&mut out[filled..end])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("segment {} ended after {} of {} bytes", segment.index, filled, out.len()),
            )
            .into());
        }
        filled += n;
    }

    debug!(segment = segment.index, block = stream.block(), "decrypt segment finished");

    Ok(SegmentReport {
        segment,
        counters: stream.telemetry().clone(),
        stage_times: stream.stage_times().clone(),
    })
}
