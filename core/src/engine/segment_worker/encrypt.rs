// # 📂 `src/engine/segment_worker/encrypt.rs`

use tracing::debug;

use crate::aes_stream::AesStream;
use crate::engine::parallelism::Segment;
use crate::streams::WindowStream;
use crate::types::{EncryptionMode, StreamError};

use super::types::{SegmentContext, SegmentReport};

/// Encrypt `input` (the plaintext of `segment`) into `window`.
///
/// `window` is the segment's physical region of the pre-sized output and starts at physical
/// offset `origin`. Segment 0 writes the header; later segments open against it and seek
/// to their logical start.
pub fn encrypt_segment(
    ctx: &SegmentContext<'_>,
    segment: Segment,
    input: &[u8],
    window: &mut [u8],
    origin: u64,
) -> Result<SegmentReport, StreamError> {
    ctx.check_cancelled()?;

    let base = WindowStream::new(window, origin);
    let options = ctx.options.clone().with_range_write(true);
    let mut stream = match &ctx.header {
        Some(header) if segment.index > 0 => {
            AesStream::with_header(ctx.key, header.clone(), base, options)?
        }
        _ => AesStream::new(ctx.key, ctx.nonce, EncryptionMode::Encrypt, base, options)?,
    };
    if segment.start > 0 {
        stream.set_position(segment.start)?;
    }

    debug!(
        segment = segment.index,
        start = segment.start,
        len = segment.len,
        origin,
        "encrypt segment started"
    );

    for piece in input.chunks(stream.buffer_size()) {
        ctx.check_cancelled()?;
        stream.write(piece)?;
    }
    stream.flush()?;

    debug!(segment = segment.index, block = stream.block(), "encrypt segment finished");

    Ok(SegmentReport {
        segment,
        counters: stream.telemetry().clone(),
        stage_times: stream.stage_times().clone(),
    })
}
