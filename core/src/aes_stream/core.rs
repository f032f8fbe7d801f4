//! aes_stream/core.rs
//! `AesStream`: seekable AES-256-CTR stream over a `RandomAccessStream`.
//!
//! Design:
//! - The caller sees logical (plaintext) positions; the base stream holds the physical layout
//!   `[header][hash|chunk]...` (see `integrity::engine`).
//! - Every seek maps logical -> physical with the integrity arithmetic and re-syncs the
//!   transformer counter from the logical position; header and hashes never count as blocks.
//! - Reads are served in whole chunks (or blocks) so every byte returned has been verified.
//! - Writes must start on a chunk (or block) boundary. Writes at a non-zero position need
//!   `allow_range_write`; the parallel engine uses this to place segments.
//!
//! Lifecycle: a constructed stream is ready; `close()` wipes the key and makes every later
//! operation fail with `StreamError::Closed`.

use std::io::{self, SeekFrom};

use tracing::debug;

use crate::aes_stream::types::StreamOptions;
use crate::constants::{BLOCK_SIZE, DEFAULT_BUFFER_SIZE, HEADER_LENGTH, NONCE_LENGTH};
use crate::crypto::{create_transformer, CtrTransformer, SecurityError};
use crate::headers::{read_header_data, write_header, Header};
use crate::integrity::{physical_to_logical, Integrity, IntegrityError};
use crate::streams::RandomAccessStream;
use crate::telemetry::{StageTimes, TelemetryCounters};
use crate::types::{EncryptionFormat, EncryptionMode, StreamError};

pub struct AesStream<S: RandomAccessStream> {
    pub(super) base: S,
    pub(super) mode: EncryptionMode,
    pub(super) format: EncryptionFormat,
    pub(super) header: Option<Header>,
    pub(super) transformer: Box<dyn CtrTransformer>,
    pub(super) integrity: Integrity,
    pub(super) buffer_size: usize,
    pub(super) allow_range_write: bool,
    pub(super) position: u64,
    pub(super) closed: bool,
    pub(super) counters: TelemetryCounters,
    pub(super) stage_times: StageTimes,
}

impl<S: RandomAccessStream> std::fmt::Debug for AesStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesStream")
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<S: RandomAccessStream> AesStream<S> {
    /// Open an encrypting or decrypting stream over `base`.
    ///
    /// - Encrypt: `nonce` is required. With a header format the header is written at
    ///   physical offset 0. Integrity off means no hash blocks.
    /// - Decrypt: with a header format, nonce and chunk size come from the header and a
    ///   caller nonce is ignored. Requesting integrity on a stream without hashes fails.
    /// - Decrypt over an empty base with a header format: there is no header to take the
    ///   nonce from, so a caller nonce is required (`MissingNonce` otherwise) and the stream
    ///   opens with length 0.
    pub fn new(
        key: &[u8],
        nonce: Option<&[u8]>,
        mode: EncryptionMode,
        mut base: S,
        options: StreamOptions,
    ) -> Result<Self, StreamError> {
        check_base(&base, mode)?;

        let (nonce, header, integrity) = match mode {
            EncryptionMode::Encrypt => {
                let nonce = nonce.ok_or(SecurityError::MissingNonce)?;
                let integrity = encrypt_integrity(&options, options.requested_chunk_size())?;
                let header = if options.format.has_header() {
                    base.set_position(0)?;
                    Some(write_header(&mut base, nonce, integrity.chunk_size() as u32)?)
                } else {
                    None
                };
                (nonce.to_vec(), header, integrity)
            }
            EncryptionMode::Decrypt => {
                let header = if options.format.has_header() {
                    read_header_data(&mut base)?
                } else {
                    None
                };
                let (nonce, chunk_size) = match &header {
                    Some(h) => (h.nonce().to_vec(), h.chunk_size() as usize),
                    None => {
                        let nonce = nonce.ok_or(SecurityError::MissingNonce)?;
                        (nonce.to_vec(), options.requested_chunk_size())
                    }
                };
                let integrity = decrypt_integrity(&options, chunk_size, header.is_some())?;
                (nonce, header, integrity)
            }
        };

        let mut stream = Self::build(key, &nonce, mode, base, header, integrity, options)?;
        if stream.header.is_some() {
            stream.counters.add_header(HEADER_LENGTH);
        }
        Ok(stream)
    }

    /// Open an encrypting stream whose header was already written elsewhere.
    ///
    /// Used by parallel workers that own a region of the output after the first one.
    /// Nothing is written at construction time and the header is not counted.
    pub fn with_header(
        key: &[u8],
        header: Header,
        base: S,
        options: StreamOptions,
    ) -> Result<Self, StreamError> {
        check_base(&base, EncryptionMode::Encrypt)?;
        let chunk_size = header.chunk_size() as usize;
        if (chunk_size > 0) != options.integrity {
            return Err(StreamError::Validation(format!(
                "header chunk size {} does not match integrity={}",
                chunk_size, options.integrity
            )));
        }
        let integrity = encrypt_integrity(&options, chunk_size)?;
        let nonce = *header.nonce();
        Self::build(key, &nonce, EncryptionMode::Encrypt, base, Some(header), integrity, options)
    }

    fn build(
        key: &[u8],
        nonce: &[u8],
        mode: EncryptionMode,
        base: S,
        header: Option<Header>,
        integrity: Integrity,
        options: StreamOptions,
    ) -> Result<Self, StreamError> {
        let mut transformer = create_transformer(options.provider);
        transformer.init(key, nonce)?;

        let mut stream = Self {
            base,
            mode,
            format: options.format,
            header,
            transformer,
            integrity,
            buffer_size: 0,
            allow_range_write: options.allow_range_write,
            position: 0,
            closed: false,
            counters: TelemetryCounters::default(),
            stage_times: StageTimes::default(),
        };
        stream.set_buffer_size(options.buffer_size);
        stream.seek_to(0)?;

        debug!(
            ?mode,
            format = ?stream.format,
            chunk_size = stream.integrity.chunk_size(),
            integrity = stream.integrity.is_enabled(),
            provider = ?options.provider,
            "aes stream opened"
        );
        Ok(stream)
    }

    // -------------------------------------------------------------------------
    // Position model
    // -------------------------------------------------------------------------

    pub(super) fn header_len(&self) -> usize {
        if self.header.is_some() { HEADER_LENGTH } else { 0 }
    }

    pub(super) fn physical_of(&self, logical: u64) -> u64 {
        self.header_len() as u64
            + logical
            + self.integrity.hash_data_length(EncryptionMode::Encrypt, logical)
    }

    /// Move base stream and counter to `logical`. No range-write policy applied.
    pub(super) fn seek_to(&mut self, logical: u64) -> Result<(), StreamError> {
        let physical = self.physical_of(logical);
        self.base.set_position(physical)?;
        self.transformer.sync_counter(logical)?;
        self.position = logical;
        Ok(())
    }

    pub(super) fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    /// Logical length: plaintext bytes in (decrypt) or written to (encrypt) the base stream.
    pub fn length(&self) -> Result<u64, StreamError> {
        self.ensure_open()?;
        Ok(physical_to_logical(
            self.base.length()?,
            self.integrity.chunk_size(),
            self.integrity.hash_size(),
            self.header_len(),
        ))
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to logical `position`.
    ///
    /// An encrypting stream only accepts non-zero positions with range writes enabled.
    pub fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.ensure_open()?;
        if self.mode == EncryptionMode::Encrypt && position != 0 && !self.allow_range_write {
            return Err(StreamError::Validation(
                "range write is not allowed; enable allow_range_write to seek an encrypting stream".into(),
            ));
        }
        self.seek_to(position)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.ensure_open()?;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.length()?.checked_add_signed(delta),
        }
        .ok_or_else(|| StreamError::Validation(format!("invalid seek {:?}", pos)))?;
        self.set_position(target)?;
        Ok(target)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    pub fn format(&self) -> EncryptionFormat {
        self.format
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn chunk_size(&self) -> usize {
        self.integrity.chunk_size()
    }

    pub fn is_integrity_enabled(&self) -> bool {
        self.integrity.is_enabled()
    }

    pub fn nonce(&self) -> Option<&[u8; NONCE_LENGTH]> {
        self.transformer.nonce()
    }

    pub fn counter(&self) -> &[u8; BLOCK_SIZE] {
        self.transformer.counter()
    }

    pub fn block(&self) -> u64 {
        self.transformer.block()
    }

    /// Chunk size when the layout carries hashes, block size otherwise.
    pub fn align_size(&self) -> usize {
        if self.integrity.has_hashes() {
            self.integrity.chunk_size()
        } else {
            BLOCK_SIZE
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// 0 selects the default. Rounded down to the align size, never below it.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        let requested = if buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { buffer_size };
        let align = self.align_size();
        self.buffer_size = (requested / align).max(1) * align;
    }

    pub fn allow_range_write(&self) -> bool {
        self.allow_range_write
    }

    pub fn set_allow_range_write(&mut self, allow: bool) {
        self.allow_range_write = allow;
    }

    pub fn telemetry(&self) -> &TelemetryCounters {
        &self.counters
    }

    pub fn stage_times(&self) -> &StageTimes {
        &self.stage_times
    }

    pub fn reset_telemetry(&mut self) {
        self.counters = TelemetryCounters::default();
        self.stage_times = StageTimes::default();
    }

    pub fn get_ref(&self) -> &S {
        &self.base
    }

    /// Give back the base stream. The transformer key is wiped on drop.
    pub fn into_inner(self) -> S {
        self.base
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.base.flush()
    }

    /// Flush and close the base stream and wipe key material. Idempotent.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.transformer.close();
        let flushed = self.base.flush();
        let closed = self.base.close();
        flushed.and(closed)
    }
}

fn check_base<S: RandomAccessStream>(base: &S, mode: EncryptionMode) -> Result<(), StreamError> {
    let ok = match mode {
        EncryptionMode::Encrypt => base.can_write(),
        EncryptionMode::Decrypt => base.can_read(),
    };
    if !ok || !base.can_seek() {
        return Err(StreamError::Validation(format!(
            "base stream does not support {:?} with seeking",
            mode
        )));
    }
    Ok(())
}

/// Encrypt side: hashes exist exactly when integrity is on.
fn encrypt_integrity(options: &StreamOptions, chunk_size: usize) -> Result<Integrity, StreamError> {
    if options.integrity {
        Integrity::new(
            true,
            options.hash_key.as_ref().map(|k| k.as_slice()),
            chunk_size,
            options.hash_provider.clone(),
        )
    } else {
        Ok(Integrity::disabled())
    }
}

/// Decrypt side: the layout comes from the header (or caller); verification from the caller.
fn decrypt_integrity(
    options: &StreamOptions,
    chunk_size: usize,
    from_header: bool,
) -> Result<Integrity, StreamError> {
    if options.integrity && from_header && chunk_size == 0 {
        return Err(IntegrityError::NotAvailable.into());
    }
    Integrity::new(
        options.integrity,
        options.hash_key.as_ref().map(|k| k.as_slice()),
        chunk_size,
        options.hash_provider.clone(),
    )
}

// -----------------------------------------------------------------------------
// Trait surfaces
// -----------------------------------------------------------------------------

impl<S: RandomAccessStream> RandomAccessStream for AesStream<S> {
    fn can_read(&self) -> bool {
        !self.closed && self.mode == EncryptionMode::Decrypt
    }

    fn can_write(&self) -> bool {
        !self.closed && self.mode == EncryptionMode::Encrypt
    }

    fn can_seek(&self) -> bool {
        !self.closed
    }

    fn length(&self) -> Result<u64, StreamError> {
        AesStream::length(self)
    }

    fn set_length(&mut self, _length: u64) -> Result<(), StreamError> {
        Err(StreamError::Validation("set_length is not supported on an encrypted stream".into()))
    }

    fn position(&self) -> Result<u64, StreamError> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        AesStream::set_position(self, position)
    }

    fn align_size(&self) -> usize {
        AesStream::align_size(self)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StreamError> {
        AesStream::read(self, buffer)
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), StreamError> {
        AesStream::write(self, buffer)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        AesStream::seek(self, pos)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        AesStream::flush(self)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        AesStream::close(self)
    }
}

impl<S: RandomAccessStream> io::Read for AesStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(AesStream::read(self, buf)?)
    }
}

impl<S: RandomAccessStream> io::Write for AesStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        AesStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(AesStream::flush(self)?)
    }
}

impl<S: RandomAccessStream> io::Seek for AesStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(AesStream::seek(self, pos)?)
    }
}
