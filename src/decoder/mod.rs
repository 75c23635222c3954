// In: src/decoder/mod.rs

//! The chunked decoder for fixed-width quote files.
//!
//! A `ChunkedDecoder` owns one input stream for its whole life. Construction reads
//! the header line, which fixes both the file's trading date and its physical line
//! width, and derives the `RecordLayout` from that width. Records are then read in
//! blocks of `batch_size_rows` whole lines and handed out one batch at a time,
//! either as raw bytes (`RawRecordBatch`) or converted to typed Arrow batches.
//!
//! The decoder is a small state machine:
//!
//! ```text
//! HeaderRead --first read--> Streaming --EOF / error / close--> Closed
//! ```
//!
//! Reaching `Closed` drops the input stream, which releases the file handle.

pub mod convert;
pub mod header;
pub mod raw_batch;


use std::io::{BufRead, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};

use crate::archive::{open_archive, ArchiveReader};
use crate::config::DecoderConfig;
use crate::error::TaqError;
use crate::layout::{bbo_fields, RecordLayout};

pub use header::{format_header, parse_header, ArchiveMetadata};
pub use raw_batch::RawRecordBatch;

/// Upper bound on the buffer reserved up front for one block; larger blocks grow
/// while reading.
const MAX_PREALLOC_BYTES: usize = 64 << 20;

//==================================================================================
// 1. State & Statistics
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// The header has been parsed and the layout fixed; no record read yet.
    HeaderRead,
    /// At least one block has been requested.
    Streaming,
    /// The input is exhausted, failed, or was closed by the caller.
    Closed,
}

/// Running counters for one decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub batches: u64,
    /// Records read from the file.
    pub rows_read: u64,
    /// Records present in emitted typed batches.
    pub rows_emitted: u64,
    /// Records dropped during typed conversion.
    pub rows_skipped: u64,
}

/// One decoded batch, in the form selected by `DecoderConfig::convert`.
#[derive(Debug, Clone)]
pub enum DecodedBatch {
    Raw(RawRecordBatch),
    Typed(RecordBatch),
}

impl DecodedBatch {
    pub fn num_rows(&self) -> usize {
        match self {
            Self::Raw(batch) => batch.num_rows(),
            Self::Typed(batch) => batch.num_rows(),
        }
    }
}

//==================================================================================
// 2. ChunkedDecoder
//==================================================================================

pub struct ChunkedDecoder<R> {
    /// `None` once the decoder is closed.
    reader: Option<R>,
    config: DecoderConfig,
    metadata: ArchiveMetadata,
    layout: Arc<RecordLayout>,
    /// Bytes per full block: line width times `batch_size_rows`.
    block_len: usize,
    state: DecoderState,
    stats: DecodeStats,
}

impl ChunkedDecoder<ArchiveReader> {
    /// Opens a file on disk (zip, gzip, zstd or plain) and reads its header.
    pub fn open(path: impl AsRef<Path>, config: DecoderConfig) -> Result<Self, TaqError> {
        let path = path.as_ref();
        log::info!("Opening quote file {}", path.display());
        let reader = open_archive(path, config.archive_format)?;
        Self::new(reader, config)
    }
}

impl<R: BufRead> ChunkedDecoder<R> {
    /// Reads the header line from `reader` and fixes the record layout.
    pub fn new(mut reader: R, config: DecoderConfig) -> Result<Self, TaqError> {
        config.validate()?;
        let tz = config.tz()?;

        let mut header_line = Vec::new();
        reader.read_until(b'\n', &mut header_line)?;
        if header_line.is_empty() {
            return Err(TaqError::InvalidHeader("input is empty".to_string()));
        }
        let metadata = parse_header(&header_line, tz)?;

        let layout = match &config.layout_override {
            Some(table) => RecordLayout::from_line_width(metadata.line_width, table, &config.computed_fields)?,
            None => RecordLayout::from_line_width(metadata.line_width, &bbo_fields(), &config.computed_fields)?,
        };
        log::info!(
            "Layout: {} raw fields, {} output columns, {}-byte lines",
            layout.raw.fields.len(),
            layout.target.fields.len(),
            layout.line_width()
        );
        let block_len = layout
            .line_width()
            .checked_mul(config.batch_size_rows)
            .ok_or_else(|| {
                TaqError::InvalidConfig(format!(
                    "batch_size_rows {} overflows a block of {}-byte lines",
                    config.batch_size_rows,
                    layout.line_width()
                ))
            })?;

        Ok(Self {
            reader: Some(reader),
            config,
            metadata,
            layout: Arc::new(layout),
            block_len,
            state: DecoderState::HeaderRead,
            stats: DecodeStats::default(),
        })
    }

    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.layout.target.arrow_schema)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Reads the next block of whole records.
    ///
    /// Every batch holds exactly `batch_size_rows` records except possibly the
    /// last. Returns `Ok(None)` once the input is exhausted or the decoder is
    /// closed. Any error closes the decoder.
    pub fn next_raw_batch(&mut self) -> Result<Option<RawRecordBatch>, TaqError> {
        let line_width = self.layout.line_width();
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        self.state = DecoderState::Streaming;

        let mut block = Vec::with_capacity(self.block_len.min(MAX_PREALLOC_BYTES));
        let read = reader.by_ref().take(self.block_len as u64).read_to_end(&mut block);

        match read {
            Err(e) => {
                self.release();
                Err(e.into())
            }
            Ok(0) => {
                self.finish();
                Ok(None)
            }
            Ok(n) if n % line_width != 0 => {
                self.release();
                Err(TaqError::MisalignedBlock {
                    block_len: n,
                    line_width,
                })
            }
            Ok(_) => {
                let batch = RawRecordBatch::new(Arc::clone(&self.layout), block)?;
                self.stats.batches += 1;
                self.stats.rows_read += batch.num_rows() as u64;
                log_metric!("event" = "raw_batch", "rows" = batch.num_rows());
                Ok(Some(batch))
            }
        }
    }

    /// Reads the next block and converts it to the target schema.
    pub fn next_typed_batch(&mut self) -> Result<Option<RecordBatch>, TaqError> {
        let Some(raw) = self.next_raw_batch()? else {
            return Ok(None);
        };
        match convert::to_record_batch(&raw, &self.metadata) {
            Ok(converted) => {
                self.stats.rows_emitted += converted.batch.num_rows() as u64;
                self.stats.rows_skipped += converted.rows_skipped as u64;
                Ok(Some(converted.batch))
            }
            Err(e) => {
                if e.is_decode_failure() {
                    log::error!("Conversion failed after {} records: {}", self.stats.rows_read, e);
                } else {
                    log::warn!("Cannot convert to the target schema: {}", e);
                }
                self.release();
                Err(e)
            }
        }
    }

    /// Reads the next batch in the configured form.
    pub fn next_batch(&mut self) -> Result<Option<DecodedBatch>, TaqError> {
        if self.config.convert {
            Ok(self.next_typed_batch()?.map(DecodedBatch::Typed))
        } else {
            Ok(self.next_raw_batch()?.map(DecodedBatch::Raw))
        }
    }

    /// Releases the input stream. Further reads yield nothing.
    pub fn close(&mut self) {
        if self.reader.is_some() {
            log::info!(
                "Decoder closed early after {} records in {} batches",
                self.stats.rows_read,
                self.stats.batches
            );
        }
        self.release();
    }

    /// Iterates raw batches regardless of `convert`.
    pub fn into_raw_batches(self) -> RawBatches<R> {
        RawBatches(self)
    }

    /// Iterates typed batches regardless of `convert`.
    pub fn into_typed_batches(self) -> TypedBatches<R> {
        TypedBatches(self)
    }

    /// Adapts the decoder to Arrow's `RecordBatchReader` interface.
    pub fn into_reader(self) -> ArrowBatches<R> {
        ArrowBatches(self.into_typed_batches())
    }

    /// End of input: reconcile the declared count and release the stream.
    fn finish(&mut self) {
        log::info!(
            "Finished decoding: {} records in {} batches ({} skipped)",
            self.stats.rows_read,
            self.stats.batches,
            self.stats.rows_skipped
        );
        if let Some(declared) = self.metadata.declared_rows {
            if declared != self.stats.rows_read {
                log::warn!(
                    "Header declares {} records but {} were read",
                    declared,
                    self.stats.rows_read
                );
            }
        }
        self.release();
    }

    fn release(&mut self) {
        self.reader = None;
        self.state = DecoderState::Closed;
    }
}

impl<R: BufRead> Iterator for ChunkedDecoder<R> {
    type Item = Result<DecodedBatch, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

//==================================================================================
// 3. Iterator Adapters
//==================================================================================

pub struct RawBatches<R>(ChunkedDecoder<R>);

impl<R> RawBatches<R> {
    pub fn decoder(&self) -> &ChunkedDecoder<R> {
        &self.0
    }
}

impl<R: BufRead> Iterator for RawBatches<R> {
    type Item = Result<RawRecordBatch, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_raw_batch().transpose()
    }
}

pub struct TypedBatches<R>(ChunkedDecoder<R>);

impl<R> TypedBatches<R> {
    pub fn decoder(&self) -> &ChunkedDecoder<R> {
        &self.0
    }
}

impl<R: BufRead> Iterator for TypedBatches<R> {
    type Item = Result<RecordBatch, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_typed_batch().transpose()
    }
}

/// Arrow consumers see `TaqError`s as `ArrowError`s.
pub struct ArrowBatches<R>(TypedBatches<R>);

impl<R: BufRead> Iterator for ArrowBatches<R> {
    type Item = Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map_err(ArrowError::from))
    }
}

impl<R: BufRead> RecordBatchReader for ArrowBatches<R> {
    fn schema(&self) -> SchemaRef {
        self.0.decoder().schema()
    }
}
