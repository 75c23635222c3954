// In: src/stream/mod.rs

//! Lazy operators over streams of batches.
//!
//! Every operator consumes an `Iterator<Item = Result<B, TaqError>>` and is itself
//! such an iterator, so they compose with each other, with the decoder's batch
//! iterators, and with plain `Vec`s of batches in tests. Errors are passed through
//! unchanged and end the stream.
//!
//! The operators are generic over `ChunkBatch`, which is implemented for Arrow's
//! `RecordBatch` and for the decoder's `RawRecordBatch`.

//==================================================================================
// 1. Module Declarations
//==================================================================================

mod batch_impls;
mod downsample;
mod join;
mod split;
mod transform;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::downsample::Downsample;
pub use self::join::JoinAdjacent;
pub use self::split::SplitByKey;
pub use self::transform::{BatchTransform, TransformContext, Transformed};

use std::ops::Range;

use crate::error::TaqError;

//==================================================================================
// 3. Contracts
//==================================================================================

/// **CONTRACT:** What a batch type must provide for the stream operators.
pub trait ChunkBatch: Sized {
    /// The value of a batch's key columns for one record, comparable across batches.
    type Key: PartialEq;

    fn num_rows(&self) -> usize;

    /// Splits the batch into maximal runs of consecutive equal keys. Empty batches
    /// have no runs.
    fn run_ranges(&self, key_columns: &[String]) -> Result<Vec<Range<usize>>, TaqError>;

    /// The key of the first record. Only called on non-empty batches.
    fn first_key(&self, key_columns: &[String]) -> Result<Self::Key, TaqError>;

    fn slice(&self, offset: usize, len: usize) -> Self;

    /// Keeps the records whose entry in `mask` is true.
    fn filter_rows(&self, mask: &[bool]) -> Result<Self, TaqError>;

    /// Concatenates batches of one schema, preserving order.
    fn concat(parts: &[Self]) -> Result<Self, TaqError>;
}

/// **CONTRACT:** A consumer of a batch stream.
pub trait BatchSink<B> {
    fn accept(&mut self, batch: B) -> Result<(), TaqError>;

    /// Called once after the last batch.
    fn finish(&mut self) -> Result<(), TaqError> {
        Ok(())
    }
}

impl<B> BatchSink<B> for Vec<B> {
    fn accept(&mut self, batch: B) -> Result<(), TaqError> {
        self.push(batch);
        Ok(())
    }
}

/// Feeds every batch of `batches` to `sink`, then finishes it. Returns the number
/// of records delivered. The first error stops the drain without finishing.
pub fn drain_into<I, B, S>(batches: I, sink: &mut S) -> Result<usize, TaqError>
where
    I: IntoIterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
    S: BatchSink<B> + ?Sized,
{
    let mut rows = 0;
    for batch in batches {
        let batch = batch?;
        rows += batch.num_rows();
        sink.accept(batch)?;
    }
    sink.finish()?;
    Ok(rows)
}

//==================================================================================
// 4. Combinators
//==================================================================================

/// Chaining methods for any fallible batch iterator.
pub trait BatchStreamExt<B: ChunkBatch>: Iterator<Item = Result<B, TaqError>> + Sized {
    /// Splits each batch into runs of equal `key_columns`.
    fn split_by_key<K: Into<String>>(self, key_columns: impl IntoIterator<Item = K>) -> SplitByKey<Self, B> {
        SplitByKey::new(self, key_columns)
    }

    /// Merges consecutive batches whose leading keys match.
    fn join_adjacent<K: Into<String>>(
        self,
        key_columns: impl IntoIterator<Item = K>,
    ) -> JoinAdjacent<Self, B> {
        JoinAdjacent::new(self, key_columns, None)
    }

    /// Like `join_adjacent`, but never builds a batch above `max_rows` records
    /// (a single oversize input is passed through whole).
    fn join_adjacent_bounded<K: Into<String>>(
        self,
        key_columns: impl IntoIterator<Item = K>,
        max_rows: usize,
    ) -> JoinAdjacent<Self, B> {
        JoinAdjacent::new(self, key_columns, Some(max_rows))
    }

    /// Keeps each record independently with `probability`.
    fn downsample(self, probability: f64, seed: u64) -> Result<Downsample<Self>, TaqError> {
        Downsample::new(self, probability, seed)
    }

    /// Applies `transform` to every batch, sharing `ctx` across the whole stream.
    fn transform<T: BatchTransform<B>>(self, transform: T, ctx: &mut TransformContext) -> Transformed<'_, Self, T> {
        Transformed::new(self, transform, ctx)
    }
}

impl<B: ChunkBatch, I: Iterator<Item = Result<B, TaqError>>> BatchStreamExt<B> for I {}
