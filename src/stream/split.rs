//! Splitting of batches at key boundaries.

use std::collections::VecDeque;

use super::ChunkBatch;
use crate::error::TaqError;

/// Yields, for every input batch, its maximal runs of consecutive records with
/// equal key values, in order. Concatenating the output reproduces the input.
///
/// Runs are found within a batch only; equal keys on either side of a batch
/// boundary stay in separate outputs (see `JoinAdjacent`).
pub struct SplitByKey<I, B> {
    inner: I,
    key_columns: Vec<String>,
    pending: VecDeque<B>,
    done: bool,
}

impl<I, B> SplitByKey<I, B>
where
    I: Iterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
{
    pub fn new<K: Into<String>>(inner: I, key_columns: impl IntoIterator<Item = K>) -> Self {
        Self {
            inner,
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<I, B> Iterator for SplitByKey<I, B>
where
    I: Iterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
{
    type Item = Result<B, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(run) = self.pending.pop_front() {
                return Some(Ok(run));
            }
            if self.done {
                return None;
            }

            match self.inner.next() {
                Some(Ok(batch)) => match batch.run_ranges(&self.key_columns) {
                    Ok(ranges) if ranges.len() == 1 => self.pending.push_back(batch),
                    Ok(ranges) => self
                        .pending
                        .extend(ranges.into_iter().map(|r| batch.slice(r.start, r.len()))),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
