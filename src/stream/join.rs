//! Merging of consecutive batches that share a key.

use super::ChunkBatch;
use crate::error::TaqError;

/// Accumulates consecutive non-empty batches whose first records have equal keys
/// and emits their concatenation when the key changes, when `max_rows` would be
/// exceeded, or at the end of the input.
///
/// Empty input batches are dropped. An empty input stream yields nothing.
pub struct JoinAdjacent<I, B: ChunkBatch> {
    inner: I,
    key_columns: Vec<String>,
    max_rows: Option<usize>,
    buffer: JoinBuffer<B>,
    done: bool,
}

/// The batches of the run currently being accumulated.
struct JoinBuffer<B: ChunkBatch> {
    batches: Vec<B>,
    total_rows: usize,
    key: Option<B::Key>,
}

impl<B: ChunkBatch> JoinBuffer<B> {
    fn new() -> Self {
        Self {
            batches: Vec::new(),
            total_rows: 0,
            key: None,
        }
    }

    fn add_batch(&mut self, batch: B, key: B::Key) {
        self.total_rows += batch.num_rows();
        self.batches.push(batch);
        self.key = Some(key);
    }

    fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Takes the accumulated run as one batch, leaving the buffer empty.
    fn flush(&mut self) -> Result<B, TaqError> {
        let mut batches = std::mem::take(&mut self.batches);
        self.total_rows = 0;
        self.key = None;
        if batches.len() == 1 {
            if let Some(single) = batches.pop() {
                return Ok(single);
            }
        }
        B::concat(&batches)
    }
}

impl<I, B> JoinAdjacent<I, B>
where
    I: Iterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
{
    pub fn new<K: Into<String>>(
        inner: I,
        key_columns: impl IntoIterator<Item = K>,
        max_rows: Option<usize>,
    ) -> Self {
        Self {
            inner,
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            max_rows,
            buffer: JoinBuffer::new(),
            done: false,
        }
    }
}

impl<I, B> Iterator for JoinAdjacent<I, B>
where
    I: Iterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
{
    type Item = Result<B, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(batch)) => {
                    if batch.num_rows() == 0 {
                        continue;
                    }
                    let key = match batch.first_key(&self.key_columns) {
                        Ok(key) => key,
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    };

                    let same_key = self.buffer.key.as_ref() == Some(&key);
                    let fits = self
                        .max_rows
                        .map_or(true, |max| self.buffer.total_rows + batch.num_rows() <= max);

                    if !self.buffer.is_empty() && !(same_key && fits) {
                        let joined = self.buffer.flush();
                        self.buffer.add_batch(batch, key);
                        return Some(joined);
                    }
                    self.buffer.add_batch(batch, key);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    return Some(self.buffer.flush());
                }
            }
        }
    }
}
