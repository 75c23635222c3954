//! The caller-owned transform seam.
//!
//! Cross-batch state (such as a symbol remapping table that must stay stable for a
//! whole file) lives in an explicit `TransformContext` owned by the caller, not in
//! the operators, so the same context can span several streams or files.

use hashbrown::HashMap;

use crate::error::TaqError;

/// State shared by a transform across every batch of a stream.
#[derive(Debug, Default)]
pub struct TransformContext {
    remap: HashMap<Vec<u8>, Vec<u8>>,
    batches_seen: u64,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stable replacement for `original`, calling `assign` the first
    /// time a value is seen. `assign` receives the number of values mapped so far.
    pub fn remap(&mut self, original: &[u8], assign: impl FnOnce(usize) -> Vec<u8>) -> &[u8] {
        let next_id = self.remap.len();
        self.remap
            .entry_ref(original)
            .or_insert_with(|| assign(next_id))
            .as_slice()
    }

    pub fn lookup(&self, original: &[u8]) -> Option<&[u8]> {
        self.remap.get(original).map(Vec::as_slice)
    }

    pub fn remapped_len(&self) -> usize {
        self.remap.len()
    }

    pub fn batches_seen(&self) -> u64 {
        self.batches_seen
    }
}

/// **CONTRACT:** A per-batch rewrite with access to stream-wide state.
pub trait BatchTransform<B> {
    fn apply(&mut self, batch: B, ctx: &mut TransformContext) -> Result<B, TaqError>;
}

impl<B, F> BatchTransform<B> for F
where
    F: FnMut(B, &mut TransformContext) -> Result<B, TaqError>,
{
    fn apply(&mut self, batch: B, ctx: &mut TransformContext) -> Result<B, TaqError> {
        self(batch, ctx)
    }
}

/// Applies a `BatchTransform` to every batch of a stream.
pub struct Transformed<'c, I, T> {
    inner: I,
    transform: T,
    ctx: &'c mut TransformContext,
    done: bool,
}

impl<'c, I, T> Transformed<'c, I, T> {
    pub fn new(inner: I, transform: T, ctx: &'c mut TransformContext) -> Self {
        Self {
            inner,
            transform,
            ctx,
            done: false,
        }
    }
}

impl<'c, I, B, T> Iterator for Transformed<'c, I, T>
where
    I: Iterator<Item = Result<B, TaqError>>,
    T: BatchTransform<B>,
{
    type Item = Result<B, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.inner.next()? {
            Ok(batch) => {
                self.ctx.batches_seen += 1;
                self.transform.apply(batch, self.ctx)
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
