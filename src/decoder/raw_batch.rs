//! An owned block of whole fixed-width lines, still in their on-disk bytes.
//!
//! Field access is by name through the shared `RecordLayout`. Because rows keep
//! their terminators, `as_bytes` of any batch (or of a concatenation of batches)
//! can be written back after the header line to produce a valid file.

use std::ops::Range;
use std::sync::Arc;

use crate::error::TaqError;
use crate::layout::RecordLayout;

#[derive(Debug, Clone)]
pub struct RawRecordBatch {
    layout: Arc<RecordLayout>,
    data: Vec<u8>,
}

impl RawRecordBatch {
    /// Wraps `data`, which must hold a whole number of lines of `layout`.
    pub fn new(layout: Arc<RecordLayout>, data: Vec<u8>) -> Result<Self, TaqError> {
        let line_width = layout.line_width();
        if data.len() % line_width != 0 {
            return Err(TaqError::MisalignedBlock {
                block_len: data.len(),
                line_width,
            });
        }
        Ok(Self { layout, data })
    }

    pub fn empty(layout: Arc<RecordLayout>) -> Self {
        Self {
            layout,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.data.len() / self.layout.line_width()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    /// The full line of record `row`, terminator included.
    pub fn record(&self, row: usize) -> &[u8] {
        let width = self.layout.line_width();
        &self.data[row * width..(row + 1) * width]
    }

    pub fn records(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.layout.line_width())
    }

    /// The bytes of field `name` in record `row`, or `None` if this file's layout
    /// does not carry that field.
    pub fn field(&self, row: usize, name: &str) -> Option<&[u8]> {
        let range = self.layout.field_range(name)?;
        Some(&self.record(row)[range])
    }

    /// Iterates one field over every record.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &[u8]>, TaqError> {
        let range = self.range_of(name)?;
        Ok(self.records().map(move |record| &record[range.clone()]))
    }

    /// Overwrites field `name` of record `row` in place. The value must be exactly
    /// as wide as the field.
    pub fn set_field(&mut self, row: usize, name: &str, value: &[u8]) -> Result<(), TaqError> {
        let range = self.range_of(name)?;
        if value.len() != range.len() {
            return Err(TaqError::FieldWidth {
                field: name.to_string(),
                expected: range.len(),
                actual: value.len(),
            });
        }
        let start = row * self.layout.line_width();
        self.data[start + range.start..start + range.end].copy_from_slice(value);
        Ok(())
    }

    /// Copies `len` records starting at `offset` into a new batch.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let width = self.layout.line_width();
        Self {
            layout: Arc::clone(&self.layout),
            data: self.data[offset * width..(offset + len) * width].to_vec(),
        }
    }

    /// Keeps the records whose entry in `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Self {
        let kept = mask.iter().filter(|&&keep| keep).count();
        let mut data = Vec::with_capacity(kept * self.layout.line_width());
        for (record, &keep) in self.records().zip(mask) {
            if keep {
                data.extend_from_slice(record);
            }
        }
        Self {
            layout: Arc::clone(&self.layout),
            data,
        }
    }

    /// Concatenates batches of the same file layout, preserving order.
    pub fn concat(parts: &[Self]) -> Result<Self, TaqError> {
        let first = parts.first().ok_or_else(|| {
            TaqError::InvalidConfig("cannot concatenate zero batches".to_string())
        })?;
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.data.len()).sum());
        for part in parts {
            if part.layout.raw != first.layout.raw {
                return Err(TaqError::LayoutMismatch {
                    line_width: part.layout.line_width(),
                });
            }
            data.extend_from_slice(&part.data);
        }
        Ok(Self {
            layout: Arc::clone(&first.layout),
            data,
        })
    }

    /// The batch's lines exactly as they appear on disk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn range_of(&self, name: &str) -> Result<Range<usize>, TaqError> {
        self.layout
            .field_range(name)
            .ok_or_else(|| TaqError::UnknownField(name.to_string()))
    }
}
