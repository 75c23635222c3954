//! `ChunkBatch` for the two batch types the decoder produces.
//!
//! Keys are compared as bytes in both cases: the raw field bytes for
//! `RawRecordBatch`, and Arrow's row-format encoding for `RecordBatch`.

use std::ops::Range;

use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute::kernels::partition::partition;
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};

use super::ChunkBatch;
use crate::decoder::RawRecordBatch;
use crate::error::TaqError;

//==================================================================================
// 1. Arrow RecordBatch
//==================================================================================

fn key_arrays(batch: &RecordBatch, key_columns: &[String]) -> Result<Vec<ArrayRef>, TaqError> {
    key_columns
        .iter()
        .map(|name| {
            batch
                .column_by_name(name)
                .cloned()
                .ok_or_else(|| TaqError::UnknownField(name.clone()))
        })
        .collect()
}

impl ChunkBatch for RecordBatch {
    type Key = Vec<u8>;

    fn num_rows(&self) -> usize {
        RecordBatch::num_rows(self)
    }

    fn run_ranges(&self, key_columns: &[String]) -> Result<Vec<Range<usize>>, TaqError> {
        let rows = RecordBatch::num_rows(self);
        let columns = key_arrays(self, key_columns)?;
        if rows == 0 {
            return Ok(Vec::new());
        }
        if columns.is_empty() {
            return Ok(vec![0..rows]);
        }
        Ok(partition(&columns)?.ranges())
    }

    fn first_key(&self, key_columns: &[String]) -> Result<Vec<u8>, TaqError> {
        let columns: Vec<ArrayRef> = key_arrays(self, key_columns)?
            .iter()
            .map(|c| c.slice(0, 1))
            .collect();
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let converter = RowConverter::new(
            columns
                .iter()
                .map(|c| SortField::new(c.data_type().clone()))
                .collect(),
        )?;
        let rows = converter.convert_columns(&columns)?;
        Ok(rows.row(0).as_ref().to_vec())
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        RecordBatch::slice(self, offset, len)
    }

    fn filter_rows(&self, mask: &[bool]) -> Result<Self, TaqError> {
        Ok(filter_record_batch(self, &BooleanArray::from(mask.to_vec()))?)
    }

    fn concat(parts: &[Self]) -> Result<Self, TaqError> {
        let first = parts.first().ok_or_else(|| {
            TaqError::InvalidConfig("cannot concatenate zero batches".to_string())
        })?;
        Ok(concat_batches(&first.schema(), parts)?)
    }
}

//==================================================================================
// 2. RawRecordBatch
//==================================================================================

fn key_ranges(batch: &RawRecordBatch, key_columns: &[String]) -> Result<Vec<Range<usize>>, TaqError> {
    key_columns
        .iter()
        .map(|name| {
            batch
                .layout()
                .field_range(name)
                .ok_or_else(|| TaqError::UnknownField(name.clone()))
        })
        .collect()
}

impl ChunkBatch for RawRecordBatch {
    type Key = Vec<u8>;

    fn num_rows(&self) -> usize {
        RawRecordBatch::num_rows(self)
    }

    fn run_ranges(&self, key_columns: &[String]) -> Result<Vec<Range<usize>>, TaqError> {
        let fields = key_ranges(self, key_columns)?;
        let same_key = |a: &[u8], b: &[u8]| fields.iter().all(|f| a[f.clone()] == b[f.clone()]);

        let mut runs = Vec::new();
        let mut start = 0;
        let rows = RawRecordBatch::num_rows(self);
        for row in 1..rows {
            if !same_key(self.record(row - 1), self.record(row)) {
                runs.push(start..row);
                start = row;
            }
        }
        if rows > 0 {
            runs.push(start..rows);
        }
        Ok(runs)
    }

    fn first_key(&self, key_columns: &[String]) -> Result<Vec<u8>, TaqError> {
        let record = self.record(0);
        Ok(key_ranges(self, key_columns)?
            .into_iter()
            .flat_map(|f| record[f].iter().copied())
            .collect())
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        RawRecordBatch::slice(self, offset, len)
    }

    fn filter_rows(&self, mask: &[bool]) -> Result<Self, TaqError> {
        Ok(self.filter(mask))
    }

    fn concat(parts: &[Self]) -> Result<Self, TaqError> {
        RawRecordBatch::concat(parts)
    }
}
