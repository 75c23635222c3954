//! Conversion of raw byte batches into typed Arrow `RecordBatch`es.
//!
//! Each target column is built in one pass over the batch. A row whose numeric
//! field fails to parse is marked invalid and removed from every column at the
//! end; blank numeric fields are zero and never invalidate a row.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, FixedSizeBinaryBuilder, Float64Array, Int32Array, Int64Array,
    Int8Array, UInt16Array,
};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use num_traits::PrimInt;

use super::header::ArchiveMetadata;
use super::raw_batch::RawRecordBatch;
use crate::error::TaqError;
use crate::kernels::{ascii_int, fixed_point};
use crate::layout::{RawField, TargetSource};
use crate::types::{ComputedField, FieldKind};

/// A typed batch plus the number of records dropped while building it.
#[derive(Debug)]
pub struct Converted {
    pub batch: RecordBatch,
    pub rows_skipped: usize,
}

/// Converts `raw` to the layout's target schema.
pub fn to_record_batch(
    raw: &RawRecordBatch,
    metadata: &ArchiveMetadata,
) -> Result<Converted, TaqError> {
    let layout = raw.layout();
    let mut valid = vec![true; raw.num_rows()];

    let columns = layout
        .target
        .fields
        .iter()
        .map(|target| match target.source {
            TargetSource::Computed(ComputedField::Time) => time_column(raw, metadata, &mut valid),
            TargetSource::Raw(idx) => raw_column(raw, &layout.raw.fields[idx], &mut valid),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let batch = RecordBatch::try_new(Arc::clone(&layout.target.arrow_schema), columns)?;
    let rows_skipped = valid.iter().filter(|&&ok| !ok).count();
    if rows_skipped == 0 {
        return Ok(Converted {
            batch,
            rows_skipped,
        });
    }

    log::warn!(
        "Dropping {} of {} records with unparseable numeric fields",
        rows_skipped,
        raw.num_rows()
    );
    let batch = filter_record_batch(&batch, &BooleanArray::from(valid))?;
    Ok(Converted {
        batch,
        rows_skipped,
    })
}

fn raw_column(
    raw: &RawRecordBatch,
    field: &RawField,
    valid: &mut [bool],
) -> Result<ArrayRef, TaqError> {
    let array: ArrayRef = match field.kind {
        FieldKind::PassThrough => {
            let mut builder = FixedSizeBinaryBuilder::with_capacity(raw.num_rows(), field.width as i32);
            for value in raw.column(&field.name)? {
                builder.append_value(value)?;
            }
            Arc::new(builder.finish())
        }
        FieldKind::Int8 => Arc::new(Int8Array::from(parse_column::<i8>(raw, field, valid)?)),
        FieldKind::UInt16 => Arc::new(UInt16Array::from(parse_column::<u16>(raw, field, valid)?)),
        FieldKind::Int32 => Arc::new(Int32Array::from(parse_column::<i32>(raw, field, valid)?)),
        FieldKind::Int64 => Arc::new(Int64Array::from(parse_column::<i64>(raw, field, valid)?)),
        FieldKind::Price => {
            let ticks = parse_column::<i64>(raw, field, valid)?;
            Arc::new(Float64Array::from_iter_values(
                ticks.into_iter().map(fixed_point::to_price),
            ))
        }
        FieldKind::Unmapped => {
            return Err(TaqError::UnknownField(format!(
                "'{}' has no output type",
                field.name
            )))
        }
    };
    Ok(array)
}

/// Parses one numeric field for every row; failures become zero and clear the
/// row's validity flag.
fn parse_column<T: PrimInt>(
    raw: &RawRecordBatch,
    field: &RawField,
    valid: &mut [bool],
) -> Result<Vec<T>, TaqError> {
    let values = raw
        .column(&field.name)?
        .zip(valid.iter_mut())
        .map(|(bytes, ok)| {
            ascii_int::parse::<T>(bytes).unwrap_or_else(|| {
                *ok = false;
                T::zero()
            })
        })
        .collect();
    Ok(values)
}

fn time_column(
    raw: &RawRecordBatch,
    metadata: &ArchiveMetadata,
    valid: &mut [bool],
) -> Result<ArrayRef, TaqError> {
    let schema = &raw.layout().raw;
    let part = |name: &str| {
        schema
            .field(name)
            .ok_or_else(|| TaqError::UnknownField(format!("Time requires the '{}' field", name)))
    };
    let hours = parse_column::<i64>(raw, part("hour")?, valid)?;
    let minutes = parse_column::<i64>(raw, part("minute")?, valid)?;
    let msecs = parse_column::<i64>(raw, part("msec")?, valid)?;

    let times = hours
        .iter()
        .zip(&minutes)
        .zip(&msecs)
        .map(|((&h, &m), &ms)| metadata.timestamp(h, m, ms));
    Ok(Arc::new(Float64Array::from_iter_values(times)))
}
