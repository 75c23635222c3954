//! This module defines the canonical, type-safe description of how a fixed-width
//! byte field is interpreted once a raw record is converted to a typed batch.

use arrow::datatypes::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The output interpretation of one field of a fixed-width record.
///
/// Every field is stored as ASCII bytes on disk. The kind decides whether the
/// bytes are parsed as a number, copied through as fixed-width text, or dropped
/// from the typed output altogether.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Copied verbatim as fixed-width text.
    PassThrough,
    Int8,
    UInt16,
    Int32,
    Int64,
    /// An integer with 4 implied decimals, decoded to `f64`.
    Price,
    /// Present in the byte layout but not part of the typed output.
    Unmapped,
}

impl FieldKind {
    /// Converts a `FieldKind` into the Arrow `DataType` of its output column.
    /// Returns `None` for fields that do not survive projection.
    pub fn to_arrow_type(&self, width: usize) -> Option<ArrowDataType> {
        match self {
            Self::PassThrough => Some(ArrowDataType::FixedSizeBinary(width as i32)),
            Self::Int8 => Some(ArrowDataType::Int8),
            Self::UInt16 => Some(ArrowDataType::UInt16),
            Self::Int32 => Some(ArrowDataType::Int32),
            Self::Int64 => Some(ArrowDataType::Int64),
            Self::Price => Some(ArrowDataType::Float64),
            Self::Unmapped => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Fields that do not exist in the byte layout and are computed during conversion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComputedField {
    /// Absolute POSIX timestamp in seconds, built from the header date and the
    /// record's hour, minute and millisecond-of-minute fields.
    Time,
}

impl ComputedField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Time => "Time",
        }
    }

    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::Time => ArrowDataType::Float64,
        }
    }
}
