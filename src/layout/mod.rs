// In: src/layout/mod.rs

//! Derives the byte-offset schema of a fixed-width quote file from its physical
//! line width.
//!
//! Different vintages of the quote format append fields at the end of the line,
//! so the layout is found by walking a field-width table until the running total
//! equals the line width minus the 2-byte terminator. The resulting
//! `RecordLayout` carries two distinct schemas:
//!
//! * `RawSchema`: every declared field as a fixed-width byte slice.
//! * `TargetSchema`: the typed output, computed fields first, then every raw
//!   field with an output type. Fields of kind `Unmapped` are always omitted,
//!   so older and newer files share one table.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};

use crate::error::TaqError;
use crate::types::{ComputedField, FieldKind};

//==================================================================================
// 1. Field-Width Table
//==================================================================================

/// Width of the `\r\n` line terminator present in every version of the format.
pub const TERMINATOR_WIDTH: usize = 2;

/// One entry of a field-width table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: &str, width: usize, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            width,
            kind,
        }
    }
}

/// The quote (BBO) record table, in on-disk order.
const BBO_TABLE: &[(&str, usize, FieldKind)] = &[
    // Time is HHMMSSmmm in exchange local time; seconds live inside `msec`.
    ("hour", 2, FieldKind::Int8),
    ("minute", 2, FieldKind::Int8),
    ("msec", 5, FieldKind::UInt16),
    ("Exchange", 1, FieldKind::PassThrough),
    ("Symbol_root", 6, FieldKind::PassThrough),
    ("Symbol_suffix", 10, FieldKind::PassThrough),
    ("Bid_Price", 11, FieldKind::Price),
    ("Bid_Size", 7, FieldKind::Int32),
    ("Ask_Price", 11, FieldKind::Price),
    ("Ask_Size", 7, FieldKind::Int32),
    ("Quote_Condition", 1, FieldKind::PassThrough),
    ("Market_Maker", 4, FieldKind::PassThrough),
    ("Bid_Exchange", 1, FieldKind::PassThrough),
    ("Ask_Exchange", 1, FieldKind::PassThrough),
    ("Sequence_Number", 16, FieldKind::Int64),
    // Indicator flags are categorical; they stay text.
    ("National_BBO_Ind", 1, FieldKind::PassThrough),
    ("NASDAQ_BBO_Ind", 1, FieldKind::PassThrough),
    ("Quote_Cancel_Correction", 1, FieldKind::PassThrough),
    ("Source_of_Quote", 1, FieldKind::PassThrough),
    ("Retail_Interest_Indicator_RPI", 1, FieldKind::PassThrough),
    ("Short_Sale_Restriction_Indicator", 1, FieldKind::PassThrough),
    ("LULD_BBO_Indicator_CQS", 1, FieldKind::PassThrough),
    ("LULD_BBO_Indicator_UTP", 1, FieldKind::PassThrough),
    ("FINRA_ADF_MPID_Indicator", 1, FieldKind::PassThrough),
    ("SIP_generated_Message_Identifier", 1, FieldKind::PassThrough),
    ("National_BBO_LULD_Indicator", 1, FieldKind::PassThrough),
];

/// Returns the built-in quote record table.
pub fn bbo_fields() -> Vec<FieldSpec> {
    BBO_TABLE
        .iter()
        .map(|&(name, width, kind)| FieldSpec::new(name, width, kind))
        .collect()
}

/// Physical line widths (terminator included) that the built-in table can describe.
pub fn supported_line_widths(table: &[FieldSpec]) -> Vec<usize> {
    table
        .iter()
        .scan(0, |total, spec| {
            *total += spec.width;
            Some(*total + TERMINATOR_WIDTH)
        })
        .collect()
}

//==================================================================================
// 2. Raw & Target Schemas
//==================================================================================

/// A declared field located inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
}

/// Every field present in the file, as fixed-width bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSchema {
    pub fields: Vec<RawField>,
    /// Bytes per physical line, terminator included.
    pub line_width: usize,
}

impl RawSchema {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&RawField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Where a typed output column gets its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Computed(ComputedField),
    /// Index into `RawSchema::fields`.
    Raw(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetField {
    pub name: String,
    pub source: TargetSource,
    pub data_type: DataType,
}

/// The typed output schema: computed prefix followed by the projected raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSchema {
    pub fields: Vec<TargetField>,
    pub arrow_schema: SchemaRef,
}

impl TargetSchema {
    /// Projects `raw` onto its typed output. Total over any raw schema: fields
    /// without an output type are left out rather than rejected.
    fn project(raw: &RawSchema, computed: &[ComputedField]) -> Self {
        let mut fields: Vec<TargetField> = computed
            .iter()
            .map(|c| TargetField {
                name: c.name().to_string(),
                source: TargetSource::Computed(*c),
                data_type: c.to_arrow_type(),
            })
            .collect();

        for (idx, raw_field) in raw.fields.iter().enumerate() {
            if let Some(data_type) = raw_field.kind.to_arrow_type(raw_field.width) {
                fields.push(TargetField {
                    name: raw_field.name.clone(),
                    source: TargetSource::Raw(idx),
                    data_type,
                });
            }
        }

        let arrow_schema = Arc::new(Schema::new(
            fields
                .iter()
                .map(|f| Field::new(&f.name, f.data_type.clone(), false))
                .collect::<Vec<_>>(),
        ));

        Self {
            fields,
            arrow_schema,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

//==================================================================================
// 3. RecordLayout
//==================================================================================

/// The byte layout of one file, shared read-only by every batch decoded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    pub raw: RawSchema,
    pub target: TargetSchema,
}

impl RecordLayout {
    /// Builds the layout for a detected physical line width.
    ///
    /// Walks `table` accumulating widths until the total equals
    /// `line_width - TERMINATOR_WIDTH`; fails with `LayoutMismatch` if no prefix
    /// of the table sums exactly.
    pub fn from_line_width(
        line_width: usize,
        table: &[FieldSpec],
        computed: &[ComputedField],
    ) -> Result<Self, TaqError> {
        let target_len = line_width
            .checked_sub(TERMINATOR_WIDTH)
            .filter(|&len| len > 0)
            .ok_or(TaqError::LayoutMismatch { line_width })?;

        let mut fields = Vec::new();
        let mut offset = 0;
        for spec in table {
            fields.push(RawField {
                name: spec.name.clone(),
                offset,
                width: spec.width,
                kind: spec.kind,
            });
            offset += spec.width;

            if offset == target_len {
                let raw = RawSchema { fields, line_width };
                let target = TargetSchema::project(&raw, computed);
                return Ok(Self { raw, target });
            }
            if offset > target_len {
                break;
            }
        }

        Err(TaqError::LayoutMismatch { line_width })
    }

    /// Layout from the built-in quote table.
    pub fn bbo(line_width: usize, computed: &[ComputedField]) -> Result<Self, TaqError> {
        Self::from_line_width(line_width, &bbo_fields(), computed)
    }

    #[inline]
    pub fn line_width(&self) -> usize {
        self.raw.line_width
    }

    /// Byte range of `name` within a record, if the field is present in this file.
    pub fn field_range(&self, name: &str) -> Option<std::ops::Range<usize>> {
        self.raw
            .field(name)
            .map(|f| f.offset..f.offset + f.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_width_layout() {
        let layout = RecordLayout::bbo(98, &[]).unwrap();
        assert_eq!(layout.raw.fields.len(), BBO_TABLE.len());
        assert_eq!(layout.line_width(), 98);
        assert_eq!(layout.field_range("Bid_Price"), Some(26..37));
        assert_eq!(layout.field_range("Sequence_Number"), Some(69..85));
    }

    #[test]
    fn test_shorter_vintage_drops_trailing_fields() {
        // Ends right after Sequence_Number.
        let layout = RecordLayout::bbo(87, &[]).unwrap();
        assert_eq!(layout.raw.fields.last().unwrap().name, "Sequence_Number");
        assert!(layout.field_range("National_BBO_Ind").is_none());
    }

    #[test]
    fn test_undecomposable_width_is_layout_mismatch() {
        for width in [0, 1, 2, 5, 99, 200] {
            let err = RecordLayout::bbo(width, &[]).unwrap_err();
            assert!(matches!(err, TaqError::LayoutMismatch { line_width } if line_width == width));
        }
    }

    #[test]
    fn test_supported_widths_all_decompose() {
        let table = bbo_fields();
        for width in supported_line_widths(&table) {
            assert!(RecordLayout::from_line_width(width, &table, &[]).is_ok());
        }
    }

    #[test]
    fn test_target_schema_has_computed_prefix() {
        let layout = RecordLayout::bbo(98, &[ComputedField::Time]).unwrap();
        let names: Vec<&str> = layout.target.names().collect();
        assert_eq!(names[0], "Time");
        assert_eq!(names[1], "hour");
        assert_eq!(layout.target.arrow_schema.field(0).data_type(), &DataType::Float64);
        let bid = layout.target.arrow_schema.field_with_name("Bid_Size").unwrap();
        assert_eq!(bid.data_type(), &DataType::Int32);
    }

    #[test]
    fn test_unmapped_fields_are_projected_out() {
        let table = vec![
            FieldSpec::new("hour", 2, FieldKind::Int8),
            FieldSpec::new("legacy_filler", 3, FieldKind::Unmapped),
            FieldSpec::new("Exchange", 1, FieldKind::PassThrough),
        ];
        let layout = RecordLayout::from_line_width(8, &table, &[]).unwrap();
        assert_eq!(layout.raw.fields.len(), 3);
        let names: Vec<&str> = layout.target.names().collect();
        assert_eq!(names, vec!["hour", "Exchange"]);
        assert_eq!(layout.target.fields[1].source, TargetSource::Raw(2));
    }
}
