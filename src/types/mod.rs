//! This module defines the strongly-typed field descriptions used throughout
//! the decoding pipeline.
//!
//! It currently includes `FieldKind`, which says how each fixed-width byte field
//! is interpreted, and `ComputedField` for output columns absent from the bytes.

pub mod field_kind;

// Re-export the main type(s) for easier access.
pub use field_kind::{ComputedField, FieldKind};
