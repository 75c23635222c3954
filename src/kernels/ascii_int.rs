//! This module contains the pure, stateless kernels for converting fixed-width
//! ASCII decimal fields to and from integers.
//!
//! Quote files store every numeric field as zero- or space-padded digits. The
//! decoder parses them column by column, and the writer side re-pads values when
//! records are regenerated. Both directions are panic-free.

use num_traits::PrimInt;

//==================================================================================
// 1. Parsing
//==================================================================================

/// Parses a fixed-width ASCII decimal field into an integer.
///
/// Leading and trailing spaces are ignored and a field made only of spaces
/// decodes as zero. A single leading `-` is accepted for signed targets.
/// Returns `None` for any other non-digit byte or on overflow of `T`.
pub fn parse<T>(field: &[u8]) -> Option<T>
where
    T: PrimInt,
{
    let digits = trim_spaces(field);
    if digits.is_empty() {
        return Some(T::zero());
    }

    let (negative, digits) = match digits.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, digits),
    };
    if digits.is_empty() || (negative && T::min_value() == T::zero()) {
        return None;
    }

    let ten = T::from(10)?;
    let mut value = T::zero();
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        let digit = T::from(byte - b'0')?;
        value = value.checked_mul(&ten)?;
        value = if negative {
            value.checked_sub(&digit)?
        } else {
            value.checked_add(&digit)?
        };
    }
    Some(value)
}

fn trim_spaces(field: &[u8]) -> &[u8] {
    let start = field.iter().position(|&b| b != b' ').unwrap_or(field.len());
    let end = field.iter().rposition(|&b| b != b' ').map_or(start, |i| i + 1);
    &field[start..end]
}

//==================================================================================
// 2. Formatting
//==================================================================================

/// Writes a non-negative integer as zero-padded ASCII digits of exactly `width`
/// bytes. Returns `None` if the value does not fit.
pub fn format_padded(value: u64, width: usize) -> Option<Vec<u8>> {
    let digits = value.to_string();
    if digits.len() > width {
        return None;
    }
    let mut out = Vec::with_capacity(width);
    out.resize(width - digits.len(), b'0');
    out.extend_from_slice(digits.as_bytes());
    Some(out)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
