//! Implied-decimal price handling.
//!
//! Quote prices are written as integers with 4 implied decimals (`7.4` fixed
//! point), so `00001234500` is 123.45. The same scale is used by the 4-decimal
//! price fields of the tagged binary feed.

use super::ascii_int;

/// Divisor turning a raw fixed-point integer into a price.
pub const PRICE_SCALE: f64 = 10_000.0;

/// Converts a raw fixed-point integer to a floating-point price.
#[inline]
pub fn to_price(raw: i64) -> f64 {
    raw as f64 / PRICE_SCALE
}

/// Converts a price back to its raw fixed-point integer, rounding to the nearest tick.
#[inline]
pub fn from_price(price: f64) -> i64 {
    (price * PRICE_SCALE).round() as i64
}

/// Decodes an ASCII fixed-point price field. Returns `None` if the field is not decimal.
pub fn decode_field(field: &[u8]) -> Option<f64> {
    ascii_int::parse::<i64>(field).map(to_price)
}

/// Encodes a non-negative price as a zero-padded ASCII field of `width` bytes.
pub fn encode_field(price: f64, width: usize) -> Option<Vec<u8>> {
    let raw = from_price(price);
    if raw < 0 {
        return None;
    }
    ascii_int::format_padded(raw as u64, width)
}
