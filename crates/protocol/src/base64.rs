//! Compact base-64 integers used by the encoded stat block.
//!
//! This is not RFC 4648: an integer is written as its magnitude in radix 64,
//! most significant digit first, with no padding and a leading `-` for
//! negative values. Zero is the single digit `A`.

use crate::error::ProtocolError;

const DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Appends the encoding of `value` to `out`.
pub fn encode_i64(value: i64, out: &mut String) {
    if value < 0 {
        out.push('-');
    }
    let mut magnitude = value.unsigned_abs();
    let mut scratch = [0u8; 11];
    let mut index = scratch.len();
    loop {
        index -= 1;
        scratch[index] = DIGITS[(magnitude & 0x3f) as usize];
        magnitude >>= 6;
        if magnitude == 0 {
            break;
        }
    }
    for &digit in &scratch[index..] {
        out.push(char::from(digit));
    }
}

/// Encodes `value` into a new string.
#[must_use]
pub fn to_base64(value: i64) -> String {
    let mut out = String::new();
    encode_i64(value, &mut out);
    out
}

fn digit_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(u64::from(value))
}

/// Decodes one integer from a field that has already been split on spaces.
///
/// An empty field decodes to zero. Magnitudes beyond 64 bits wrap, as the
/// format has no overflow marker.
pub fn decode_i64(field: &[u8]) -> Result<i64, ProtocolError> {
    let (negative, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    let mut magnitude: u64 = 0;
    for &byte in digits {
        let value = digit_value(byte).ok_or(ProtocolError::InvalidBase64Digit(byte))?;
        magnitude = (magnitude << 6).wrapping_add(value);
    }
    let value = magnitude as i64;
    Ok(if negative { value.wrapping_neg() } else { value })
}
