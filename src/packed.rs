//! COMP-3 packed decimal conversion.
//!
//! A packed field stores two decimal digits per byte, most significant first,
//! with the final nibble holding the sign: `0xC` positive, `0xD` negative.
//! The decimal point is implied by the field's scale.

use crate::decimal::checked_scale;
use crate::error::{PostingError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Trailing sign nibble of a packed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub const POSITIVE_NIBBLE: u8 = 0x0C;
    pub const NEGATIVE_NIBBLE: u8 = 0x0D;

    /// Interprets a sign nibble.
    pub fn from_nibble(nibble: u8) -> Result<Self> {
        match nibble {
            Self::POSITIVE_NIBBLE => Ok(Sign::Positive),
            Self::NEGATIVE_NIBBLE => Ok(Sign::Negative),
            other => Err(PostingError::InvalidArgument(format!(
                "unrecognized packed sign nibble 0x{:X}",
                other
            ))),
        }
    }

    pub fn nibble(self) -> u8 {
        match self {
            Sign::Positive => Self::POSITIVE_NIBBLE,
            Sign::Negative => Self::NEGATIVE_NIBBLE,
        }
    }
}

/// Number of bytes a packed field of `digits` digits occupies.
pub fn packed_len(digits: u32) -> usize {
    digits as usize / 2 + 1
}

/// Decodes a packed decimal into a value with exactly `scale` fractional digits.
///
/// # Errors
///
/// `InvalidArgument` if the input is empty, the sign nibble is not `C`/`D`,
/// a digit nibble is above 9, the scale is negative or too large, or the
/// digits do not fit in a decimal.
///
/// # Examples
///
/// ```
/// use carddemo_posting::packed::unpack_packed;
///
/// let value = unpack_packed(&[0x12, 0x34, 0x5D], 2).unwrap();
/// assert_eq!(value.to_string(), "-123.45");
/// ```
pub fn unpack_packed(bytes: &[u8], scale: i32) -> Result<Decimal> {
    let scale = checked_scale(scale)?;
    let (&last, body) = bytes.split_last().ok_or_else(|| {
        PostingError::InvalidArgument("packed decimal input is empty".to_string())
    })?;
    let sign = Sign::from_nibble(last & 0x0F)?;

    let nibbles = body
        .iter()
        .flat_map(|&b| [b >> 4, b & 0x0F])
        .chain(std::iter::once(last >> 4));

    let mut mantissa: i128 = 0;
    for (pos, digit) in nibbles.enumerate() {
        if digit > 9 {
            return Err(PostingError::InvalidArgument(format!(
                "invalid digit nibble 0x{:X} at position {}",
                digit, pos
            )));
        }
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(digit)))
            .ok_or_else(|| {
                PostingError::InvalidArgument("packed decimal has too many digits".to_string())
            })?;
    }

    if sign == Sign::Negative {
        mantissa = -mantissa;
    }

    Decimal::try_from_i128_with_scale(mantissa, scale)
        .map_err(|e| PostingError::InvalidArgument(format!("packed decimal out of range: {}", e)))
}

/// Encodes `value` as a packed field of `digits` digits, `scale` of them fractional.
///
/// The value is rounded half up to `scale` first. Fails when the rounded value
/// needs more than `digits` digits.
pub fn pack_decimal(value: Decimal, digits: u32, scale: i32) -> Result<Vec<u8>> {
    let scale = checked_scale(scale)?;
    if digits == 0 || scale > digits {
        return Err(PostingError::InvalidArgument(format!(
            "cannot pack {} digits with scale {}",
            digits, scale
        )));
    }

    let mut scaled = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    scaled.rescale(scale);

    let mantissa = scaled.mantissa();
    let sign = if mantissa < 0 {
        Sign::Negative
    } else {
        Sign::Positive
    };
    let magnitude = mantissa.unsigned_abs().to_string();
    if magnitude.len() > digits as usize {
        return Err(PostingError::InvalidArgument(format!(
            "{} does not fit in {} packed digits",
            value, digits
        )));
    }

    let len = packed_len(digits);
    let digit_slots = len * 2 - 1;
    let mut nibbles: Vec<u8> = Vec::with_capacity(len * 2);
    nibbles.resize(digit_slots - magnitude.len(), 0);
    nibbles.extend(magnitude.bytes().map(|b| b - b'0'));
    nibbles.push(sign.nibble());

    Ok(nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}
