//! COBOL PIC clauses.
//!
//! Supports the subset used by CardDemo record layouts: `9`, `X`, repeat
//! counts such as `9(11)`, an optional leading `S`, one implied decimal point
//! `V`, and a trailing usage of `DISPLAY`, `COMP` or `COMP-3`.

use crate::error::{PostingError, Result};
use crate::packed::{packed_len, unpack_packed};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

/// Digits a decimal can carry without loss.
const MAX_DIGITS: u32 = 28;

/// Storage format of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Display,
    Binary,
    Packed,
}

/// Data category described by the picture string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicCategory {
    Numeric {
        signed: bool,
        integer_digits: u32,
        fraction_digits: u32,
    },
    Alphanumeric {
        length: u32,
    },
}

/// A parsed PIC clause.
///
/// # Examples
///
/// ```
/// use carddemo_posting::pic::PicClause;
///
/// let pic: PicClause = "S9(9)V99 COMP-3".parse().unwrap();
/// assert_eq!(pic.digits(), 11);
/// assert_eq!(pic.scale(), 2);
/// assert_eq!(pic.storage_length(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicClause {
    category: PicCategory,
    usage: Usage,
}

impl PicClause {
    /// A signed display numeric, e.g. `S9(9)V99`.
    pub const fn signed_numeric(integer_digits: u32, fraction_digits: u32) -> Self {
        PicClause {
            category: PicCategory::Numeric {
                signed: true,
                integer_digits,
                fraction_digits,
            },
            usage: Usage::Display,
        }
    }

    pub fn category(&self) -> PicCategory {
        self.category
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.category, PicCategory::Numeric { .. })
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.category, PicCategory::Numeric { signed: true, .. })
    }

    /// Total digit (or character) positions.
    pub fn digits(&self) -> u32 {
        match self.category {
            PicCategory::Numeric {
                integer_digits,
                fraction_digits,
                ..
            } => integer_digits + fraction_digits,
            PicCategory::Alphanumeric { length } => length,
        }
    }

    /// Digits after the implied decimal point.
    pub fn scale(&self) -> u32 {
        match self.category {
            PicCategory::Numeric {
                fraction_digits, ..
            } => fraction_digits,
            PicCategory::Alphanumeric { .. } => 0,
        }
    }

    /// Bytes the field occupies in a record.
    pub fn storage_length(&self) -> usize {
        let digits = self.digits();
        match self.usage {
            Usage::Display => digits as usize,
            Usage::Packed => packed_len(digits),
            Usage::Binary => match digits {
                0..=4 => 2,
                5..=9 => 4,
                _ => 8,
            },
        }
    }

    /// Decodes display-format numeric text such as `00001234567` or `-123`.
    ///
    /// The implied decimal point is applied from the clause; text carries no
    /// explicit point.
    pub fn decode_display(&self, text: &str) -> Result<Decimal> {
        self.require_numeric()?;
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        if trimmed.len() != digits.len() && !self.is_signed() {
            return Err(PostingError::InvalidArgument(format!(
                "'{}' carries a sign but {} is unsigned",
                trimmed, self
            )));
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PostingError::InvalidArgument(format!(
                "'{}' is not display numeric",
                trimmed
            )));
        }
        if digits.len() > self.digits() as usize {
            return Err(PostingError::InvalidArgument(format!(
                "'{}' has more than {} digits",
                trimmed,
                self.digits()
            )));
        }

        let mut mantissa: i128 = digits
            .parse()
            .map_err(|e| PostingError::InvalidArgument(format!("'{}': {}", trimmed, e)))?;
        if negative {
            mantissa = -mantissa;
        }
        Decimal::try_from_i128_with_scale(mantissa, self.scale())
            .map_err(|e| PostingError::InvalidArgument(format!("'{}': {}", trimmed, e)))
    }

    /// Decodes a packed field laid out by this clause.
    pub fn decode_packed(&self, bytes: &[u8]) -> Result<Decimal> {
        self.require_numeric()?;
        let expected = packed_len(self.digits());
        if bytes.len() != expected {
            return Err(PostingError::InvalidArgument(format!(
                "{} expects {} packed bytes, got {}",
                self,
                expected,
                bytes.len()
            )));
        }
        unpack_packed(bytes, self.scale() as i32)
    }

    /// Renders `value` as zero-padded display digits with the implied point removed.
    ///
    /// Negative values get a leading `-` and are only accepted by signed clauses.
    pub fn encode_display(&self, value: Decimal) -> Result<String> {
        self.require_numeric()?;
        let mut scaled =
            value.round_dp_with_strategy(self.scale(), RoundingStrategy::MidpointAwayFromZero);
        scaled.rescale(self.scale());

        let mantissa = scaled.mantissa();
        if mantissa < 0 && !self.is_signed() {
            return Err(PostingError::InvalidArgument(format!(
                "{} is negative but {} is unsigned",
                value, self
            )));
        }
        let width = self.digits() as usize;
        let magnitude = mantissa.unsigned_abs().to_string();
        if magnitude.len() > width {
            return Err(PostingError::InvalidArgument(format!(
                "{} does not fit in {}",
                value, self
            )));
        }
        let sign = if mantissa < 0 { "-" } else { "" };
        Ok(format!("{}{:0>width$}", sign, magnitude, width = width))
    }

    fn require_numeric(&self) -> Result<()> {
        if self.is_numeric() {
            Ok(())
        } else {
            Err(PostingError::InvalidArgument(format!(
                "{} is not a numeric clause",
                self
            )))
        }
    }
}

impl FromStr for PicClause {
    type Err = PostingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let mut tokens = upper.split_whitespace().peekable();
        if matches!(tokens.peek(), Some(&"PIC") | Some(&"PICTURE")) {
            tokens.next();
        }

        let picture = tokens.next().ok_or_else(|| invalid(s, "empty clause"))?;
        let usage = match tokens.next() {
            None | Some("DISPLAY") => Usage::Display,
            Some("COMP-3") | Some("PACKED-DECIMAL") => Usage::Packed,
            Some("COMP") | Some("COMP-4") | Some("BINARY") => Usage::Binary,
            Some(other) => return Err(invalid(s, &format!("unknown usage {}", other))),
        };
        if let Some(extra) = tokens.next() {
            return Err(invalid(s, &format!("unexpected token {}", extra)));
        }

        let mut chars = picture.chars().peekable();
        let signed = chars.peek() == Some(&'S');
        if signed {
            chars.next();
        }

        let mut integer_digits = 0u32;
        let mut fraction_digits = 0u32;
        let mut alphanumeric = 0u32;
        let mut seen_point = false;

        while let Some(c) = chars.next() {
            match c {
                '9' => {
                    let count = repeat_count(&mut chars).map_err(|m| invalid(s, &m))?;
                    if seen_point {
                        fraction_digits += count;
                    } else {
                        integer_digits += count;
                    }
                }
                'X' => {
                    alphanumeric += repeat_count(&mut chars).map_err(|m| invalid(s, &m))?;
                }
                'V' if !seen_point => seen_point = true,
                'V' => return Err(invalid(s, "more than one V")),
                other => return Err(invalid(s, &format!("unsupported symbol '{}'", other))),
            }
        }

        let numeric_digits = integer_digits + fraction_digits;
        let category = if alphanumeric > 0 {
            if numeric_digits > 0 || signed || seen_point {
                return Err(invalid(s, "mixes alphanumeric and numeric symbols"));
            }
            if usage != Usage::Display {
                return Err(invalid(s, "alphanumeric fields must be DISPLAY"));
            }
            PicCategory::Alphanumeric {
                length: alphanumeric,
            }
        } else {
            if numeric_digits == 0 {
                return Err(invalid(s, "no digit positions"));
            }
            if numeric_digits > MAX_DIGITS {
                return Err(invalid(s, "too many digits"));
            }
            PicCategory::Numeric {
                signed,
                integer_digits,
                fraction_digits,
            }
        };

        Ok(PicClause { category, usage })
    }
}

impl fmt::Display for PicClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            PicCategory::Alphanumeric { length } => write!(f, "X({})", length)?,
            PicCategory::Numeric {
                signed,
                integer_digits,
                fraction_digits,
            } => {
                if signed {
                    write!(f, "S")?;
                }
                if integer_digits > 0 {
                    write!(f, "9({})", integer_digits)?;
                }
                if fraction_digits > 0 {
                    write!(f, "V9({})", fraction_digits)?;
                }
            }
        }
        match self.usage {
            Usage::Display => Ok(()),
            Usage::Packed => write!(f, " COMP-3"),
            Usage::Binary => write!(f, " COMP"),
        }
    }
}

/// Reads an optional `(n)` repeat count following a symbol.
fn repeat_count(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<u32, String> {
    if chars.peek() != Some(&'(') {
        return Ok(1);
    }
    chars.next();

    let mut count = String::new();
    for c in chars.by_ref() {
        if c == ')' {
            let n: u32 = count
                .parse()
                .map_err(|_| format!("bad repeat count '{}'", count))?;
            if n == 0 {
                return Err("repeat count must be positive".to_string());
            }
            return Ok(n);
        }
        count.push(c);
    }
    Err("unclosed repeat count".to_string())
}

fn invalid(clause: &str, message: &str) -> PostingError {
    PostingError::InvalidPicClause {
        clause: clause.trim().to_string(),
        message: message.to_string(),
    }
}
