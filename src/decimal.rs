//! Fixed-scale decimal policy.
//!
//! Mainframe money fields are packed decimals with an implied scale, and every
//! arithmetic step rounds back to that scale. [`DecimalPolicy`] carries the
//! scale and rounding mode explicitly so that every conversion and every
//! balance update goes through the same rules.

use crate::error::{PostingError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Largest scale a `rust_decimal::Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Scale and rounding applied at every decimal boundary.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use carddemo_posting::DecimalPolicy;
/// use rust_decimal::Decimal;
///
/// let policy = DecimalPolicy::default();
/// let value = Decimal::from_str("100.005").unwrap();
/// assert_eq!(policy.preserve_precision(Some(value)).to_string(), "100.01");
/// assert_eq!(policy.preserve_precision(None).to_string(), "0.00");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DecimalPolicy {
    scale: u32,
    rounding: RoundingStrategy,
}

impl DecimalPolicy {
    /// Scale used by CardDemo money fields (`PIC S9(n)V99`).
    pub const MONEY_SCALE: u32 = 2;

    /// Creates a policy, rejecting scales a decimal cannot represent.
    pub fn new(scale: i32, rounding: RoundingStrategy) -> Result<Self> {
        let scale = checked_scale(scale)?;
        Ok(DecimalPolicy { scale, rounding })
    }

    /// Creates a round-half-up policy at the given scale.
    pub fn half_up(scale: i32) -> Result<Self> {
        Self::new(scale, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Zero carrying the policy scale.
    pub fn zero(&self) -> Decimal {
        Decimal::new(0, self.scale)
    }

    /// Rounds and pads `value` to exactly the policy scale.
    pub fn rescale(&self, value: Decimal) -> Decimal {
        let mut rounded = value.round_dp_with_strategy(self.scale, self.rounding);
        rounded.rescale(self.scale);
        rounded
    }

    /// Rescales an optional value, treating an absent value as zero.
    pub fn preserve_precision(&self, value: Option<Decimal>) -> Decimal {
        match value {
            Some(v) => self.rescale(v),
            None => self.zero(),
        }
    }

    /// Rescales `value`, failing when it is too large to carry the policy scale.
    pub fn checked_rescale(&self, value: Decimal) -> Result<Decimal> {
        let rescaled = self.rescale(value);
        if rescaled.scale() != self.scale {
            return Err(PostingError::InvalidArgument(format!(
                "{} cannot carry {} decimal places",
                value, self.scale
            )));
        }
        Ok(rescaled)
    }

    pub fn add(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        let sum = a.checked_add(b).ok_or_else(|| {
            PostingError::InvalidArgument(format!("{} + {} overflows", a, b))
        })?;
        self.checked_rescale(sum)
    }

    pub fn sub(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        let difference = a.checked_sub(b).ok_or_else(|| {
            PostingError::InvalidArgument(format!("{} - {} overflows", a, b))
        })?;
        self.checked_rescale(difference)
    }

    /// Divides and rounds to the policy scale.
    pub fn div(&self, dividend: Decimal, divisor: Decimal) -> Result<Decimal> {
        let quotient = dividend.checked_div(divisor).ok_or_else(|| {
            PostingError::InvalidArgument(format!("cannot divide {} by {}", dividend, divisor))
        })?;
        self.checked_rescale(quotient)
    }

    /// Parses decimal text and rescales it to the policy scale.
    pub fn parse(&self, text: &str) -> Result<Decimal> {
        let trimmed = text.trim();
        let value = Decimal::from_str(trimmed).map_err(|e| {
            PostingError::InvalidArgument(format!("'{}' is not a decimal: {}", trimmed, e))
        })?;
        self.checked_rescale(value)
    }

    /// Renders `value` at the policy scale.
    ///
    /// Negative values put the sign ahead of the currency symbol, e.g.
    /// `-$1,234.50`.
    pub fn format_display(&self, value: Decimal, format: &DisplayFormat) -> String {
        let value = self.rescale(value);
        let negative = value.is_sign_negative() && !value.is_zero();
        let text = value.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (text.as_str(), None),
        };

        let mut out = String::with_capacity(text.len() + 8);
        if negative {
            out.push('-');
        }
        if let Some(symbol) = &format.currency_symbol {
            out.push_str(symbol);
        }
        match format.thousands_separator {
            Some(sep) => out.push_str(&group_thousands(int_part, sep)),
            None => out.push_str(int_part),
        }
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

impl Default for DecimalPolicy {
    /// Two decimal places, round half up.
    fn default() -> Self {
        DecimalPolicy {
            scale: Self::MONEY_SCALE,
            rounding: RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Options for [`DecimalPolicy::format_display`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFormat {
    pub currency_symbol: Option<String>,
    pub thousands_separator: Option<char>,
}

impl DisplayFormat {
    /// Digits and decimal point only.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Currency symbol prefix with comma grouping.
    pub fn currency(symbol: &str) -> Self {
        DisplayFormat {
            currency_symbol: Some(symbol.to_string()),
            thousands_separator: Some(','),
        }
    }
}

/// Validates a caller-supplied scale.
pub(crate) fn checked_scale(scale: i32) -> Result<u32> {
    if scale < 0 {
        return Err(PostingError::InvalidArgument(format!(
            "scale must not be negative, got {}",
            scale
        )));
    }
    let scale = scale as u32;
    if scale > MAX_SCALE {
        return Err(PostingError::InvalidArgument(format!(
            "scale {} exceeds the maximum of {}",
            scale, MAX_SCALE
        )));
    }
    Ok(scale)
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_preserve_precision_rounds_half_up() {
        let policy = DecimalPolicy::default();
        assert_eq!(policy.preserve_precision(Some(dec("100.005"))).to_string(), "100.01");
        assert_eq!(policy.preserve_precision(Some(dec("100.004"))).to_string(), "100.00");
        assert_eq!(policy.preserve_precision(Some(dec("-100.005"))).to_string(), "-100.01");
    }

    #[test]
    fn test_preserve_precision_pads_scale() {
        let policy = DecimalPolicy::default();
        let value = policy.preserve_precision(Some(dec("7")));
        assert_eq!(value.scale(), 2);
        assert_eq!(value.to_string(), "7.00");
    }

    #[test]
    fn test_preserve_precision_absent_is_zero() {
        let policy = DecimalPolicy::half_up(4).unwrap();
        let zero = policy.preserve_precision(None);
        assert!(zero.is_zero());
        assert_eq!(zero.scale(), 4);
        assert_eq!(zero.to_string(), "0.0000");
    }

    #[test]
    fn test_preserve_precision_is_idempotent() {
        let policy = DecimalPolicy::default();
        for text in ["0.125", "-3.335", "99999.999", "12"] {
            let once = policy.preserve_precision(Some(dec(text)));
            let twice = policy.preserve_precision(Some(once));
            assert_eq!(once, twice);
            assert_eq!(once.scale(), twice.scale());
        }
    }

    #[test]
    fn test_negative_scale_is_rejected() {
        assert!(matches!(
            DecimalPolicy::half_up(-1),
            Err(PostingError::InvalidArgument(_))
        ));
        assert!(DecimalPolicy::half_up(29).is_err());
    }

    #[test]
    fn test_arithmetic_keeps_policy_scale() {
        let policy = DecimalPolicy::default();
        assert_eq!(policy.add(dec("1.5"), dec("2.25")).unwrap().to_string(), "3.75");
        assert_eq!(policy.sub(dec("1"), dec("2.5")).unwrap().to_string(), "-1.50");
        assert_eq!(policy.div(dec("10"), dec("3")).unwrap().to_string(), "3.33");
        assert_eq!(policy.div(dec("2"), dec("3")).unwrap().to_string(), "0.67");
    }

    #[test]
    fn test_overflow_is_invalid_argument() {
        let policy = DecimalPolicy::default();
        assert!(matches!(
            policy.add(Decimal::MAX, dec("1")),
            Err(PostingError::InvalidArgument(_))
        ));
        assert!(matches!(
            policy.sub(Decimal::MIN, dec("1")),
            Err(PostingError::InvalidArgument(_))
        ));
        // fits a decimal, but not with two decimal places
        assert!(policy.parse("79228162514264337593543950335").is_err());
        assert!(policy.checked_rescale(Decimal::MAX).is_err());
        assert_eq!(policy.checked_rescale(dec("1.005")).unwrap().to_string(), "1.01");
    }

    #[test]
    fn test_divide_by_zero_is_invalid_argument() {
        let policy = DecimalPolicy::default();
        assert!(matches!(
            policy.div(dec("1"), Decimal::ZERO),
            Err(PostingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_rescales() {
        let policy = DecimalPolicy::default();
        assert_eq!(policy.parse(" 12.5 ").unwrap().to_string(), "12.50");
        assert!(policy.parse("12,50").is_err());
    }

    #[test]
    fn test_format_display() {
        let policy = DecimalPolicy::default();
        let value = dec("1234567.891");

        assert_eq!(policy.format_display(value, &DisplayFormat::plain()), "1234567.89");
        assert_eq!(
            policy.format_display(value, &DisplayFormat::currency("$")),
            "$1,234,567.89"
        );
        assert_eq!(
            policy.format_display(dec("-1234.5"), &DisplayFormat::currency("$")),
            "-$1,234.50"
        );
        assert_eq!(
            policy.format_display(dec("-0.001"), &DisplayFormat::currency("$")),
            "$0.00"
        );
        assert_eq!(policy.format_display(dec("999"), &DisplayFormat::currency("$")), "$999.00");
    }
}
