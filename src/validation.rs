//! Declarative field format checks.
//!
//! Each [`FieldFormat`] describes one fixed-format record field: whether it is
//! required, its exact or maximum length, whether it is numeric-only, and the
//! closed set of values it may take.

use thiserror::Error;

/// A field that failed its format check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be {expected} characters, got {actual}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} must be at most {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be numeric, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} value '{value}' is not one of {allowed:?}")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

/// Format descriptor for a single field.
///
/// # Examples
///
/// ```
/// use carddemo_posting::validation::FieldFormat;
///
/// const STATUS: FieldFormat = FieldFormat::new("status").required().one_of(&["Y", "N"]);
/// assert!(STATUS.validate(Some("Y")).is_ok());
/// assert!(STATUS.validate(Some("X")).is_err());
/// assert!(STATUS.validate(None).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    pub name: &'static str,
    pub required: bool,
    pub exact_length: Option<usize>,
    pub max_length: Option<usize>,
    pub numeric: bool,
    pub allowed: Option<&'static [&'static str]>,
}

impl FieldFormat {
    /// An optional field with no constraints.
    pub const fn new(name: &'static str) -> Self {
        FieldFormat {
            name,
            required: false,
            exact_length: None,
            max_length: None,
            numeric: false,
            allowed: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn exact_length(mut self, len: usize) -> Self {
        self.exact_length = Some(len);
        self
    }

    pub const fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub const fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Checks `value` against this format.
    ///
    /// An absent or blank value passes unless the field is required. Checks run
    /// in order: required, exact length, max length, numeric, membership.
    pub fn validate(&self, value: Option<&str>) -> Result<(), ValidationError> {
        let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None if self.required => return Err(ValidationError::Missing { field: self.name }),
            None => return Ok(()),
        };

        let len = value.chars().count();
        if let Some(expected) = self.exact_length {
            if len != expected {
                return Err(ValidationError::Length {
                    field: self.name,
                    expected,
                    actual: len,
                });
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::TooLong {
                    field: self.name,
                    max,
                    actual: len,
                });
            }
        }
        if self.numeric && !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NotNumeric {
                field: self.name,
                value: value.to_string(),
            });
        }
        if let Some(allowed) = self.allowed {
            if !allowed.iter().any(|a| *a == value) {
                return Err(ValidationError::NotAllowed {
                    field: self.name,
                    value: value.to_string(),
                    allowed,
                });
            }
        }
        Ok(())
    }
}

/// `ACCT-ID PIC 9(11)`
pub const ACCOUNT_ID: FieldFormat = FieldFormat::new("account_id")
    .required()
    .exact_length(11)
    .numeric();

/// `XREF-CARD-NUM PIC X(16)`, digits only in practice.
pub const CARD_NUMBER: FieldFormat = FieldFormat::new("card_number")
    .required()
    .exact_length(16)
    .numeric();

/// `CUST-ID PIC 9(09)`
pub const CUSTOMER_ID: FieldFormat = FieldFormat::new("customer_id").exact_length(9).numeric();

pub const TRANSACTION_ID: FieldFormat = FieldFormat::new("transaction_id")
    .required()
    .max_length(16);

pub const TYPE_CODE: FieldFormat = FieldFormat::new("type_code").exact_length(2);

pub const CATEGORY_CODE: FieldFormat = FieldFormat::new("category_code")
    .exact_length(4)
    .numeric();

pub const ACTIVE_STATUS: FieldFormat = FieldFormat::new("active_status").one_of(&["Y", "N"]);

/// `YYYY-MM-DD`; calendar validity is checked when the date is parsed.
pub const DATE: FieldFormat = FieldFormat::new("date").exact_length(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_field_accepts_absent() {
        assert!(CUSTOMER_ID.validate(None).is_ok());
        assert!(CUSTOMER_ID.validate(Some("   ")).is_ok());
    }

    #[test]
    fn test_required_field_rejects_absent() {
        assert_eq!(
            ACCOUNT_ID.validate(None),
            Err(ValidationError::Missing { field: "account_id" })
        );
        assert!(ACCOUNT_ID.validate(Some("")).is_err());
    }

    #[test]
    fn test_exact_length() {
        assert!(CARD_NUMBER.validate(Some("4111111111111111")).is_ok());
        assert_eq!(
            CARD_NUMBER.validate(Some("411111111111")),
            Err(ValidationError::Length {
                field: "card_number",
                expected: 16,
                actual: 12
            })
        );
    }

    #[test]
    fn test_max_length() {
        assert!(TRANSACTION_ID.validate(Some("T1")).is_ok());
        assert!(matches!(
            TRANSACTION_ID.validate(Some("12345678901234567")),
            Err(ValidationError::TooLong { max: 16, .. })
        ));
    }

    #[test]
    fn test_numeric_only() {
        assert!(matches!(
            CARD_NUMBER.validate(Some("4111-1111-1111-1")),
            Err(ValidationError::NotNumeric { .. })
        ));
        assert!(CATEGORY_CODE.validate(Some("0001")).is_ok());
        assert!(CATEGORY_CODE.validate(Some("00A1")).is_err());
    }

    #[test]
    fn test_enum_membership() {
        assert!(ACTIVE_STATUS.validate(Some("N")).is_ok());
        assert!(matches!(
            ACTIVE_STATUS.validate(Some("maybe")),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_value_is_trimmed() {
        assert!(ACCOUNT_ID.validate(Some(" 00000000001 ")).is_ok());
    }
}
