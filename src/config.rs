//! Engine configuration.

use crate::account::CycleEntry;
use crate::decimal::DecimalPolicy;
use crate::error::{PostingError, Result};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Environment variable listing credit type codes, comma separated.
pub const CREDIT_TYPE_CODES_ENV: &str = "CARDDEMO_CREDIT_TYPE_CODES";

/// Environment variable selecting the credit limit rule (`debit` or `net`).
pub const LIMIT_RULE_ENV: &str = "CARDDEMO_LIMIT_RULE";

/// How a transaction is measured against the credit limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreditLimitRule {
    /// `cycle debit + amount <= limit`
    #[default]
    CycleDebit,

    /// `cycle debit - cycle credit + amount <= limit`
    NetCycle,
}

impl FromStr for CreditLimitRule {
    type Err = PostingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debit" | "cycle-debit" => Ok(CreditLimitRule::CycleDebit),
            "net" | "net-cycle" => Ok(CreditLimitRule::NetCycle),
            other => Err(PostingError::InvalidArgument(format!(
                "unknown credit limit rule '{}'",
                other
            ))),
        }
    }
}

/// Decides whether a posted amount counts as a cycle debit or credit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleConvention {
    /// Non-negative amounts are debits; negative amounts are credits.
    #[default]
    BySign,

    /// Listed transaction type codes are credits; everything else is a debit.
    ByTypeCode(Vec<String>),
}

impl CycleConvention {
    /// Classifies a transaction amount.
    pub fn entry(&self, type_code: Option<&str>, amount: Decimal) -> CycleEntry {
        match self {
            CycleConvention::BySign if amount.is_sign_negative() && !amount.is_zero() => {
                CycleEntry::Credit(-amount)
            }
            CycleConvention::BySign => CycleEntry::Debit(amount),
            CycleConvention::ByTypeCode(codes) => {
                let is_credit = type_code
                    .map(str::trim)
                    .map_or(false, |code| codes.iter().any(|c| c == code));
                if is_credit {
                    CycleEntry::Credit(amount.abs())
                } else {
                    CycleEntry::Debit(amount)
                }
            }
        }
    }
}

/// Settings threaded through the posting engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub decimal: DecimalPolicy,
    pub cycle: CycleConvention,
    pub limit: CreditLimitRule,
}

impl EngineConfig {
    /// Default configuration with overrides from the environment.
    ///
    /// `CARDDEMO_CREDIT_TYPE_CODES=02,05` switches to [`CycleConvention::ByTypeCode`];
    /// `CARDDEMO_LIMIT_RULE=net` switches to [`CreditLimitRule::NetCycle`].
    /// An unknown limit rule is logged and the default kept.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();
        if let Ok(codes) = env::var(CREDIT_TYPE_CODES_ENV) {
            config.cycle = parse_credit_codes(&codes);
        }
        if let Ok(rule) = env::var(LIMIT_RULE_ENV) {
            match rule.parse() {
                Ok(rule) => config.limit = rule,
                Err(e) => warn!("{}: {}", LIMIT_RULE_ENV, e),
            }
        }
        debug!("Engine configuration: {:?}", config);
        config
    }
}

/// Parses a comma-separated code list; an empty list keeps the sign convention.
pub fn parse_credit_codes(codes: &str) -> CycleConvention {
    let codes: Vec<String> = codes
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if codes.is_empty() {
        CycleConvention::BySign
    } else {
        CycleConvention::ByTypeCode(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_by_sign() {
        let convention = CycleConvention::BySign;
        assert_eq!(
            convention.entry(Some("01"), dec("25.00")),
            CycleEntry::Debit(dec("25.00"))
        );
        assert_eq!(
            convention.entry(Some("01"), dec("-25.00")),
            CycleEntry::Credit(dec("25.00"))
        );
        assert_eq!(
            convention.entry(None, dec("0.00")),
            CycleEntry::Debit(dec("0.00"))
        );
    }

    #[test]
    fn test_by_type_code() {
        let convention = parse_credit_codes(" 02, 05 ,");
        assert_eq!(
            convention,
            CycleConvention::ByTypeCode(vec!["02".to_string(), "05".to_string()])
        );
        assert_eq!(
            convention.entry(Some("02"), dec("-40.00")),
            CycleEntry::Credit(dec("40.00"))
        );
        assert_eq!(
            convention.entry(Some("01"), dec("40.00")),
            CycleEntry::Debit(dec("40.00"))
        );
        assert_eq!(
            convention.entry(None, dec("40.00")),
            CycleEntry::Debit(dec("40.00"))
        );
    }

    #[test]
    fn test_limit_rule_from_str() {
        assert_eq!("net".parse::<CreditLimitRule>().unwrap(), CreditLimitRule::NetCycle);
        assert_eq!(" Debit ".parse::<CreditLimitRule>().unwrap(), CreditLimitRule::CycleDebit);
        assert!("gross".parse::<CreditLimitRule>().is_err());
        assert_eq!(EngineConfig::default().limit, CreditLimitRule::CycleDebit);
    }

    #[test]
    fn test_empty_code_list_keeps_sign_convention() {
        assert_eq!(parse_credit_codes(""), CycleConvention::BySign);
        assert_eq!(parse_credit_codes(" , "), CycleConvention::BySign);
    }
}
