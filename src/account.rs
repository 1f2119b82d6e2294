//! Account and card cross-reference records.

use crate::config::CreditLimitRule;
use crate::decimal::DecimalPolicy;
use crate::error::Result;
use crate::pic::PicClause;
use crate::timestamp::parse_date;
use crate::validation;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

/// `ACCT-CURR-BAL PIC S9(10)V99`, shared by every account money field.
pub const BALANCE_PIC: PicClause = PicClause::signed_numeric(10, 2);

/// Movement applied to an account's cycle totals by a posted transaction.
///
/// Both variants carry the amount to add to the respective cycle total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEntry {
    /// Adds to cycle debit and current balance.
    Debit(Decimal),
    /// Adds to cycle credit and subtracts from current balance.
    Credit(Decimal),
}

/// In-memory account master record.
///
/// # Invariants
///
/// - Monetary fields carry exactly the policy scale once the record has been
///   added to an engine (see [`AccountRecord::normalize`]).
/// - An account without an expiration date never expires.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    /// 11-digit account number.
    pub account_id: String,

    pub active: bool,

    pub current_balance: Decimal,

    pub credit_limit: Decimal,

    pub current_cycle_credit: Decimal,

    pub current_cycle_debit: Decimal,

    pub expiration_date: Option<NaiveDate>,
}

impl AccountRecord {
    /// Creates an active account with zero balances and no expiration date.
    pub fn new(account_id: impl Into<String>, policy: &DecimalPolicy) -> Self {
        AccountRecord {
            account_id: account_id.into(),
            active: true,
            current_balance: policy.zero(),
            credit_limit: policy.zero(),
            current_cycle_credit: policy.zero(),
            current_cycle_debit: policy.zero(),
            expiration_date: None,
        }
    }

    /// Rescales every monetary field to the policy scale.
    pub fn normalize(&mut self, policy: &DecimalPolicy) {
        self.current_balance = policy.rescale(self.current_balance);
        self.credit_limit = policy.rescale(self.credit_limit);
        self.current_cycle_credit = policy.rescale(self.current_cycle_credit);
        self.current_cycle_debit = policy.rescale(self.current_cycle_debit);
    }

    /// Net spend in the current cycle: `debit - credit`.
    pub fn cycle_net(&self, policy: &DecimalPolicy) -> Result<Decimal> {
        policy.sub(self.current_cycle_debit, self.current_cycle_credit)
    }

    /// Amount already counted against the credit limit under `rule`.
    pub fn exposure(&self, rule: CreditLimitRule, policy: &DecimalPolicy) -> Result<Decimal> {
        match rule {
            CreditLimitRule::CycleDebit => Ok(self.current_cycle_debit),
            CreditLimitRule::NetCycle => self.cycle_net(policy),
        }
    }

    /// Remaining credit: `limit - exposure`.
    pub fn available_credit(
        &self,
        rule: CreditLimitRule,
        policy: &DecimalPolicy,
    ) -> Result<Decimal> {
        policy.sub(self.credit_limit, self.exposure(rule, policy)?)
    }

    /// Returns `true` if posting `amount` would take the exposure above the
    /// credit limit. Landing exactly on the limit is allowed; an exposure too
    /// large to compute counts as over the limit.
    pub fn would_exceed_limit(
        &self,
        amount: Decimal,
        rule: CreditLimitRule,
        policy: &DecimalPolicy,
    ) -> bool {
        match self.available_credit(rule, policy) {
            Ok(available) => amount > available,
            Err(_) => true,
        }
    }

    /// Returns `true` if `date` is strictly after the expiration date.
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiration_date.map_or(false, |exp| date > exp)
    }

    /// Applies a posted amount to the cycle totals and current balance.
    ///
    /// On overflow the account is left unchanged.
    pub fn apply(&mut self, entry: CycleEntry, policy: &DecimalPolicy) -> Result<()> {
        match entry {
            CycleEntry::Debit(amount) => {
                let debit = policy.add(self.current_cycle_debit, amount)?;
                let balance = policy.add(self.current_balance, amount)?;
                self.current_cycle_debit = debit;
                self.current_balance = balance;
            }
            CycleEntry::Credit(amount) => {
                let credit = policy.add(self.current_cycle_credit, amount)?;
                let balance = policy.sub(self.current_balance, amount)?;
                self.current_cycle_credit = credit;
                self.current_balance = balance;
            }
        }
        Ok(())
    }
}

/// Raw account row as read from CSV.
#[derive(Debug, Deserialize)]
pub struct AccountRow {
    pub account_id: String,
    pub active_status: Option<String>,
    pub current_balance: Option<String>,
    pub credit_limit: Option<String>,
    pub current_cycle_credit: Option<String>,
    pub current_cycle_debit: Option<String>,
    pub expiration_date: Option<String>,
}

impl AccountRow {
    /// Validates the row and converts it into an [`AccountRecord`].
    ///
    /// Missing monetary fields load as zero; present ones must fit
    /// [`BALANCE_PIC`].
    pub fn parse(&self, policy: &DecimalPolicy) -> Result<AccountRecord> {
        validation::ACCOUNT_ID.validate(Some(&self.account_id))?;
        validation::ACTIVE_STATUS.validate(self.active_status.as_deref())?;
        validation::DATE.validate(self.expiration_date.as_deref())?;

        let money = |field: &Option<String>| -> Result<Decimal> {
            match non_blank(field) {
                Some(text) => {
                    let value = policy.parse(text)?;
                    BALANCE_PIC.encode_display(value)?;
                    Ok(value)
                }
                None => Ok(policy.zero()),
            }
        };

        Ok(AccountRecord {
            account_id: self.account_id.trim().to_string(),
            active: non_blank(&self.active_status) != Some("N"),
            current_balance: money(&self.current_balance)?,
            credit_limit: money(&self.credit_limit)?,
            current_cycle_credit: money(&self.current_cycle_credit)?,
            current_cycle_debit: money(&self.current_cycle_debit)?,
            expiration_date: non_blank(&self.expiration_date)
                .map(parse_date)
                .transpose()?,
        })
    }
}

/// Maps a card number to its owning account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferenceRecord {
    /// 16-digit card number.
    pub card_number: String,
    pub customer_id: Option<String>,
    pub account_id: String,
}

impl CrossReferenceRecord {
    pub fn new(card_number: impl Into<String>, account_id: impl Into<String>) -> Self {
        CrossReferenceRecord {
            card_number: card_number.into(),
            customer_id: None,
            account_id: account_id.into(),
        }
    }
}

/// Raw cross-reference row as read from CSV.
#[derive(Debug, Deserialize)]
pub struct CrossReferenceRow {
    pub card_number: String,
    pub customer_id: Option<String>,
    pub account_id: String,
}

impl CrossReferenceRow {
    pub fn parse(&self) -> Result<CrossReferenceRecord> {
        validation::CARD_NUMBER.validate(Some(&self.card_number))?;
        validation::CUSTOMER_ID.validate(self.customer_id.as_deref())?;
        validation::ACCOUNT_ID.validate(Some(&self.account_id))?;

        Ok(CrossReferenceRecord {
            card_number: self.card_number.trim().to_string(),
            customer_id: non_blank(&self.customer_id).map(str::to_string),
            account_id: self.account_id.trim().to_string(),
        })
    }
}

pub(crate) fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn account(limit: &str, credit: &str, debit: &str) -> AccountRecord {
        let policy = DecimalPolicy::default();
        let mut account = AccountRecord::new("00000000001", &policy);
        account.credit_limit = dec(limit);
        account.current_cycle_credit = dec(credit);
        account.current_cycle_debit = dec(debit);
        account.normalize(&policy);
        account
    }

    #[test]
    fn test_new_account_has_zero_balances() {
        let account = AccountRecord::new("00000000001", &DecimalPolicy::default());
        assert!(account.active);
        assert_eq!(account.current_balance.to_string(), "0.00");
        assert_eq!(account.credit_limit.to_string(), "0.00");
        assert!(account.expiration_date.is_none());
    }

    #[test]
    fn test_credit_limit_boundary_cycle_debit() {
        let policy = DecimalPolicy::default();
        let rule = CreditLimitRule::CycleDebit;
        let account = account("1000.00", "500.00", "800.00");

        assert_eq!(account.available_credit(rule, &policy).unwrap().to_string(), "200.00");
        assert!(!account.would_exceed_limit(dec("200.00"), rule, &policy));
        assert!(account.would_exceed_limit(dec("200.01"), rule, &policy));
    }

    #[test]
    fn test_credit_limit_boundary_net_cycle() {
        let policy = DecimalPolicy::default();
        let rule = CreditLimitRule::NetCycle;
        let account = account("1000.00", "500.00", "800.00");

        assert_eq!(account.available_credit(rule, &policy).unwrap().to_string(), "700.00");
        assert!(!account.would_exceed_limit(dec("700.00"), rule, &policy));
        assert!(account.would_exceed_limit(dec("700.01"), rule, &policy));
    }

    #[test]
    fn test_expiration_is_inclusive() {
        let mut account = account("1000", "0", "0");
        let exp = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        account.expiration_date = Some(exp);

        assert!(!account.is_expired_on(exp));
        assert!(account.is_expired_on(exp.succ_opt().unwrap()));
    }

    #[test]
    fn test_apply_debit_and_credit() {
        let policy = DecimalPolicy::default();
        let mut account = account("1000", "0", "0");

        account.apply(CycleEntry::Debit(dec("120.50")), &policy).unwrap();
        assert_eq!(account.current_cycle_debit.to_string(), "120.50");
        assert_eq!(account.current_balance.to_string(), "120.50");

        account.apply(CycleEntry::Credit(dec("20.25")), &policy).unwrap();
        assert_eq!(account.current_cycle_credit.to_string(), "20.25");
        assert_eq!(account.current_balance.to_string(), "100.25");
    }

    #[test]
    fn test_apply_overflow_leaves_account_unchanged() {
        let policy = DecimalPolicy::default();
        let mut account = account("1000", "0", "0");
        account.current_balance = dec("792281625142643375935439503.00");
        let before = account.clone();

        assert!(account.apply(CycleEntry::Debit(dec("1000.00")), &policy).is_err());
        assert_eq!(account, before);
        assert!(account.would_exceed_limit(Decimal::MAX, CreditLimitRule::CycleDebit, &policy));
    }

    #[test]
    fn test_parse_account_row() {
        let row = AccountRow {
            account_id: "00000000042".to_string(),
            active_status: Some("Y".to_string()),
            current_balance: Some("10.5".to_string()),
            credit_limit: Some("2000".to_string()),
            current_cycle_credit: None,
            current_cycle_debit: Some("".to_string()),
            expiration_date: Some("2026-12-31".to_string()),
        };

        let account = row.parse(&DecimalPolicy::default()).unwrap();
        assert_eq!(account.current_balance.to_string(), "10.50");
        assert_eq!(account.credit_limit.to_string(), "2000.00");
        assert_eq!(account.current_cycle_credit.to_string(), "0.00");
        assert_eq!(account.current_cycle_debit.to_string(), "0.00");
        assert_eq!(account.expiration_date, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_parse_account_row_rejects_bad_fields() {
        let policy = DecimalPolicy::default();
        let mut row = AccountRow {
            account_id: "42".to_string(),
            active_status: None,
            current_balance: None,
            credit_limit: None,
            current_cycle_credit: None,
            current_cycle_debit: None,
            expiration_date: None,
        };
        assert!(row.parse(&policy).is_err());

        row.account_id = "00000000042".to_string();
        row.expiration_date = Some("2026-13-01".to_string());
        assert!(row.parse(&policy).is_err());

        row.expiration_date = None;
        row.credit_limit = Some("lots".to_string());
        assert!(row.parse(&policy).is_err());

        // eleven integer digits do not fit S9(10)V99
        row.credit_limit = Some("12345678901.00".to_string());
        assert!(row.parse(&policy).is_err());
        row.credit_limit = Some("1234567890.00".to_string());
        assert!(row.parse(&policy).is_ok());
    }

    #[test]
    fn test_parse_cross_reference_row() {
        let row = CrossReferenceRow {
            card_number: "4111111111111111".to_string(),
            customer_id: Some("".to_string()),
            account_id: "00000000001".to_string(),
        };
        let xref = row.parse().unwrap();
        assert_eq!(xref.account_id, "00000000001");
        assert!(xref.customer_id.is_none());

        let bad = CrossReferenceRow {
            card_number: "4111".to_string(),
            customer_id: None,
            account_id: "00000000001".to_string(),
        };
        assert!(bad.parse().is_err());
    }
}
