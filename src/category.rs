//! Running balances per (account, transaction type, transaction category).

use crate::decimal::DecimalPolicy;
use crate::error::Result;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Key of a category balance record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    pub account_id: String,
    pub type_code: String,
    pub category_code: String,
}

impl CategoryKey {
    pub fn new(account_id: &str, type_code: &str, category_code: &str) -> Self {
        CategoryKey {
            account_id: account_id.to_string(),
            type_code: type_code.to_string(),
            category_code: category_code.to_string(),
        }
    }
}

/// A category balance as written out at the end of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBalanceRecord {
    pub key: CategoryKey,
    pub balance: Decimal,
}

/// Category balances for all accounts touched by a batch.
#[derive(Debug, Clone, Default)]
pub struct CategoryBalances {
    policy: DecimalPolicy,
    balances: HashMap<CategoryKey, Decimal>,
}

impl CategoryBalances {
    pub fn new(policy: DecimalPolicy) -> Self {
        CategoryBalances {
            policy,
            balances: HashMap::new(),
        }
    }

    /// Adds `amount` to the balance for the key, creating it on first use.
    ///
    /// Negative amounts reduce the balance. Returns the new balance; on
    /// overflow the stored balance is left as it was.
    pub fn update(
        &mut self,
        account_id: &str,
        type_code: &str,
        category_code: &str,
        amount: Decimal,
    ) -> Result<Decimal> {
        let key = CategoryKey::new(account_id, type_code, category_code);
        let balance = match self.balances.get(&key) {
            Some(current) => self.policy.add(*current, amount)?,
            None => self.policy.checked_rescale(amount)?,
        };
        self.balances.insert(key, balance);
        Ok(balance)
    }

    pub fn get(&self, account_id: &str, type_code: &str, category_code: &str) -> Option<Decimal> {
        self.balances
            .get(&CategoryKey::new(account_id, type_code, category_code))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// All balances ordered by key.
    pub fn records(&self) -> Vec<CategoryBalanceRecord> {
        let mut records: Vec<_> = self
            .balances
            .iter()
            .map(|(key, balance)| CategoryBalanceRecord {
                key: key.clone(),
                balance: *balance,
            })
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}
