//! Daily, posted and rejected transaction records.

use crate::account::non_blank;
use crate::decimal::DecimalPolicy;
use crate::error::{PostingError, Result};
use crate::pic::PicClause;
use crate::timestamp::{date_portion, Db2Timestamp};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;

/// `DALYTRAN-AMT PIC S9(09)V99`
pub const AMOUNT_PIC: PicClause = PicClause::signed_numeric(9, 2);

/// Width of the description in a reject trailer.
const REJECT_DESCRIPTION_WIDTH: usize = 76;

/// Raw daily transaction row as read from CSV.
#[derive(Debug, Deserialize)]
pub struct DailyTransactionRow {
    pub transaction_id: Option<String>,
    pub card_number: Option<String>,
    pub type_code: Option<String>,
    pub category_code: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub merchant_id: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_zip: Option<String>,
    pub original_timestamp: Option<String>,
}

impl DailyTransactionRow {
    /// Converts the row into a candidate. Only the amount is mandatory and it
    /// must fit [`AMOUNT_PIC`]; all business checks happen at posting time.
    pub fn parse(&self, row: usize, policy: &DecimalPolicy) -> Result<DailyTransactionRecord> {
        let amount = non_blank(&self.amount).ok_or_else(|| PostingError::InvalidRecord {
            row,
            message: "missing amount".to_string(),
        })?;
        let amount = policy
            .parse(amount)
            .and_then(|amount| AMOUNT_PIC.encode_display(amount).map(|_| amount))
            .map_err(|e| PostingError::InvalidRecord {
                row,
                message: e.to_string(),
            })?;

        let text = |field: &Option<String>| non_blank(field).map(str::to_string);
        Ok(DailyTransactionRecord {
            transaction_id: text(&self.transaction_id),
            card_number: text(&self.card_number),
            type_code: text(&self.type_code),
            category_code: text(&self.category_code),
            source: text(&self.source),
            description: text(&self.description),
            amount,
            merchant_id: text(&self.merchant_id),
            merchant_name: text(&self.merchant_name),
            merchant_city: text(&self.merchant_city),
            merchant_zip: text(&self.merchant_zip),
            original_timestamp: text(&self.original_timestamp),
        })
    }
}

/// A pending transaction from the daily feed.
///
/// Every field except the amount may be absent; absent fields format as
/// blanks in reject records and output files.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTransactionRecord {
    pub transaction_id: Option<String>,
    pub card_number: Option<String>,
    pub type_code: Option<String>,
    pub category_code: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub amount: Decimal,
    pub merchant_id: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_zip: Option<String>,
    /// `YYYY-MM-DD-HH.MM.SS.NNNNNN`
    pub original_timestamp: Option<String>,
}

impl DailyTransactionRecord {
    /// Creates a candidate with only its identity, card and amount set.
    pub fn new(
        transaction_id: impl Into<String>,
        card_number: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        DailyTransactionRecord {
            transaction_id: Some(transaction_id.into()),
            card_number: Some(card_number.into()),
            type_code: None,
            category_code: None,
            source: None,
            description: None,
            amount,
            merchant_id: None,
            merchant_name: None,
            merchant_city: None,
            merchant_zip: None,
            original_timestamp: None,
        }
    }

    pub fn with_codes(mut self, type_code: &str, category_code: &str) -> Self {
        self.type_code = Some(type_code.to_string());
        self.category_code = Some(category_code.to_string());
        self
    }

    pub fn with_original_timestamp(mut self, timestamp: &str) -> Self {
        self.original_timestamp = Some(timestamp.to_string());
        self
    }

    pub fn with_merchant(mut self, id: &str, name: &str, city: &str, zip: &str) -> Self {
        self.merchant_id = Some(id.to_string());
        self.merchant_name = Some(name.to_string());
        self.merchant_city = Some(city.to_string());
        self.merchant_zip = Some(zip.to_string());
        self
    }

    pub fn with_description(mut self, source: &str, description: &str) -> Self {
        self.source = Some(source.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Date the transaction was originated, if the timestamp has a readable date.
    pub fn original_date(&self) -> Option<NaiveDate> {
        self.original_timestamp
            .as_deref()
            .and_then(|ts| date_portion(ts).ok())
    }

    /// Amount as `S9(9)V99` display digits, falling back to plain text when it
    /// does not fit the layout.
    pub fn amount_display(&self) -> String {
        AMOUNT_PIC
            .encode_display(self.amount)
            .unwrap_or_else(|_| self.amount.to_string())
    }

    /// Lays the record out as fixed-width columns.
    pub fn to_fixed_width(&self) -> String {
        let mut line = String::with_capacity(320);
        line.push_str(&fixed(self.transaction_id.as_deref(), 16));
        line.push_str(&fixed(self.card_number.as_deref(), 16));
        line.push_str(&fixed(self.type_code.as_deref(), 2));
        line.push_str(&fixed(self.category_code.as_deref(), 4));
        line.push_str(&fixed(self.source.as_deref(), 10));
        line.push_str(&fixed(self.description.as_deref(), 100));
        line.push_str(&format!("{:>12}", self.amount_display()));
        line.push_str(&fixed(self.merchant_id.as_deref(), 9));
        line.push_str(&fixed(self.merchant_name.as_deref(), 50));
        line.push_str(&fixed(self.merchant_city.as_deref(), 50));
        line.push_str(&fixed(self.merchant_zip.as_deref(), 10));
        line.push_str(&fixed(self.original_timestamp.as_deref(), 26));
        line
    }
}

/// A candidate that passed validation and was posted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedTransactionRecord {
    pub transaction: DailyTransactionRecord,
    pub processed_timestamp: Db2Timestamp,
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    InvalidCard,
    AccountNotFound,
    OverLimit,
    Expired,
}

impl RejectReason {
    /// Numeric validation-fail reason.
    pub fn code(self) -> u16 {
        match self {
            RejectReason::InvalidCard => 100,
            RejectReason::AccountNotFound => 101,
            RejectReason::OverLimit => 102,
            RejectReason::Expired => 103,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RejectReason::InvalidCard => "INVALID CARD NUMBER FOUND",
            RejectReason::AccountNotFound => "ACCOUNT RECORD NOT FOUND",
            RejectReason::OverLimit => "OVERLIMIT TRANSACTION",
            RejectReason::Expired => "TRANSACTION RECEIVED AFTER ACCT EXPIRATION",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.description())
    }
}

/// A rejected candidate with its failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRecord {
    pub transaction_id: Option<String>,
    /// Fixed-width transaction data.
    pub transaction_data: String,
    pub reason: RejectReason,
}

impl RejectRecord {
    pub fn new(transaction: &DailyTransactionRecord, reason: RejectReason) -> Self {
        RejectRecord {
            transaction_id: transaction.transaction_id.clone(),
            transaction_data: transaction.to_fixed_width(),
            reason,
        }
    }

    pub fn validation_fail_reason(&self) -> u16 {
        self.reason.code()
    }

    pub fn validation_fail_description(&self) -> &'static str {
        self.reason.description()
    }

    /// Transaction data followed by the 4-digit reason and padded description.
    pub fn to_line(&self) -> String {
        format!(
            "{}{:04}{}",
            self.transaction_data,
            self.reason.code(),
            fixed(Some(self.reason.description()), REJECT_DESCRIPTION_WIDTH)
        )
    }
}

/// Left-justifies `value` in `width` columns, truncating overflow.
fn fixed(value: Option<&str>, width: usize) -> String {
    let value = value.unwrap_or("");
    let truncated: String = value.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}
