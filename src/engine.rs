//! Daily transaction posting engine.
//!
//! Each pending candidate is validated against the card cross-reference and
//! its account, then either posted (account cycle totals and category balance
//! updated) or rejected with a reason code. Business rejections never stop the
//! batch; only configuration errors propagate.

use crate::account::{
    AccountRecord, AccountRow, CrossReferenceRecord, CrossReferenceRow, CycleEntry,
};
use crate::category::CategoryBalances;
use crate::config::EngineConfig;
use crate::error::{PostingError, Result};
use crate::store::{InMemoryStore, RecordStore};
use crate::timestamp::Db2Timestamp;
use crate::transaction::{
    DailyTransactionRecord, DailyTransactionRow, PostedTransactionRecord, RejectReason,
    RejectRecord,
};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::io::{Read, Write};

/// Batch completion status, following the mainframe RETURN-CODE convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionCode {
    /// Every candidate was posted.
    #[default]
    Normal,
    /// The batch completed but rejected at least one candidate.
    CompletedWithRejects,
}

impl ConditionCode {
    pub fn code(self) -> i32 {
        match self {
            ConditionCode::Normal => 0,
            ConditionCode::CompletedWithRejects => 4,
        }
    }
}

/// The transaction posting engine.
///
/// Accounts and cross-references live behind [`RecordStore`]s; the defaults
/// keep everything in memory.
pub struct PostingEngine<
    A = InMemoryStore<AccountRecord>,
    X = InMemoryStore<CrossReferenceRecord>,
> {
    config: EngineConfig,

    accounts: A,

    /// Card number → account.
    cross_references: X,

    pending: VecDeque<DailyTransactionRecord>,

    posted: Vec<PostedTransactionRecord>,

    rejected: Vec<RejectRecord>,

    category_balances: CategoryBalances,

    transaction_count: usize,

    reject_count: usize,

    condition_code: ConditionCode,

    /// Outcome of the most recent failed `validate_transaction`.
    last_failure: Option<RejectReason>,
}

impl PostingEngine {
    /// Creates an in-memory engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an in-memory engine.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_stores(config, InMemoryStore::new(), InMemoryStore::new())
    }
}

impl Default for PostingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, X> PostingEngine<A, X>
where
    A: RecordStore<AccountRecord>,
    X: RecordStore<CrossReferenceRecord>,
{
    /// Creates an engine over caller-supplied stores.
    pub fn with_stores(config: EngineConfig, accounts: A, cross_references: X) -> Self {
        let category_balances = CategoryBalances::new(config.decimal);
        PostingEngine {
            config,
            accounts,
            cross_references,
            pending: VecDeque::new(),
            posted: Vec::new(),
            rejected: Vec::new(),
            category_balances,
            transaction_count: 0,
            reject_count: 0,
            condition_code: ConditionCode::Normal,
            last_failure: None,
        }
    }

    /// Adds or replaces an account, rescaling its monetary fields.
    pub fn add_account(&mut self, mut account: AccountRecord) {
        account.normalize(&self.config.decimal);
        self.accounts.insert(account.account_id.clone(), account);
    }

    /// Adds or replaces the mapping for a card number.
    pub fn add_cross_reference(&mut self, xref: CrossReferenceRecord) {
        self.cross_references.insert(xref.card_number.clone(), xref);
    }

    /// Queues a candidate for the next batch run.
    pub fn add_daily_transaction(&mut self, mut tx: DailyTransactionRecord) {
        tx.amount = self.config.decimal.rescale(tx.amount);
        self.pending.push_back(tx);
    }

    pub fn lookup_cross_reference(&self, card_number: &str) -> Option<&CrossReferenceRecord> {
        self.cross_references.get(card_number.trim())
    }

    pub fn lookup_account(&self, account_id: &str) -> Option<&AccountRecord> {
        self.accounts.get(account_id.trim())
    }

    /// Runs the validation sequence for `tx`.
    ///
    /// Returns `true` if the candidate may be posted. On failure the reason is
    /// kept for the following [`generate_reject_record`](Self::generate_reject_record).
    pub fn validate_transaction(&mut self, tx: &DailyTransactionRecord) -> bool {
        match self.check(tx) {
            Ok(()) => {
                self.last_failure = None;
                true
            }
            Err(reason) => {
                debug!(
                    "Transaction {}: rejected with {}",
                    tx.transaction_id.as_deref().unwrap_or("<none>"),
                    reason
                );
                self.last_failure = Some(reason);
                false
            }
        }
    }

    /// Card → account → credit limit → expiration; first failure wins.
    fn check(&self, tx: &DailyTransactionRecord) -> std::result::Result<(), RejectReason> {
        let card_number = tx.card_number.as_deref().unwrap_or_default();
        let xref = self
            .lookup_cross_reference(card_number)
            .ok_or(RejectReason::InvalidCard)?;
        let account = self
            .lookup_account(&xref.account_id)
            .ok_or(RejectReason::AccountNotFound)?;

        if account.would_exceed_limit(tx.amount, self.config.limit, &self.config.decimal) {
            return Err(RejectReason::OverLimit);
        }

        if account.expiration_date.is_some() {
            match tx.original_date() {
                Some(date) if !account.is_expired_on(date) => {}
                _ => return Err(RejectReason::Expired),
            }
        }

        Ok(())
    }

    /// Posts a validated candidate.
    ///
    /// Updates the account's cycle totals under the update lock, adds the amount
    /// to the category balance and records the posted transaction.
    pub fn process_transaction(&mut self, tx: &DailyTransactionRecord) -> Result<()> {
        let card_number = tx.card_number.as_deref().unwrap_or_default();
        let account_id = self
            .lookup_cross_reference(card_number)
            .map(|xref| xref.account_id.clone())
            .ok_or_else(|| PostingError::UnknownCard(card_number.to_string()))?;

        let entry = self.config.cycle.entry(tx.type_code.as_deref(), tx.amount);

        self.accounts.lock_for_update(&account_id)?;
        let posted = self.post_to_account(&account_id, tx, entry);
        self.accounts.release(&account_id);
        let balance = posted?;

        let processed_timestamp = Db2Timestamp::now();
        debug!(
            "Transaction {}: posted {} to account {} at {}, category balance {}",
            tx.transaction_id.as_deref().unwrap_or("<none>"),
            tx.amount,
            account_id,
            processed_timestamp,
            balance
        );

        self.posted.push(PostedTransactionRecord {
            transaction: tx.clone(),
            processed_timestamp,
        });
        Ok(())
    }

    /// Applies `entry` to the locked account and `tx.amount` to its category
    /// balance. Either both change or neither does.
    fn post_to_account(
        &mut self,
        account_id: &str,
        tx: &DailyTransactionRecord,
        entry: CycleEntry,
    ) -> Result<Decimal> {
        let policy = self.config.decimal;
        let account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| PostingError::UnknownAccount(account_id.to_string()))?;

        let mut updated = account.clone();
        updated.apply(entry, &policy)?;
        let balance = self.category_balances.update(
            account_id,
            tx.type_code.as_deref().unwrap_or_default(),
            tx.category_code.as_deref().unwrap_or_default(),
            tx.amount,
        )?;
        *account = updated;
        Ok(balance)
    }

    /// Records `tx` as rejected with the reason from the last failed validation.
    ///
    /// No account or category balance is touched.
    pub fn generate_reject_record(&mut self, tx: &DailyTransactionRecord) -> Result<()> {
        let reason = self.last_failure.ok_or_else(|| {
            PostingError::NoRejectionPending(tx.transaction_id.clone().unwrap_or_default())
        })?;
        self.rejected.push(RejectRecord::new(tx, reason));
        Ok(())
    }

    /// Posts or rejects every pending candidate.
    ///
    /// Returns [`ConditionCode::Normal`] when nothing was rejected, otherwise
    /// [`ConditionCode::CompletedWithRejects`].
    ///
    /// # Errors
    ///
    /// A posting error stops the batch. The failing candidate and every one
    /// after it stay pending and uncounted.
    pub fn post_daily_transactions(&mut self) -> Result<ConditionCode> {
        info!("Posting {} daily transactions", self.pending.len());

        while let Some(tx) = self.pending.pop_front() {
            let outcome = if self.validate_transaction(&tx) {
                self.process_transaction(&tx).map(|()| false)
            } else {
                self.generate_reject_record(&tx).map(|()| true)
            };
            match outcome {
                Ok(rejected) => {
                    self.transaction_count += 1;
                    if rejected {
                        self.reject_count += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        "Transaction {}: posting stopped: {}",
                        tx.transaction_id.as_deref().unwrap_or("<none>"),
                        e
                    );
                    self.pending.push_front(tx);
                    return Err(e);
                }
            }
        }

        self.condition_code = if self.reject_count == 0 {
            ConditionCode::Normal
        } else {
            ConditionCode::CompletedWithRejects
        };

        info!("Transactions processed: {}", self.transaction_count);
        info!("Transactions rejected: {}", self.reject_count);
        if self.reject_count > 0 {
            warn!(
                "{} of {} transactions rejected",
                self.reject_count, self.transaction_count
            );
        }

        Ok(self.condition_code)
    }

    /// Current time in DB2 timestamp format.
    pub fn format_timestamp(&self) -> String {
        Db2Timestamp::now().to_string()
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn reject_count(&self) -> usize {
        self.reject_count
    }

    pub fn condition_code(&self) -> ConditionCode {
        self.condition_code
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn posted_transactions(&self) -> &[PostedTransactionRecord] {
        &self.posted
    }

    pub fn rejected_transactions(&self) -> &[RejectRecord] {
        &self.rejected
    }

    pub fn category_balances(&self) -> &CategoryBalances {
        &self.category_balances
    }

    /// Loads accounts from CSV. Invalid rows are logged and skipped.
    ///
    /// Returns the number of accounts loaded.
    pub fn load_accounts<R: Read>(&mut self, reader: R) -> Result<usize> {
        let policy = self.config.decimal;
        read_rows(reader, |row: AccountRow, _| {
            let account = row.parse(&policy)?;
            self.add_account(account);
            Ok(())
        })
    }

    /// Loads card cross-references from CSV. Invalid rows are logged and skipped.
    pub fn load_cross_references<R: Read>(&mut self, reader: R) -> Result<usize> {
        read_rows(reader, |row: CrossReferenceRow, _| {
            let xref = row.parse()?;
            self.add_cross_reference(xref);
            Ok(())
        })
    }

    /// Queues daily transactions from CSV. Rows without a readable amount are
    /// logged and skipped.
    pub fn load_daily_transactions<R: Read>(&mut self, reader: R) -> Result<usize> {
        let policy = self.config.decimal;
        read_rows(reader, |row: DailyTransactionRow, row_num| {
            let tx = row.parse(row_num, &policy)?;
            self.add_daily_transaction(tx);
            Ok(())
        })
    }

    /// Writes posted transactions as CSV, in posting order.
    pub fn write_posted<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "transaction_id",
            "card_number",
            "type_code",
            "category_code",
            "source",
            "description",
            "amount",
            "merchant_id",
            "merchant_name",
            "merchant_city",
            "merchant_zip",
            "original_timestamp",
            "processed_timestamp",
        ])?;

        for posted in &self.posted {
            let tx = &posted.transaction;
            let text = |field: &Option<String>| field.clone().unwrap_or_default();
            csv_writer.write_record([
                text(&tx.transaction_id),
                text(&tx.card_number),
                text(&tx.type_code),
                text(&tx.category_code),
                text(&tx.source),
                text(&tx.description),
                tx.amount.to_string(),
                text(&tx.merchant_id),
                text(&tx.merchant_name),
                text(&tx.merchant_city),
                text(&tx.merchant_zip),
                text(&tx.original_timestamp),
                posted.processed_timestamp.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes one fixed-width reject line per rejected candidate.
    pub fn write_rejects<W: Write>(&self, mut writer: W) -> Result<()> {
        for reject in &self.rejected {
            writeln!(writer, "{}", reject.to_line())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes category balances as CSV, sorted by key.
    pub fn write_category_balances<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["account_id", "type_code", "category_code", "balance"])?;

        for record in self.category_balances.records() {
            csv_writer.write_record([
                record.key.account_id,
                record.key.type_code,
                record.key.category_code,
                record.balance.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes accounts as CSV in the layout [`load_accounts`](Self::load_accounts) reads.
    ///
    /// Output is sorted by account id for deterministic results.
    pub fn write_accounts<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "account_id",
            "active_status",
            "current_balance",
            "credit_limit",
            "current_cycle_credit",
            "current_cycle_debit",
            "expiration_date",
        ])?;

        let mut accounts = self.accounts.values();
        accounts.sort_by(|a, b| a.account_id.cmp(&b.account_id));

        for account in accounts {
            csv_writer.write_record([
                account.account_id.clone(),
                (if account.active { "Y" } else { "N" }).to_string(),
                account.current_balance.to_string(),
                account.credit_limit.to_string(),
                account.current_cycle_credit.to_string(),
                account.current_cycle_debit.to_string(),
                account
                    .expiration_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Deserializes CSV rows and hands each to `accept` with its 1-based row number.
///
/// Rows that fail to deserialize or that `accept` refuses are logged at warn
/// level and skipped. Returns the number of rows accepted.
fn read_rows<R, T, F>(reader: R, mut accept: F) -> Result<usize>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T, usize) -> Result<()>,
{
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut accepted = 0;
    for (row_idx, result) in csv_reader.deserialize::<T>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        match result {
            Ok(row) => match accept(row, row_num) {
                Ok(()) => accepted += 1,
                Err(e) => warn!("Row {}: {}", row_num, e),
            },
            Err(e) => {
                warn!("Row {}: CSV parse error: {}", row_num, e);
            }
        }
    }

    debug!("Loaded {} rows", accepted);
    Ok(accepted)
}
