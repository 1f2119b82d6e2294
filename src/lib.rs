//! # CardDemo Posting
//!
//! Daily transaction posting for the CardDemo credit-card application, with
//! the decimal behaviour of the COBOL batch it replaces.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: money uses `rust_decimal` at an explicit
//!   [`DecimalPolicy`] scale, rounded half up after every operation
//! - **Mainframe formats**: COMP-3 packed decimals, PIC clauses and DB2
//!   timestamps each have a dedicated parse/format pair
//! - **Per-record outcomes**: business failures become [`RejectRecord`]s with
//!   a reason code; they never abort the batch
//! - **Condition codes**: a run ends with 0 (all posted) or 4 (rejects)
//!
//! ## Example
//!
//! ```
//! use carddemo_posting::{
//!     AccountRecord, CrossReferenceRecord, DailyTransactionRecord, DecimalPolicy, PostingEngine,
//! };
//! use rust_decimal::Decimal;
//!
//! let mut engine = PostingEngine::new();
//! let mut account = AccountRecord::new("00000000001", &DecimalPolicy::default());
//! account.credit_limit = Decimal::new(100000, 2);
//! engine.add_account(account);
//! engine.add_cross_reference(CrossReferenceRecord::new("4111111111111111", "00000000001"));
//! engine.add_daily_transaction(DailyTransactionRecord::new(
//!     "T1",
//!     "4111111111111111",
//!     Decimal::new(2500, 2),
//! ));
//!
//! let code = engine.post_daily_transactions().unwrap();
//! assert_eq!(code.code(), 0);
//! assert_eq!(engine.posted_transactions().len(), 1);
//! ```

pub mod account;
pub mod category;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod packed;
pub mod pic;
pub mod store;
pub mod timestamp;
pub mod transaction;
pub mod validation;

pub use account::{AccountRecord, CrossReferenceRecord, CycleEntry};
pub use category::{CategoryBalanceRecord, CategoryBalances, CategoryKey};
pub use config::{CreditLimitRule, CycleConvention, EngineConfig};
pub use decimal::{DecimalPolicy, DisplayFormat};
pub use engine::{ConditionCode, PostingEngine};
pub use error::{PostingError, Result};
pub use packed::{pack_decimal, unpack_packed};
pub use pic::PicClause;
pub use store::{InMemoryStore, RecordStore};
pub use timestamp::Db2Timestamp;
pub use transaction::{DailyTransactionRecord, PostedTransactionRecord, RejectReason, RejectRecord};
pub use validation::{FieldFormat, ValidationError};
