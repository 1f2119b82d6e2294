//! CardDemo posting batch CLI
//!
//! Loads accounts, card cross-references and the daily transaction feed,
//! posts the feed, and writes posted transactions as CSV to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv xref.csv daily.csv [rejects.txt] [accounts-out.csv]
//! ```
//!
//! The process exits with the batch condition code: 0 when every transaction
//! posted, 4 when some were rejected, 1 on a fatal error.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to control logging verbosity
//! - `CARDDEMO_CREDIT_TYPE_CODES`: Comma-separated type codes posted as credits
//! - `CARDDEMO_LIMIT_RULE`: `debit` (default) or `net`

use carddemo_posting::{ConditionCode, EngineConfig, PostingEngine, PostingError, Result};
use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process;

fn main() {
    env_logger::init();

    match run() {
        Ok(code) => process::exit(code.code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run() -> Result<ConditionCode> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        return Err(PostingError::MissingArgument);
    }

    let mut engine = PostingEngine::with_config(EngineConfig::from_env());

    let accounts = engine.load_accounts(BufReader::new(File::open(&args[1])?))?;
    let xrefs = engine.load_cross_references(BufReader::new(File::open(&args[2])?))?;
    let daily = engine.load_daily_transactions(BufReader::new(File::open(&args[3])?))?;
    info!(
        "Loaded {} accounts, {} cross-references, {} daily transactions",
        accounts, xrefs, daily
    );

    let code = engine.post_daily_transactions()?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    engine.write_posted(handle)?;

    if let Some(path) = args.get(4) {
        engine.write_rejects(BufWriter::new(File::create(path)?))?;
    }
    if let Some(path) = args.get(5) {
        engine.write_accounts(BufWriter::new(File::create(path)?))?;
    }

    Ok(code)
}
