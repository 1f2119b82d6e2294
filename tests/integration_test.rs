//! Integration tests for the posting CLI.
//!
//! These tests run the actual binary against CSV files in a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ACCOUNTS: &str = "account_id,active_status,current_balance,credit_limit,current_cycle_credit,current_cycle_debit,expiration_date
00000000001,Y,100.00,1000.00,0.00,100.00,2030-12-31
00000000002,Y,0.00,50.00,0.00,0.00,2020-01-31
";

const XREFS: &str = "card_number,customer_id,account_id
4111111111111111,000000001,00000000001
4222222222222222,000000002,00000000002
4333333333333333,000000003,00000000003
";

const DAILY_HEADER: &str = "transaction_id,card_number,type_code,category_code,source,description,amount,merchant_id,merchant_name,merchant_city,merchant_zip,original_timestamp\n";

/// Writes the fixture files and returns their paths.
fn write_inputs(dir: &Path, daily_rows: &str) -> (PathBuf, PathBuf, PathBuf) {
    let accounts = dir.join("accounts.csv");
    let xrefs = dir.join("xref.csv");
    let daily = dir.join("daily.csv");
    fs::write(&accounts, ACCOUNTS).unwrap();
    fs::write(&xrefs, XREFS).unwrap();
    fs::write(&daily, format!("{}{}", DAILY_HEADER, daily_rows)).unwrap();
    (accounts, xrefs, daily)
}

fn command(accounts: &Path, xrefs: &Path, daily: &Path) -> Command {
    let mut cmd = Command::cargo_bin("carddemo-posting").unwrap();
    cmd.arg(accounts).arg(xrefs).arg(daily);
    cmd
}

#[test]
fn test_all_posted_exits_zero() {
    let dir = TempDir::new().unwrap();
    let (accounts, xrefs, daily) = write_inputs(
        dir.path(),
        "T0001,4111111111111111,01,0001,POS TERM,Coffee,4.50,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000\n",
    );

    let assert = command(&accounts, &xrefs, &daily).assert().code(0);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(stdout.starts_with("transaction_id,card_number,type_code"));
    assert!(stdout.contains("T0001,4111111111111111,01,0001,POS TERM,Coffee,4.50,"));
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn test_rejects_exit_four_and_write_reject_file() {
    let dir = TempDir::new().unwrap();
    let rows = "\
T0001,4111111111111111,01,0001,POS TERM,Coffee,4.50,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000
T0002,4999999999999999,01,0001,POS TERM,Unknown card,1.00,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000
T0003,4333333333333333,01,0001,POS TERM,No account,1.00,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000
T0004,4111111111111111,01,0001,POS TERM,Too much,900.01,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000
T0005,4222222222222222,01,0001,POS TERM,Expired,1.00,100000001,Cafe,Town,11111,2024-06-01-08.00.00.000000
";
    let (accounts, xrefs, daily) = write_inputs(dir.path(), rows);
    let rejects = dir.path().join("rejects.txt");
    let accounts_out = dir.path().join("accounts-out.csv");

    command(&accounts, &xrefs, &daily)
        .arg(&rejects)
        .arg(&accounts_out)
        .assert()
        .code(4)
        .stdout(predicate::str::contains("T0001"));

    let rejects = fs::read_to_string(&rejects).unwrap();
    let lines: Vec<&str> = rejects.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("T0002") && lines[0].contains("0100INVALID CARD NUMBER FOUND"));
    assert!(lines[1].starts_with("T0003") && lines[1].contains("0101ACCOUNT RECORD NOT FOUND"));
    assert!(lines[2].starts_with("T0004") && lines[2].contains("0102OVERLIMIT TRANSACTION"));
    assert!(lines[3].starts_with("T0005") && lines[3].contains("0103TRANSACTION RECEIVED"));

    let accounts_out = fs::read_to_string(&accounts_out).unwrap();
    assert!(accounts_out.contains("00000000001,Y,104.50,1000.00,0.00,104.50,2030-12-31"));
    assert!(accounts_out.contains("00000000002,Y,0.00,50.00,0.00,0.00,2020-01-31"));
}

#[test]
fn test_credit_type_codes_from_environment() {
    let dir = TempDir::new().unwrap();
    let (accounts, xrefs, daily) = write_inputs(
        dir.path(),
        "T0001,4111111111111111,02,0002,OPERATOR,Payment,50.00,,,,,2024-06-01-08.00.00.000000\n",
    );
    let accounts_out = dir.path().join("accounts-out.csv");
    let rejects = dir.path().join("rejects.txt");

    command(&accounts, &xrefs, &daily)
        .env("CARDDEMO_CREDIT_TYPE_CODES", "02")
        .arg(&rejects)
        .arg(&accounts_out)
        .assert()
        .code(0);

    let accounts_out = fs::read_to_string(&accounts_out).unwrap();
    assert!(accounts_out.contains("00000000001,Y,50.00,1000.00,50.00,100.00,2030-12-31"));
    assert_eq!(fs::read_to_string(&rejects).unwrap(), "");
}

#[test]
fn test_empty_feed_exits_zero() {
    let dir = TempDir::new().unwrap();
    let (accounts, xrefs, daily) = write_inputs(dir.path(), "");

    command(&accounts, &xrefs, &daily)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("transaction_id,"));
}

#[test]
fn test_missing_file_error() {
    let dir = TempDir::new().unwrap();
    let (accounts, xrefs, _) = write_inputs(dir.path(), "");

    command(&accounts, &xrefs, &dir.path().join("nonexistent.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("carddemo-posting").unwrap();
    cmd.arg("accounts.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}
