use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::Config;
use crate::csv_reader::{read_transactions, read_transactions_file, read_users, CsvError};
use crate::labeller::Labeller;
use crate::transaction::TransactionKind;
use crate::user::Role;

#[test]
fn test_read_transactions_fixture() {
    let rows = read_transactions_file(&fixture_filename("transactions.csv"), &Labeller::empty()).unwrap();
    assert_eq!(rows.records.len(), 4);
    assert_eq!(rows.skipped, 2);

    let first = &rows.records[0];
    assert_eq!(first.id.as_deref(), Some("1700000000000"));
    assert_eq!(first.transaction.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(first.transaction.kind, TransactionKind::Income);
    assert_eq!(first.transaction.category, "project-income");
    assert_eq!(first.transaction.amount, 5000.0);
    assert_eq!(first.transaction.project.as_deref(), Some("website"));

    let no_id = &rows.records[1];
    assert_eq!(no_id.id, None);
    assert_eq!(no_id.transaction.project, None);
}

#[test]
fn test_missing_file() {
    let result = read_transactions_file(&fixture_filename("nope.csv"), &Labeller::empty());
    assert!(matches!(result, Err(CsvError::FileNotFoundError(_))));
}

#[test]
fn test_missing_required_column() {
    let csv = "date,description\n2024-01-01,Lunch\n";
    let result = read_transactions(csv.as_bytes(), &Labeller::empty());
    assert_eq!(result.err(), Some(CsvError::InvalidFileError("Unable to locate 'amount' column".to_string())));
}

#[test]
fn test_type_inference_and_auto_category() {
    let config = Config::parse("[categories]\ntools = \"github\"").unwrap();
    let labeller = Labeller::new(&config).unwrap();
    let csv = "Date,Amount,Description\n\
               31/01/2024,-12.00,GitHub seats\n\
               02 Feb 2024,\"1,500.00\",Invoice 17 payment received\n";

    let rows = read_transactions(csv.as_bytes(), &labeller).unwrap();
    assert_eq!(rows.skipped, 0);

    let github = &rows.records[0].transaction;
    assert_eq!(github.kind, TransactionKind::Expense);
    assert_eq!(github.amount, 12.0);
    assert_eq!(github.category, "tools");

    let invoice = &rows.records[1].transaction;
    assert_eq!(invoice.kind, TransactionKind::Income);
    assert_eq!(invoice.amount, 1500.0);
    assert_eq!(invoice.category, "other");
}

#[test]
fn test_read_users() {
    let csv = "id,username,password,role,createdAt\n\
               5,ada,secret1,admin,2024-01-01T00:00:00Z\n\
               ,grace,,user,\n\
               ,linus,kernel99,,\n\
               ,ken,unix1234,owner,not-a-date\n";

    let rows = read_users(csv.as_bytes()).unwrap();
    assert_eq!(rows.skipped, 1);
    assert_eq!(rows.records.len(), 3);

    assert_eq!(rows.records[0].id.as_deref(), Some("5"));
    assert_eq!(rows.records[0].role, Role::Admin);
    assert!(rows.records[0].created_at.is_some());

    assert_eq!(rows.records[1].username, "linus");
    assert_eq!(rows.records[1].id, None);
    assert_eq!(rows.records[1].role, Role::User);

    assert_eq!(rows.records[2].role, Role::User);
    assert_eq!(rows.records[2].created_at, None);
}

/// Return the path to a file within the test data directory
pub(crate) fn fixture_filename(filename: &str) -> PathBuf {
    let mut dir = fixture_dir();
    dir.push(filename);
    dir
}

pub(crate) fn fixture_dir() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.push("fixture");
    dir
}
