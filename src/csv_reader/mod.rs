use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::StringRecord;
use log::{info, warn};
use serde::Deserialize;

use crate::enrich;
use crate::labeller::Labeller;
use crate::transaction::{NewTransaction, TransactionKind, DEFAULT_CATEGORY};
use crate::user::Role;
use crate::util::{parse_amount, parse_date};

#[cfg(test)]
mod tests;

/// A transaction row read from a csv file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Record {
    /// Id carried over from an earlier export, if any
    pub(crate) id: Option<String>,
    pub(crate) transaction: NewTransaction,
}

/// A user row read from a csv file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UserRecord {
    pub(crate) id: Option<String>,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) role: Role,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

/// Rows that made it through, plus how many were dropped
#[derive(Debug)]
pub(crate) struct Rows<T> {
    pub(crate) records: Vec<T>,
    pub(crate) skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    FileNotFoundError(String),
    InvalidFileError(String),
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "csv reading error: {}",
            match self {
                CsvError::FileNotFoundError(s) => s,
                CsvError::InvalidFileError(s) => s,
            }
        )
    }
}

impl std::error::Error for CsvError {}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::InvalidFileError(e.to_string())
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TransactionRow {
    id: Option<String>,
    date: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    category: Option<String>,
    amount: Option<String>,
    description: Option<String>,
    project: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct UserRow {
    id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    role: Option<String>,
    #[serde(rename = "createdat")]
    created_at: Option<String>,
}

pub(crate) fn read_transactions_file(file_path: &Path, labeller: &Labeller) -> Result<Rows<Record>, CsvError> {
    if !file_path.exists() {
        return Err(CsvError::FileNotFoundError(format!("{} not found", file_path.display())));
    }

    info!("Reading transactions from {}", file_path.display());
    let file = std::fs::File::open(file_path)
        .map_err(|e| CsvError::InvalidFileError(e.to_string()))?;
    read_transactions(file, labeller)
}

/// Read transactions from csv with a header row. Rows without a usable date or amount are skipped.
/// A missing or unknown `type` is inferred from the amount sign and description, a missing
/// category comes from the labeller rules.
pub(crate) fn read_transactions<R: Read>(reader: R, labeller: &Labeller) -> Result<Rows<Record>, CsvError> {
    let mut rdr = reader_with_lowercase_headers(reader)?;
    require_columns(rdr.headers()?, &["date", "amount"])?;

    let mut records = vec![];
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<TransactionRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping row {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };

        let date = row.date.as_deref().and_then(parse_date);
        let amount = row.amount.as_deref().and_then(parse_amount);
        let (date, amount) = match (date, amount) {
            (Some(date), Some(amount)) => (date, amount),
            _ => {
                warn!("Skipping row {}: missing or invalid date/amount", line + 1);
                skipped += 1;
                continue;
            }
        };

        let description = row.description.unwrap_or_default();
        let (kind, amount) = match row.kind.as_deref().map(str::parse::<TransactionKind>) {
            Some(Ok(kind)) => (kind, enrich::normalise_amount(amount)),
            _ => enrich::infer_kind(amount, &description),
        };

        let category = row.category
            .or_else(|| labeller.categorise(&description))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        records.push(Record {
            id: row.id,
            transaction: NewTransaction {
                date,
                kind,
                category,
                amount,
                description,
                project: row.project,
            },
        });
    }

    Ok(Rows { records, skipped })
}

/// Read users from csv with a header row. Rows without username or password are skipped.
pub(crate) fn read_users<R: Read>(reader: R) -> Result<Rows<UserRecord>, CsvError> {
    let mut rdr = reader_with_lowercase_headers(reader)?;
    require_columns(rdr.headers()?, &["username", "password"])?;

    let mut records = vec![];
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<UserRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping user row {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };

        let (username, password) = match (row.username, row.password) {
            (Some(username), Some(password)) => (username, password),
            _ => {
                warn!("Skipping user row {}: missing username or password", line + 1);
                skipped += 1;
                continue;
            }
        };

        let role = match row.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                warn!("{e} for user {username}, using 'user'");
                Role::User
            }
            None => Role::User,
        };

        let created_at = row.created_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc));

        records.push(UserRecord { id: row.id, username, password, role, created_at });
    }

    Ok(Rows { records, skipped })
}

fn reader_with_lowercase_headers<R: Read>(reader: R) -> Result<csv::Reader<R>, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: StringRecord = rdr.headers()?.iter().map(|h| h.to_ascii_lowercase()).collect();
    rdr.set_headers(headers);
    Ok(rdr)
}

fn require_columns(headers: &StringRecord, columns: &[&str]) -> Result<(), CsvError> {
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(CsvError::InvalidFileError(format!("Unable to locate '{column}' column")));
        }
    }
    Ok(())
}
