use csv::WriterBuilder;
use serde::Serialize;

use crate::transaction::Transaction;
use crate::user::User;

/// Column layout of an exported transaction. Matches what `csv_reader` expects back.
#[derive(Serialize)]
struct TransactionCsvRow<'a> {
    id: &'a str,
    date: String,
    #[serde(rename = "type")]
    kind: String,
    category: &'a str,
    amount: f64,
    description: &'a str,
    project: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserCsvRow<'a> {
    id: &'a str,
    username: &'a str,
    password: &'a str,
    role: String,
    created_at: String,
}

/// Serialise transactions to csv text with a header row
pub(crate) fn transactions_to_csv(transactions: &[Transaction]) -> anyhow::Result<String> {
    let rows = transactions.iter().map(|t| TransactionCsvRow {
        id: &t.id,
        date: t.date.format("%Y-%m-%d").to_string(),
        kind: t.kind.to_string(),
        category: &t.category,
        amount: t.amount,
        description: &t.description,
        project: t.project_display(),
    });
    write_rows(rows, &["id", "date", "type", "category", "amount", "description", "project"])
}

/// Serialise users to csv text with a header row
pub(crate) fn users_to_csv(users: &[User]) -> anyhow::Result<String> {
    let rows = users.iter().map(|u| UserCsvRow {
        id: &u.id,
        username: &u.username,
        password: &u.password,
        role: u.role.to_string(),
        created_at: u.created_at.to_rfc3339(),
    });
    write_rows(rows, &["id", "username", "password", "role", "createdAt"])
}

/// Headers are written by hand so an empty export still carries them
fn write_rows<T: Serialize, I: Iterator<Item = T>>(rows: I, headers: &[&str]) -> anyhow::Result<String> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    csv_writer.write_record(headers)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    let bytes = csv_writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
