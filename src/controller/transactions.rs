use anyhow::bail;
use comfy_table::{Cell, CellAlignment, Color};
use log::{info, warn};

use crate::controller::{new_table, App};
use crate::parser::Projection;
use crate::report::{self, KindFilter, SortBy};
use crate::transaction::{NewTransaction, Transaction, TransactionPatch};
use crate::util::format_amount;

pub(crate) fn insert(app: &mut App, new_transaction: NewTransaction) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    check_amount(new_transaction.amount)?;
    if new_transaction.category.trim().is_empty() || new_transaction.description.trim().is_empty() {
        bail!("Please fill in all required fields");
    }
    if new_transaction.kind.category_label(&new_transaction.category).is_none() {
        info!("Category {} is not one of the known {} categories", new_transaction.category, new_transaction.kind);
    }

    let transaction = app.db.add_transaction(&user_id, new_transaction)?;
    println!("Transaction added successfully!");
    print_transactions(&[&transaction]);
    Ok(())
}

pub(crate) fn update(app: &mut App, id: &str, patch: &TransactionPatch) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    if patch.is_empty() {
        bail!("Nothing to update");
    }
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }
    let blank = |field: &Option<String>| field.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&patch.category) || blank(&patch.description) {
        bail!("Please fill in all required fields");
    }

    match app.db.update_transaction(&user_id, id, patch)? {
        Some(transaction) => {
            println!("Transaction {id} updated.");
            print_transactions(&[&transaction]);
            Ok(())
        }
        None => bail!("Transaction {id} not found"),
    }
}

pub(crate) fn delete(app: &mut App, ids: Option<&[String]>) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let ids = match ids {
        Some(ids) => ids,
        None => bail!("Unable to parse transaction ids. Usage: DELETE id [, id ...]"),
    };
    for id in ids.iter().filter(|id| app.db.find_transaction(&user_id, id).is_none()) {
        warn!("Transaction {id} not found");
    }
    let deleted = app.db.delete_transactions(&user_id, ids)?;
    println!("{deleted} transactions deleted.");
    Ok(())
}

pub(crate) fn select(app: &mut App, projection: Projection, filter: KindFilter, sort: SortBy, limit: Option<usize>) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let transactions = app.db.load_user_transactions(&user_id);
    let mut selected = report::list(&transactions, filter, sort);
    if let Some(limit) = limit {
        selected.truncate(limit);
    }

    match projection {
        Projection::Star => {
            if selected.is_empty() {
                println!("No transactions found");
            } else {
                print_transactions(&selected);
            }
        }
        Projection::Count => {
            let mut table = new_table();
            table.set_header(vec!["Count"]);
            table.add_row(vec![Cell::new(selected.len()).set_alignment(CellAlignment::Right)]);
            println!("{table}");
        }
        Projection::Sum => {
            // Income counts up, expenses down
            let total: f64 = selected.iter().map(|t| t.signed_amount()).sum();
            let mut table = new_table();
            table.set_header(vec!["Subtotal"]);
            table.add_row(vec![Cell::new(format_amount(total)).set_alignment(CellAlignment::Right)]);
            println!("{table}");
        }
    }
    Ok(())
}

fn check_amount(amount: f64) -> anyhow::Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be a positive number");
    }
    Ok(())
}

pub(crate) fn print_transactions(transactions: &[&Transaction]) {
    let mut table = new_table();
    table.set_header(vec!["ID", "Date", "Type", "Category", "Description", "Project", "Amount"]);

    for t in transactions {
        let color = if t.is_income() { Color::Green } else { Color::Red };
        let category = t.kind.category_label(&t.category).map(str::to_string).unwrap_or_else(|| t.category.clone());
        table.add_row(vec![
            Cell::new(t.id.as_str()).set_alignment(CellAlignment::Right),
            Cell::new(t.date.format("%Y-%m-%d").to_string()),
            Cell::new(t.kind.to_string()),
            Cell::new(category),
            Cell::new(t.description.as_str()),
            Cell::new(t.project_display()),
            Cell::new(format_amount(t.signed_amount())).fg(color).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
}
