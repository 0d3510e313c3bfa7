use comfy_table::{Cell, CellAlignment, Color};

use crate::controller::transactions::print_transactions;
use crate::controller::{new_table, App};
use crate::report::{self, MarginHealth, RECENT_COUNT};
use crate::transaction::TransactionKind;
use crate::util::format_amount;

/// Totals, profit margin and the most recent transactions
pub(crate) fn dashboard(app: &mut App) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let transactions = app.db.load_user_transactions(&user_id);
    let summary = report::summarize(&transactions);

    let margin_color = match summary.margin_health() {
        MarginHealth::Good => Color::Green,
        MarginHealth::Fair => Color::Yellow,
        MarginHealth::Poor => Color::Red,
    };

    let mut table = new_table();
    table.set_header(vec!["Total Income", "Total Expenses", "Net Profit", "Profit Margin"]);
    table.add_row(vec![
        Cell::new(format_amount(summary.total_income)).fg(Color::Green).set_alignment(CellAlignment::Right),
        Cell::new(format_amount(summary.total_expenses)).fg(Color::Red).set_alignment(CellAlignment::Right),
        Cell::new(format_amount(summary.net_profit)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.1}%", summary.profit_margin)).fg(margin_color).set_alignment(CellAlignment::Right),
    ]);
    println!("{table}");

    println!("Recent Transactions");
    let recent = report::recent(&transactions, RECENT_COUNT);
    if recent.is_empty() {
        println!("No transactions yet. Add your first transaction to get started!");
    } else {
        print_transactions(&recent);
    }
    Ok(())
}

/// The data behind the charts: monthly figures, expense split and the running balance
pub(crate) fn charts(app: &mut App) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let transactions = app.db.load_user_transactions(&user_id);
    if transactions.is_empty() {
        println!("No data available for charts. Add some transactions first.");
        return Ok(());
    }

    let mut monthly = new_table();
    monthly.set_header(vec!["Month", "Income", "Expenses", "Profit", "Margin"]);
    for m in report::monthly(&transactions) {
        monthly.add_row(vec![
            Cell::new(m.label()),
            Cell::new(format_amount(m.income)).set_alignment(CellAlignment::Right),
            Cell::new(format_amount(m.expenses)).set_alignment(CellAlignment::Right),
            Cell::new(format_amount(m.profit)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", m.profit_margin)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Monthly Income vs Expenses\n{monthly}");

    let breakdown = report::category_breakdown(&transactions);
    if !breakdown.is_empty() {
        let mut categories = new_table();
        categories.set_header(vec!["Category", "Amount", "Share"]);
        for share in breakdown {
            categories.add_row(vec![
                Cell::new(share.name),
                Cell::new(format_amount(share.total)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.0}%", share.percentage)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("Expense Breakdown\n{categories}");
    }

    let mut trend = new_table();
    trend.set_header(vec!["Date", "Amount", "Cumulative"]);
    for point in report::daily_trend(&transactions) {
        trend.add_row(vec![
            Cell::new(point.date.format("%Y-%m-%d").to_string()),
            Cell::new(format_amount(point.amount)).set_alignment(CellAlignment::Right),
            Cell::new(format_amount(point.cumulative)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Cumulative Cash Flow\n{trend}");

    let summary = report::summarize(&transactions);
    let average = transactions.iter().map(|t| t.amount).sum::<f64>() / transactions.len() as f64;
    let mut totals = new_table();
    totals.set_header(vec!["Total Revenue", "Total Expenses", "Net Profit", "Avg Transaction"]);
    totals.add_row(vec![
        format_amount(summary.total_income),
        format_amount(summary.total_expenses),
        format_amount(summary.net_profit),
        format_amount(average),
    ]);
    println!("{totals}");
    Ok(())
}

pub(crate) fn categories(app: &mut App) -> anyhow::Result<()> {
    app.auth.require_user()?;

    let mut table = new_table();
    table.set_header(vec!["Type", "Category", "Label"]);
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        for (value, label) in kind.categories() {
            table.add_row(vec![kind.to_string(), value.to_string(), label.to_string()]);
        }
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::controller::parse_and_run_command;
    use crate::controller::tests::logged_in_app;

    #[test]
    fn test_views_with_and_without_data() {
        let mut app = logged_in_app();
        assert!(parse_and_run_command(&mut app, "dashboard;").is_ok());
        assert!(parse_and_run_command(&mut app, "charts;").is_ok());

        parse_and_run_command(&mut app, "insert income service-income 1200 'Retainer' on 2024-02-01;").unwrap();
        parse_and_run_command(&mut app, "insert expense salary 800 'Contractor' on 2024-02-15;").unwrap();
        assert!(parse_and_run_command(&mut app, "dashboard;").is_ok());
        assert!(parse_and_run_command(&mut app, "charts;").is_ok());
        assert!(parse_and_run_command(&mut app, "categories;").is_ok());
    }
}
