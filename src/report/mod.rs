use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::transaction::{Transaction, TransactionKind};
use crate::util::title_case;

/// Number of transactions shown on the dashboard
pub(crate) const RECENT_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Summary {
    pub(crate) total_income: f64,
    pub(crate) total_expenses: f64,
    pub(crate) net_profit: f64,
    /// Net profit as a percentage of income, 0 without income
    pub(crate) profit_margin: f64,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarginHealth {
    Good,
    Fair,
    Poor,
}

impl Summary {
    pub(crate) fn margin_health(&self) -> MarginHealth {
        margin_health(self.profit_margin)
    }
}

pub(crate) fn margin_health(margin: f64) -> MarginHealth {
    if margin >= 20.0 {
        MarginHealth::Good
    } else if margin >= 10.0 {
        MarginHealth::Fair
    } else {
        MarginHealth::Poor
    }
}

fn margin(income: f64, expenses: f64) -> f64 {
    if income > 0.0 {
        (income - expenses) / income * 100.0
    } else {
        0.0
    }
}

pub(crate) fn summarize(transactions: &[Transaction]) -> Summary {
    let total_income: f64 = transactions.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
    let total_expenses: f64 = transactions.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
    Summary {
        total_income,
        total_expenses,
        net_profit: total_income - total_expenses,
        profit_margin: margin(total_income, total_expenses),
        count: transactions.len(),
    }
}

/// Expense totals keyed by category
pub(crate) fn expenses_by_category(transactions: &[Transaction]) -> BTreeMap<&str, f64> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        *totals.entry(t.category.as_str()).or_insert(0.0) += t.amount;
    }
    totals
}

/// Which transactions a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum KindFilter {
    #[default]
    All,
    Only(TransactionKind),
}

impl KindFilter {
    fn accepts(&self, t: &Transaction) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(kind) => t.kind == *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SortBy {
    /// Newest first
    #[default]
    Date,
    /// Largest first
    Amount,
}

/// Newest first. Ties keep the most recently added first.
fn by_date_desc(a: &Transaction, b: &Transaction) -> Ordering {
    b.date.cmp(&a.date).then_with(|| compare_ids(&b.id, &a.id))
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

pub(crate) fn list(transactions: &[Transaction], filter: KindFilter, sort: SortBy) -> Vec<&Transaction> {
    let mut result: Vec<&Transaction> = transactions.iter().filter(|t| filter.accepts(t)).collect();
    match sort {
        SortBy::Date => result.sort_by(|a, b| by_date_desc(a, b)),
        SortBy::Amount => result.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| by_date_desc(a, b))),
    }
    result
}

/// The `n` newest transactions
pub(crate) fn recent(transactions: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut result = list(transactions, KindFilter::All, SortBy::Date);
    result.truncate(n);
    result
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthlyPoint {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) income: f64,
    pub(crate) expenses: f64,
    pub(crate) profit: f64,
    pub(crate) profit_margin: f64,
}

impl MonthlyPoint {
    /// e.g. `Jan 2024`
    pub(crate) fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }
}

/// Income, expenses and profit per calendar month, oldest month first
pub(crate) fn monthly(transactions: &[Transaction]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for t in transactions {
        let entry = months.entry((t.date.year(), t.date.month())).or_insert((0.0, 0.0));
        match t.kind {
            TransactionKind::Income => entry.0 += t.amount,
            TransactionKind::Expense => entry.1 += t.amount,
        }
    }

    months.into_iter()
        .map(|((year, month), (income, expenses))| MonthlyPoint {
            year,
            month,
            income,
            expenses,
            profit: income - expenses,
            profit_margin: margin(income, expenses),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryShare {
    pub(crate) category: String,
    /// Display name, e.g. `Project Income`
    pub(crate) name: String,
    pub(crate) total: f64,
    /// Share of all expenses in percent
    pub(crate) percentage: f64,
}

/// Expense totals per category, largest first
pub(crate) fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let totals = expenses_by_category(transactions);
    let all: f64 = totals.values().sum();

    let mut shares: Vec<CategoryShare> = totals.into_iter()
        .map(|(category, total)| CategoryShare {
            category: category.to_string(),
            name: title_case(category),
            total,
            percentage: if all > 0.0 { total / all * 100.0 } else { 0.0 },
        })
        .collect();
    shares.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    shares
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DailyPoint {
    pub(crate) date: NaiveDate,
    /// Net of the day, income positive
    pub(crate) amount: f64,
    /// Running balance after the day
    pub(crate) cumulative: f64,
}

/// Net cash flow per day with the running balance, oldest day first
pub(crate) fn daily_trend(transactions: &[Transaction]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in transactions {
        *days.entry(t.date).or_insert(0.0) += t.signed_amount();
    }

    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, amount)| {
            cumulative += amount;
            DailyPoint { date, amount, cumulative }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str, date: &str, kind: TransactionKind, category: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kind,
            category: category.to_string(),
            amount,
            description: String::new(),
            project: None,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            t("1", "2024-02-10", TransactionKind::Income, "project-income", 1000.0),
            t("2", "2024-01-05", TransactionKind::Expense, "tools", 100.0),
            t("3", "2024-01-20", TransactionKind::Income, "service-income", 500.0),
            t("4", "2024-02-10", TransactionKind::Expense, "salary", 300.0),
            t("5", "2024-12-01", TransactionKind::Expense, "tools", 100.0),
        ]
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_income, 1500.0);
        assert_eq!(summary.total_expenses, 500.0);
        assert_eq!(summary.net_profit, 1000.0);
        assert!((summary.profit_margin - 66.666).abs() < 0.01);
        assert_eq!(summary.margin_health(), MarginHealth::Good);
        assert_eq!(summary.count, 5);
    }

    #[test]
    fn test_summarize_without_income() {
        let summary = summarize(&[t("1", "2024-01-01", TransactionKind::Expense, "tools", 10.0)]);
        assert_eq!(summary.net_profit, -10.0);
        assert_eq!(summary.profit_margin, 0.0);
        assert_eq!(summary.margin_health(), MarginHealth::Poor);
        assert_eq!(summarize(&[]).count, 0);
    }

    #[test]
    fn test_margin_health() {
        assert_eq!(margin_health(20.0), MarginHealth::Good);
        assert_eq!(margin_health(10.0), MarginHealth::Fair);
        assert_eq!(margin_health(9.9), MarginHealth::Poor);
    }

    #[test]
    fn test_list_filter_and_sort() {
        let transactions = sample();
        fn ids(v: Vec<&Transaction>) -> Vec<String> {
            v.iter().map(|t| t.id.clone()).collect()
        }

        assert_eq!(ids(list(&transactions, KindFilter::All, SortBy::Date)), vec!["5", "4", "1", "3", "2"]);
        assert_eq!(ids(list(&transactions, KindFilter::Only(TransactionKind::Income), SortBy::Date)), vec!["1", "3"]);
        assert_eq!(ids(list(&transactions, KindFilter::Only(TransactionKind::Expense), SortBy::Amount)), vec!["4", "5", "2"]);
    }

    #[test]
    fn test_recent() {
        let transactions = sample();
        let recent = recent(&transactions, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "5");
    }

    #[test]
    fn test_monthly_is_chronological() {
        let points = monthly(&sample());
        let labels: Vec<String> = points.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Dec 2024"]);

        assert_eq!(points[0].income, 500.0);
        assert_eq!(points[0].expenses, 100.0);
        assert_eq!(points[0].profit, 400.0);
        assert!((points[0].profit_margin - 80.0).abs() < 1e-9);
        assert_eq!(points[2].profit_margin, 0.0);
    }

    #[test]
    fn test_category_breakdown() {
        let shares = category_breakdown(&sample());
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "salary");
        assert!((shares[0].percentage - 60.0).abs() < 1e-9);
        assert_eq!(shares[1].name, "Tools");
        assert_eq!(shares[1].total, 200.0);
        assert!((shares[1].percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_trend() {
        let points = daily_trend(&sample());
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].amount, -100.0);
        assert_eq!(points[1].cumulative, 400.0);
        // Two transactions on 2024-02-10 are netted into one day
        assert_eq!(points[2].amount, 700.0);
        assert_eq!(points[2].cumulative, 1100.0);
        assert_eq!(points[3].cumulative, 1000.0);
    }
}
