use lazy_static::lazy_static;
use regex::Regex;

use crate::transaction::TransactionKind;

const INCOME_PATTERNS: [&str; 5] = [
    "invoice", "payment received", "salary", "refund", "deposit"
];

lazy_static! {
    static ref INCOME_REGEX: Regex = Regex::new(&("(?i)".to_string() + &INCOME_PATTERNS.join("|"))).unwrap();
}

/// Work out the type of an imported row that has no usable `type` column. Returns the type and
/// the amount made non-negative.
/// A negative amount is a bank style debit, so an expense. Otherwise the description decides.
pub(crate) fn infer_kind(amount: f64, description: &str) -> (TransactionKind, f64) {
    if amount < 0.0 {
        (TransactionKind::Expense, -amount)
    } else if INCOME_REGEX.is_match(description) {
        (TransactionKind::Income, amount)
    } else {
        (TransactionKind::Expense, amount)
    }
}

/// Normalise an amount against an explicit type. A negative amount recorded as income or expense
/// keeps its type and loses the sign.
pub(crate) fn normalise_amount(amount: f64) -> f64 {
    amount.abs()
}
