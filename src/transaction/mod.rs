use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Income categories offered when recording income, as (value, label)
pub(crate) const INCOME_CATEGORIES: [(&str, &str); 3] = [
    ("project-income", "Project Income"),
    ("service-income", "Service Income"),
    ("other", "Other Income"),
];

/// Expense categories offered when recording expenses, as (value, label)
pub(crate) const EXPENSE_CATEGORIES: [(&str, &str); 6] = [
    ("salary", "Employee Salaries"),
    ("subscription", "Tool Subscriptions"),
    ("tools", "Tools & Software"),
    ("marketing", "Marketing"),
    ("office", "Office Expenses"),
    ("other", "Other Expenses"),
];

pub(crate) const DEFAULT_CATEGORY: &str = "other";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Categories a user would normally pick for this kind
    pub(crate) fn categories(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            TransactionKind::Income => &INCOME_CATEGORIES,
            TransactionKind::Expense => &EXPENSE_CATEGORIES,
        }
    }

    /// Label of a known category, if any
    pub(crate) fn category_label(&self, category: &str) -> Option<&'static str> {
        self.categories().iter().find(|(value, _)| *value == category).map(|(_, label)| *label)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("'{other}' is not a transaction type, expected income or expense")),
        }
    }
}

/// A transaction as stored in a user's transaction list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Transaction {
    pub(crate) id: String,
    pub(crate) date: NaiveDate,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionKind,
    pub(crate) category: String,
    pub(crate) amount: f64,
    pub(crate) description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) project: Option<String>,
}

impl Transaction {
    /// Amount with sign applied, income positive and expense negative
    pub(crate) fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub(crate) fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub(crate) fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub(crate) fn project_display(&self) -> &str {
        self.project.as_deref().unwrap_or("")
    }
}

/// A transaction that has not been given an id yet
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewTransaction {
    pub(crate) date: NaiveDate,
    pub(crate) kind: TransactionKind,
    pub(crate) category: String,
    pub(crate) amount: f64,
    pub(crate) description: String,
    pub(crate) project: Option<String>,
}

impl NewTransaction {
    pub(crate) fn with_id(self, id: String) -> Transaction {
        Transaction {
            id,
            date: self.date,
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            description: self.description.replace('\n', " "),
            project: self.project.filter(|p| !p.is_empty()),
        }
    }
}

/// Fields to change on an existing transaction. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TransactionPatch {
    pub(crate) date: Option<NaiveDate>,
    pub(crate) kind: Option<TransactionKind>,
    pub(crate) category: Option<String>,
    pub(crate) amount: Option<f64>,
    pub(crate) description: Option<String>,
    /// `Some("")` clears the project
    pub(crate) project: Option<String>,
}

impl TransactionPatch {
    pub(crate) fn is_empty(&self) -> bool {
        *self == TransactionPatch::default()
    }

    pub(crate) fn apply(&self, t: &mut Transaction) {
        if let Some(date) = self.date {
            t.date = date;
        }
        if let Some(kind) = self.kind {
            t.kind = kind;
        }
        if let Some(category) = &self.category {
            t.category = category.clone();
        }
        if let Some(amount) = self.amount {
            t.amount = amount;
        }
        if let Some(description) = &self.description {
            t.description = description.replace('\n', " ");
        }
        if let Some(project) = &self.project {
            t.project = if project.is_empty() { None } else { Some(project.clone()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            id: "1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: TransactionKind::Expense,
            category: "tools".to_string(),
            amount: 29.5,
            description: "IDE licence".to_string(),
            project: None,
        }
    }

    #[test]
    fn test_transaction_serde() {
        let t = sample();
        let s = serde_json::to_string(&t).unwrap();
        assert_eq!(s, r#"{"id":"1","date":"2024-03-01","type":"expense","category":"tools","amount":29.5,"description":"IDE licence"}"#);

        let parsed: Transaction = serde_json::from_str(&s).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Income".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!(" expense ".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_category_label() {
        assert_eq!(TransactionKind::Expense.category_label("tools"), Some("Tools & Software"));
        assert_eq!(TransactionKind::Income.category_label("other"), Some("Other Income"));
        assert_eq!(TransactionKind::Income.category_label("tools"), None);
    }

    #[test]
    fn test_signed_amount() {
        let mut t = sample();
        assert_eq!(t.signed_amount(), -29.5);
        t.kind = TransactionKind::Income;
        assert_eq!(t.signed_amount(), 29.5);
    }

    #[test]
    fn test_patch() {
        let mut t = sample();
        t.project = Some("website".to_string());
        let patch = TransactionPatch {
            amount: Some(10.0),
            project: Some(String::new()),
            ..TransactionPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut t);
        assert_eq!(t.amount, 10.0);
        assert_eq!(t.project, None);
        assert_eq!(t.category, "tools");
        assert!(TransactionPatch::default().is_empty());
    }
}
