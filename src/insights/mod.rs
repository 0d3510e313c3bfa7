mod gemini;

use std::fmt;

use log::{error, info};

use crate::report::{expenses_by_category, summarize};
use crate::transaction::Transaction;

pub(crate) use gemini::{GeminiClient, GeminiConfig};

/// Static advice shown next to generated insights, as (title, description)
pub(crate) const QUICK_TIPS: [(&str, &str); 4] = [
    ("Revenue Growth", "Focus on high-margin projects and recurring revenue streams"),
    ("Cost Control", "Review subscription services and optimize team productivity"),
    ("Profit Margin", "Aim for 20%+ profit margin for sustainable growth"),
    ("Optimization", "Automate processes and invest in scalable solutions"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsightsError {
    NoTransactions,
    MissingApiKey,
    /// Key cannot be sent as an HTTP header value
    InvalidApiKey,
    /// Request never got a response
    Transport(String),
    /// Service answered with a non-success status
    Http(u16, String),
    /// Response had no text candidate
    NoContent,
}

impl fmt::Display for InsightsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InsightsError::NoTransactions => write!(f, "Add some transactions first to get meaningful insights."),
            InsightsError::MissingApiKey => write!(f, "GEMINI_API_KEY is not set. Set it or add api_key under [insights] in the config file."),
            InsightsError::InvalidApiKey => write!(f, "The Gemini API key contains characters that cannot be sent. Check GEMINI_API_KEY or api_key under [insights]."),
            InsightsError::Transport(_) | InsightsError::Http(_, _) => write!(f, "Error generating insights. Please try again later."),
            InsightsError::NoContent => write!(f, "Unable to generate insights. Please check your API configuration."),
        }
    }
}

impl std::error::Error for InsightsError {}

/// Something that turns a prompt into narrative text
pub(crate) trait InsightsProvider {
    fn generate(&self, prompt: &str) -> Result<String, InsightsError>;
}

/// Prompt describing the user's finances for the model
pub(crate) fn build_prompt(transactions: &[Transaction]) -> String {
    let summary = summarize(transactions);
    let by_category = expenses_by_category(transactions)
        .into_iter()
        .map(|(category, amount)| format!("{category}: ${amount:.2}"))
        .collect::<Vec<String>>()
        .join("\n");

    format!("As a financial advisor for a small business, analyze the following financial data and provide actionable insights for profit optimization:

Total Income: ${:.2}
Total Expenses: ${:.2}
Net Profit: ${:.2}
Profit Margin: {:.1}%

Expenses by Category:
{}

Number of Transactions: {}

Please provide:
1. Current financial health assessment
2. Top 3 profit optimization recommendations
3. Cost reduction opportunities
4. Revenue growth suggestions
5. Key metrics to monitor

Keep the response concise and actionable for a startup environment.
",
        summary.total_income,
        summary.total_expenses,
        summary.net_profit,
        summary.profit_margin,
        by_category,
        summary.count)
}

/// Ask the provider for insights on the given transactions. There is no retry; the caller may
/// simply run it again.
pub(crate) fn generate_insights(provider: &dyn InsightsProvider, transactions: &[Transaction]) -> Result<String, InsightsError> {
    if transactions.is_empty() {
        return Err(InsightsError::NoTransactions);
    }

    let prompt = build_prompt(transactions);
    info!("Requesting insights for {} transactions", transactions.len());
    provider.generate(&prompt).map_err(|e| {
        match &e {
            InsightsError::Transport(detail) => error!("Error generating insights: {detail}"),
            InsightsError::Http(status, body) => error!("Insights request failed with status {status}: {body}"),
            _ => error!("Error generating insights: {e}"),
        }
        e
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::*;
    use crate::transaction::TransactionKind;

    struct FakeProvider {
        response: Result<String, InsightsError>,
        prompts: RefCell<Vec<String>>,
    }

    impl InsightsProvider for FakeProvider {
        fn generate(&self, prompt: &str) -> Result<String, InsightsError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.response.clone()
        }
    }

    fn fake(response: Result<String, InsightsError>) -> FakeProvider {
        FakeProvider { response, prompts: RefCell::new(vec![]) }
    }

    fn transactions() -> Vec<Transaction> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vec![
            Transaction { id: "1".to_string(), date, kind: TransactionKind::Income, category: "project-income".to_string(), amount: 1000.0, description: String::new(), project: None },
            Transaction { id: "2".to_string(), date, kind: TransactionKind::Expense, category: "tools".to_string(), amount: 150.0, description: String::new(), project: None },
            Transaction { id: "3".to_string(), date, kind: TransactionKind::Expense, category: "marketing".to_string(), amount: 50.0, description: String::new(), project: None },
        ]
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(&transactions());
        assert!(prompt.contains("Total Income: $1000.00"));
        assert!(prompt.contains("Total Expenses: $200.00"));
        assert!(prompt.contains("Net Profit: $800.00"));
        assert!(prompt.contains("Profit Margin: 80.0%"));
        assert!(prompt.contains("marketing: $50.00\ntools: $150.00"));
        assert!(prompt.contains("Number of Transactions: 3"));
    }

    #[test]
    fn test_generate_insights() {
        let provider = fake(Ok("Looking healthy".to_string()));
        assert_eq!(generate_insights(&provider, &transactions()), Ok("Looking healthy".to_string()));
        assert_eq!(provider.prompts.borrow().len(), 1);
    }

    #[test]
    fn test_no_transactions_skips_request() {
        let provider = fake(Ok("unused".to_string()));
        assert_eq!(generate_insights(&provider, &[]), Err(InsightsError::NoTransactions));
        assert!(provider.prompts.borrow().is_empty());
    }

    #[test]
    fn test_error_messages() {
        let provider = fake(Err(InsightsError::Transport("connection refused".to_string())));
        let err = generate_insights(&provider, &transactions()).unwrap_err();
        assert_eq!(err.to_string(), "Error generating insights. Please try again later.");
        assert_eq!(InsightsError::NoContent.to_string(), "Unable to generate insights. Please check your API configuration.");
    }
}
