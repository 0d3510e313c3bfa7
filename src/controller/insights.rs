use crate::controller::{new_table, App};
use crate::insights::{generate_insights, GeminiClient, GeminiConfig, InsightsError, QUICK_TIPS};

/// Ask the configured provider for advice on the user's transactions
pub(crate) fn insights(app: &mut App) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let transactions = app.db.load_user_transactions(&user_id);
    // No point asking for an API key yet
    if transactions.is_empty() {
        return Err(InsightsError::NoTransactions.into());
    }

    if app.insights.is_none() {
        let config = GeminiConfig::from_config(&app.config)?;
        app.insights = Some(Box::new(GeminiClient::new(config)?));
    }

    if let Some(provider) = &app.insights {
        println!("Analyzing your financial data...");
        let text = generate_insights(provider.as_ref(), &transactions)?;
        println!("AI Financial Insights\n\n{text}\n");
        print_tips();
    }
    Ok(())
}

pub(crate) fn print_tips() {
    let mut table = new_table();
    table.set_header(vec!["Quick Tip", ""]);
    for (title, description) in QUICK_TIPS {
        table.add_row(vec![title, description]);
    }
    println!("{table}");
}
