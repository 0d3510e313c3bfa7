use comfy_table::{Table, TableComponent};
use log::{info, warn};

use crate::auth::{Auth, SessionStatus};
use crate::config::Config;
use crate::db::Database;
use crate::insights::InsightsProvider;
use crate::labeller::Labeller;
use crate::parser;
use crate::parser::Statement::{
    Categories, Charts, Dashboard, Delete, Export, ExportUsers, Help, Import, ImportUsers, Insert, Insights, Login,
    Logout, Select, Signup, Tips, Update, WhoAmI,
};

mod account;
mod export;
mod import;
mod insights;
mod transactions;
mod views;

/// Everything a statement may touch
pub(crate) struct App {
    pub(crate) db: Database,
    pub(crate) auth: Auth,
    pub(crate) config: Config,
    pub(crate) labeller: Labeller,
    /// Created on first use so a missing API key only matters for `INSIGHTS`
    insights: Option<Box<dyn InsightsProvider>>,
}

impl App {
    pub(crate) fn new(mut db: Database, config: Config, labeller: Labeller) -> App {
        let auth = Auth::restore(&mut db);
        App { db, auth, config, labeller, insights: None }
    }

    #[cfg(test)]
    pub(crate) fn with_insights_provider(mut self, provider: Box<dyn InsightsProvider>) -> App {
        self.insights = Some(provider);
        self
    }

    /// Pick up writes from other processes and make sure the session still matches a user
    pub(crate) fn refresh(&mut self) {
        match self.db.sync() {
            Ok(true) => info!("Store changed on disk, reloaded"),
            Ok(false) => {}
            Err(e) => warn!("Unable to reload store: {e}"),
        }

        if self.auth.revalidate(&mut self.db) == SessionStatus::Expired {
            println!("Your account no longer exists. You have been logged out.");
        }
    }

    /// Prompt for the REPL, showing who is logged in
    pub(crate) fn prompt(&self) -> String {
        match self.auth.current_user() {
            Some(user) => format!("{}# ", user.username),
            None => "# ".to_string(),
        }
    }
}

pub(crate) fn parse_and_run_command(app: &mut App, sql: &str) -> Result<(), String> {
    app.refresh();

    let statement = parser::parse(sql)?;

    let result = match statement {
        Login(credentials) => account::login(app, &credentials),
        Signup(data) => account::signup(app, &data),
        Logout => account::logout(app),
        WhoAmI => account::whoami(app),
        Insert(new_transaction) => transactions::insert(app, new_transaction),
        Update(id, patch) => transactions::update(app, &id, &patch),
        Delete(ids) => transactions::delete(app, ids.as_deref()),
        Select(projection, filter, sort, limit) => transactions::select(app, projection, filter, sort, limit),
        Dashboard => views::dashboard(app),
        Charts => views::charts(app),
        Categories => views::categories(app),
        Insights => insights::insights(app),
        Tips => {
            insights::print_tips();
            Ok(())
        }
        Help => {
            print_help();
            Ok(())
        }
        Import(path, options) => import::execute_import(app, &path, options),
        Export(path) => export::execute_export(app, &path),
        ImportUsers(path) => import::execute_import_users(app, &path),
        ExportUsers(path) => export::execute_export_users(app, &path),
    };

    result.map_err(|e| format!("{e:#}"))
}

/// A table in the house style: no lines between rows
pub(crate) fn new_table() -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);
    table
}

const HELP: &str = "Statements end with ';' and may span several lines. Keywords are case insensitive.

  LOGIN username password
  SIGNUP username password confirm_password
  LOGOUT
  WHOAMI

  INSERT income|expense category amount 'description' [ON yyyy-mm-dd] [PROJECT 'name']
  UPDATE id SET date = ..., type = ..., category = ..., amount = ..., description = ..., project = ...
  DELETE id [, id ...]
  SELECT *|COUNT(*)|SUM(*) [WHERE type = income|expense] [ORDER BY date|amount] [LIMIT n]

  DASHBOARD     totals, profit margin and recent transactions
  CHARTS        monthly figures, expense breakdown and daily trend
  CATEGORIES    known categories for each transaction type
  INSIGHTS      ask the AI advisor about your finances
  TIPS          quick profit tips

  IMPORT 'file or directory' [(dryrun, force)]
  EXPORT TO 'file'
  IMPORT USERS 'file'           (admin only)
  EXPORT USERS TO 'file'        (admin only)
";

fn print_help() {
    println!("{HELP}");
}
