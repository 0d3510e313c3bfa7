use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::config::Config;
use crate::controller::{parse_and_run_command, App};
use crate::db::Database;
use crate::editor::ReplHelper;
use crate::labeller::Labeller;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

mod auth;
mod config;
mod controller;
mod csv_reader;
mod csv_writer;
mod db;
mod editor;
mod enrich;
mod insights;
mod labeller;
mod parser;
mod report;
mod storage;
mod transaction;
mod user;
mod util;

const MEMORY_STORE: &str = ":memory:";

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Store file path, defaults to the platform data dir. `:memory:` keeps nothing on disk.
    file: Option<PathBuf>,

    /// Config file with insights settings, seed users and category rules
    #[clap(long)]
    config: Option<PathBuf>,

    /// Run the given statements and exit instead of starting the shell
    #[clap(short, long)]
    command: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli: Cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = Config::load_from_file(&config_path)?;
    let labeller = Labeller::new(&config)?;

    let store = open_store(cli.file)?;
    let db = Database::new(store, config.seed_users.clone());
    let mut app = App::new(db, config, labeller);

    match cli.command {
        Some(command) => {
            for statement in split_statements(&command) {
                if let Err(err) = parse_and_run_command(&mut app, &statement) {
                    println!("{}", err);
                }
            }
            Ok(())
        }
        None => run_shell(&mut app),
    }
}

fn open_store(file: Option<PathBuf>) -> anyhow::Result<Box<dyn KeyValueStore>> {
    let store_path = file.unwrap_or_else(config::default_store_path);
    if store_path.as_os_str() == MEMORY_STORE {
        info!("Using an in-memory store, nothing will be saved");
        return Ok(Box::new(MemoryStore::new()));
    }

    let store = FileStore::open(&store_path)?;
    info!("Opened {} with {} keys", store.path().display(), store.keys().len());
    Ok(Box::new(store))
}

/// Read statements until Ctrl-C or Ctrl-D. A statement ends with `;` and may span lines.
fn run_shell(app: &mut App) -> anyhow::Result<()> {
    let mut rl = Editor::<ReplHelper, DefaultHistory>::new().context("Unable to start line editor")?;
    rl.set_helper(Some(ReplHelper::new()));

    let history_file = config::history_file_path();
    if rl.load_history(&history_file).is_err() {
        println!("No previous history.");
    }
    println!("Type HELP; to list the statements.");

    let mut sql_buffer: Vec<String> = vec![];
    loop {
        let prompt = if sql_buffer.is_empty() { app.prompt() } else { "> ".to_string() };
        if let Some(helper) = rl.helper_mut() {
            helper.set_prompt(&prompt);
        }

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                let is_last = line.ends_with(';');
                if !line.is_empty() {
                    sql_buffer.push(line.to_string());
                }
                if is_last {
                    let sql = sql_buffer.join("\n");
                    if let Err(e) = rl.add_history_entry(sql.trim()) {
                        warn!("Unable to add history entry: {e}");
                    }

                    if let Err(err) = parse_and_run_command(app, &sql) {
                        println!("{}", err);
                    }
                    sql_buffer.clear();
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_file) {
        warn!("Unable to save history to {}: {e}", history_file.display());
    }
    Ok(())
}

/// Split `-c` input into statements on `;`, ignoring semicolons inside quotes
fn split_statements(input: &str) -> Vec<String> {
    let mut statements = vec![];
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (Some(q), _) if q == c => {
                quote = None;
                current.push(c);
            }
            (None, ';') => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}
