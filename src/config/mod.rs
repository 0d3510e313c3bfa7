use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::info;
use serde::Deserialize;
use toml::value::Table;

use crate::user::Role;

pub(crate) const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Deserialize, Debug)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) insights: InsightsConfig,

    /// Users written to an empty store
    #[serde(default = "default_seed_users")]
    pub(crate) seed_users: Vec<SeedUser>,

    /// Auto categorisation rules, category name to one regex or a list of regexes
    #[serde(default)]
    pub(crate) categories: Table,
}

#[derive(Deserialize, Debug)]
pub(crate) struct InsightsConfig {
    pub(crate) api_key: Option<String>,
    #[serde(default = "default_model")]
    pub(crate) model: String,
    #[serde(default = "default_base_url")]
    pub(crate) base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub(crate) timeout_secs: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        InsightsConfig {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct SeedUser {
    pub(crate) username: String,
    pub(crate) password: String,
    #[serde(default = "default_role")]
    pub(crate) role: Role,
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_role() -> Role {
    Role::User
}

fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser { username: "admin".to_string(), password: "changeme".to_string(), role: Role::Admin },
        SeedUser { username: "demo".to_string(), password: "demo1234".to_string(), role: Role::User },
    ]
}

impl Config {
    pub(crate) fn empty() -> Config {
        Config {
            insights: InsightsConfig::default(),
            seed_users: default_seed_users(),
            categories: Table::new(),
        }
    }

    /// Load config from a TOML file. A missing file gives the default config.
    pub(crate) fn load_from_file(file_path: &Path) -> anyhow::Result<Config> {
        if file_path.exists() && file_path.is_file() {
            info!("Loading config from {}", file_path.display());
            let content = fs::read_to_string(file_path)?;
            Config::parse(&content).with_context(|| format!("Invalid config file {}", file_path.display()))
        } else {
            info!("No config file at {}, using defaults", file_path.display());
            Ok(Config::empty())
        }
    }

    pub(crate) fn parse(content: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str::<Config>(content)?)
    }

    /// API key from `GEMINI_API_KEY`, falling back to the config file
    pub(crate) fn gemini_api_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.insights.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }
}

/// `<data dir>/agentic-accounting/store.db`, or `./store.db` when the platform has no data dir
pub(crate) fn default_store_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("agentic-accounting").join("store.db"),
        None => PathBuf::from("store.db"),
    }
}

pub(crate) fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("agentic-accounting").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub(crate) fn history_file_path() -> PathBuf {
    match dirs::home_dir() {
        Some(dir) => dir.join(".agentic_accounting_history"),
        None => PathBuf::from(".agentic_accounting_history"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(r#"
            [insights]
            api_key = "abc"
            model = "gemini-1.5-pro"
            timeout_secs = 5

            [[seed_users]]
            username = "owner"
            password = "hunter22"
            role = "admin"

            [categories]
            tools = ["github", "jetbrains"]
            marketing = "google ads"
        "#).unwrap();

        assert_eq!(config.insights.api_key.as_deref(), Some("abc"));
        assert_eq!(config.insights.model, "gemini-1.5-pro");
        assert_eq!(config.insights.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.insights.timeout_secs, 5);
        assert_eq!(config.seed_users, vec![SeedUser {
            username: "owner".to_string(),
            password: "hunter22".to_string(),
            role: Role::Admin,
        }]);
        assert_eq!(config.categories.len(), 2);
    }

    #[test]
    fn test_empty_config_has_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.insights.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.seed_users.len(), 2);
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let config = Config::load_from_file(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.seed_users, default_seed_users());
    }
}
