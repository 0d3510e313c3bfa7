mod file;

use std::collections::BTreeMap;

pub(crate) use file::FileStore;

/// Key for the JSON array of registered users
pub(crate) const USERS_KEY: &str = "agentic-users-csv";

/// Key holding a copy of the logged in user
pub(crate) const CURRENT_USER_KEY: &str = "agentic-current-user";

/// Key holding a user's transactions
pub(crate) fn transactions_key(user_id: &str) -> String {
    format!("agentic-transactions-{user_id}")
}

/// Key holding md5 digests of statement files a user already imported
pub(crate) fn imports_key(user_id: &str) -> String {
    format!("agentic-imports-{user_id}")
}

/// A flat string key-value store. Values are JSON documents written by the caller.
pub(crate) trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()>;

    fn keys(&self) -> Vec<String>;

    /// Pick up changes written by another process. Returns true if the content was reloaded.
    fn sync(&mut self) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Store that lives only as long as the process. Backs tests and `:memory:` sessions.
#[derive(Default, Debug)]
pub(crate) struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub(crate) fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
