use std::collections::HashSet;

use anyhow::anyhow;
use chrono::Utc;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SeedUser;
use crate::csv_reader;
use crate::csv_writer;
use crate::labeller::Labeller;
use crate::storage::{self, KeyValueStore, CURRENT_USER_KEY, USERS_KEY};
use crate::transaction::{NewTransaction, Transaction, TransactionPatch};
use crate::user::User;
use crate::util::next_id;

/// Outcome of a csv import
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportReport {
    pub(crate) imported: usize,
    pub(crate) skipped: usize,
    /// Rows whose id was empty or already taken and got a fresh one
    pub(crate) reassigned_ids: usize,
}

/// Access to users, sessions and per user transactions kept in a key-value store.
/// Every mutation rewrites the whole affected collection.
pub(crate) struct Database {
    store: Box<dyn KeyValueStore>,
    seed_users: Vec<SeedUser>,
}

impl Database {
    pub(crate) fn new(store: Box<dyn KeyValueStore>, seed_users: Vec<SeedUser>) -> Database {
        Database { store, seed_users }
    }

    /// Reload the store if another process wrote to it
    pub(crate) fn sync(&mut self) -> anyhow::Result<bool> {
        self.store.sync()
    }

    fn default_users(&self) -> Vec<User> {
        self.seed_users.iter().enumerate()
            .map(|(i, seed)| User::new((i + 1).to_string(), &seed.username, &seed.password, seed.role))
            .collect()
    }

    /// All registered users. An empty store is seeded with the default users; unreadable
    /// content falls back to the defaults without overwriting it.
    pub(crate) fn load_users(&mut self) -> Vec<User> {
        match self.store.get_item(USERS_KEY) {
            None => {
                let users = self.default_users();
                info!("Seeding store with {} default users", users.len());
                if let Err(e) = self.save_users(&users) {
                    error!("Error saving users: {e}");
                }
                users
            }
            Some(json) => match serde_json::from_str::<Vec<User>>(&json) {
                Ok(users) => users,
                Err(e) => {
                    error!("Error loading users: {e}");
                    self.default_users()
                }
            },
        }
    }

    pub(crate) fn save_users(&mut self, users: &[User]) -> anyhow::Result<()> {
        self.write_json(USERS_KEY, users)
    }

    pub(crate) fn find_user(&mut self, user_id: &str) -> Option<User> {
        self.load_users().into_iter().find(|u| u.id == user_id)
    }

    /// Transactions of a user. Missing or unreadable content gives an empty list, and single
    /// unreadable records are left out.
    pub(crate) fn load_user_transactions(&self, user_id: &str) -> Vec<Transaction> {
        self.read_transactions(user_id).0
    }

    /// Stored transactions of a user and the number of stored entries that could not be read
    fn read_transactions(&self, user_id: &str) -> (Vec<Transaction>, usize) {
        let json = match self.store.get_item(&storage::transactions_key(user_id)) {
            Some(json) => json,
            None => return (vec![], 0),
        };
        let values = match serde_json::from_str::<Vec<serde_json::Value>>(&json) {
            Ok(values) => values,
            Err(e) => {
                error!("Error loading transactions of user {user_id}: {e}");
                return (vec![], 1);
            }
        };

        let mut unreadable = 0;
        let transactions = values.into_iter()
            .filter_map(|value| match serde_json::from_value::<Transaction>(value) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("Skipping unreadable transaction of user {user_id}: {e}");
                    unreadable += 1;
                    None
                }
            })
            .collect();
        (transactions, unreadable)
    }

    /// Transactions of a user about to be rewritten. Fails rather than drop records it cannot read.
    fn transactions_for_write(&self, user_id: &str) -> anyhow::Result<Vec<Transaction>> {
        match self.read_transactions(user_id) {
            (transactions, 0) => Ok(transactions),
            (_, unreadable) => Err(anyhow!(
                "Stored transactions of user {user_id} contain {unreadable} unreadable entries, refusing to overwrite them"
            )),
        }
    }

    pub(crate) fn save_user_transactions(&mut self, user_id: &str, transactions: &[Transaction]) -> anyhow::Result<()> {
        self.write_json(&storage::transactions_key(user_id), transactions)
    }

    pub(crate) fn add_transaction(&mut self, user_id: &str, new: NewTransaction) -> anyhow::Result<Transaction> {
        let mut transactions = self.transactions_for_write(user_id)?;
        let id = next_id(transactions.iter().map(|t| t.id.as_str()));
        let transaction = new.with_id(id);
        transactions.push(transaction.clone());
        self.save_user_transactions(user_id, &transactions)?;
        info!("Added transaction {} for user {}", transaction.id, user_id);
        Ok(transaction)
    }

    pub(crate) fn find_transaction(&self, user_id: &str, id: &str) -> Option<Transaction> {
        self.load_user_transactions(user_id).into_iter().find(|t| t.id == id)
    }

    /// Apply `patch` to the transaction with `id`. Returns `None` when there is no such transaction.
    pub(crate) fn update_transaction(&mut self, user_id: &str, id: &str, patch: &TransactionPatch) -> anyhow::Result<Option<Transaction>> {
        let mut transactions = self.transactions_for_write(user_id)?;
        let updated = match transactions.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                patch.apply(t);
                t.clone()
            }
            None => return Ok(None),
        };
        self.save_user_transactions(user_id, &transactions)?;
        info!("Updated transaction {} for user {}", id, user_id);
        Ok(Some(updated))
    }

    /// Remove the transactions with the given ids. Returns how many were removed.
    pub(crate) fn delete_transactions(&mut self, user_id: &str, ids: &[String]) -> anyhow::Result<usize> {
        let mut transactions = self.transactions_for_write(user_id)?;
        let before = transactions.len();
        transactions.retain(|t| !ids.contains(&t.id));
        let deleted = before - transactions.len();
        if deleted > 0 {
            self.save_user_transactions(user_id, &transactions)?;
        }
        Ok(deleted)
    }

    pub(crate) fn export_user_transactions_csv(&self, user_id: &str) -> anyhow::Result<String> {
        csv_writer::transactions_to_csv(&self.load_user_transactions(user_id))
    }

    /// Append transactions from csv text to a user's list
    pub(crate) fn import_user_transactions_csv(&mut self, user_id: &str, csv: &str, labeller: &Labeller) -> anyhow::Result<ImportReport> {
        let rows = csv_reader::read_transactions(csv.as_bytes(), labeller)?;
        let mut transactions = self.transactions_for_write(user_id)?;
        let mut taken: HashSet<String> = transactions.iter().map(|t| t.id.clone()).collect();

        let mut report = ImportReport { skipped: rows.skipped, ..ImportReport::default() };
        for record in rows.records {
            let id = match record.id {
                Some(id) if !taken.contains(&id) => id,
                _ => {
                    report.reassigned_ids += 1;
                    next_id(taken.iter().map(|s| s.as_str()))
                }
            };
            taken.insert(id.clone());
            transactions.push(record.transaction.with_id(id));
            report.imported += 1;
        }

        if report.imported > 0 {
            self.save_user_transactions(user_id, &transactions)?;
        }
        info!("Imported {} transactions for user {}, skipped {}", report.imported, user_id, report.skipped);
        Ok(report)
    }

    pub(crate) fn export_users_csv(&mut self) -> anyhow::Result<String> {
        csv_writer::users_to_csv(&self.load_users())
    }

    /// Append users from csv text. Usernames already registered are skipped.
    pub(crate) fn import_users_csv(&mut self, csv: &str) -> anyhow::Result<ImportReport> {
        let rows = csv_reader::read_users(csv.as_bytes())?;
        let mut users = self.load_users();
        let mut taken_ids: HashSet<String> = users.iter().map(|u| u.id.clone()).collect();

        let mut report = ImportReport { skipped: rows.skipped, ..ImportReport::default() };
        for record in rows.records {
            if users.iter().any(|u| u.username == record.username) {
                warn!("Username {} already exists, skipping", record.username);
                report.skipped += 1;
                continue;
            }

            let id = match record.id {
                Some(id) if !taken_ids.contains(&id) => id,
                _ => {
                    report.reassigned_ids += 1;
                    next_id(taken_ids.iter().map(|s| s.as_str()))
                }
            };
            taken_ids.insert(id.clone());
            users.push(User {
                id,
                username: record.username,
                password: record.password,
                role: record.role,
                created_at: record.created_at.unwrap_or_else(Utc::now),
            });
            report.imported += 1;
        }

        if report.imported > 0 {
            self.save_users(&users)?;
        }
        Ok(report)
    }

    /// The session record. `Err` means the stored copy could not be read.
    pub(crate) fn load_session(&self) -> Result<Option<User>, serde_json::Error> {
        match self.store.get_item(CURRENT_USER_KEY) {
            None => Ok(None),
            Some(json) => serde_json::from_str::<User>(&json).map(Some),
        }
    }

    pub(crate) fn save_session(&mut self, user: &User) -> anyhow::Result<()> {
        self.write_json(CURRENT_USER_KEY, user)
    }

    pub(crate) fn clear_session(&mut self) -> anyhow::Result<()> {
        self.store.remove_item(CURRENT_USER_KEY)
    }

    /// Has this user already imported a file with the given md5 digest
    pub(crate) fn file_imported(&self, user_id: &str, digest: &str) -> bool {
        self.read_json::<Vec<String>>(&storage::imports_key(user_id))
            .map(|digests| digests.iter().any(|d| d == digest))
            .unwrap_or(false)
    }

    pub(crate) fn record_file_import(&mut self, user_id: &str, digest: &str) -> anyhow::Result<()> {
        let key = storage::imports_key(user_id);
        let mut digests = self.read_json::<Vec<String>>(&key).unwrap_or_default();
        if !digests.iter().any(|d| d == digest) {
            digests.push(digest.to_string());
        }
        self.write_json(&key, &digests)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.store.get_item(key)?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Error reading {key}: {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set_item(key, &json).map_err(|e| anyhow!("Error saving {key}: {e}"))
    }
}
