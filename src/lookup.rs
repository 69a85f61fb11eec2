//! Name to ID lookups for the category and account selectors.
//!
//! A [Lookups] value is a snapshot of the category and account tables. Rather
//! than keeping a snapshot around indefinitely, callers hold a [LookupCache],
//! which compares the snapshot against a generation counter that SQLite bumps
//! on every change to either table and reloads it when they differ. Changes made
//! by another connection to the same database file are picked up the same way.

use std::collections::HashMap;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::{Account, AccountId, get_all_accounts},
    category::{Category, CategoryId, CategoryType, get_all_categories},
};

/// What the selectors need to know about a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryEntry {
    pub id: CategoryId,
    pub category_type: CategoryType,
}

/// A snapshot of the category and account names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    categories: HashMap<String, CategoryEntry>,
    accounts: HashMap<String, AccountId>,
}

impl Lookups {
    pub fn new(
        categories: impl IntoIterator<Item = Category>,
        accounts: impl IntoIterator<Item = Account>,
    ) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|category| {
                    (
                        category.name.to_string(),
                        CategoryEntry {
                            id: category.id,
                            category_type: category.category_type,
                        },
                    )
                })
                .collect(),
            accounts: accounts
                .into_iter()
                .map(|account| (account.name.to_string(), account.id))
                .collect(),
        }
    }

    /// Read the current categories and accounts from the database.
    pub fn load(connection: &Connection) -> Result<Self, Error> {
        Ok(Self::new(
            get_all_categories(connection)?,
            get_all_accounts(connection)?,
        ))
    }

    pub fn category(&self, name: &str) -> Option<&CategoryEntry> {
        self.categories.get(name)
    }

    pub fn account(&self, name: &str) -> Option<AccountId> {
        self.accounts.get(name).copied()
    }

    /// The category names in alphabetical order, e.g. for populating a selector.
    pub fn category_names(&self) -> Vec<&str> {
        sorted_keys(&self.categories)
    }

    /// The account names in alphabetical order.
    pub fn account_names(&self) -> Vec<&str> {
        sorted_keys(&self.accounts)
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

/// A [Lookups] snapshot that is reloaded whenever the category or account
/// tables change.
#[derive(Debug, Default)]
pub struct LookupCache {
    snapshot: Option<(i64, Lookups)>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get lookups that reflect the current contents of the database,
    /// reloading them if the category or account tables changed since the
    /// last call.
    pub fn get(&mut self, connection: &Connection) -> Result<&Lookups, Error> {
        let generation = get_lookup_generation(connection)?;

        let snapshot = match self.snapshot.take() {
            Some((loaded_at, lookups)) if loaded_at == generation => (loaded_at, lookups),
            _ => {
                // Read the counter and the tables together so the snapshot is
                // labelled with the generation it was actually read at.
                let transaction =
                    SqlTransaction::new_unchecked(connection, TransactionBehavior::Deferred)?;
                let generation = get_lookup_generation(&transaction)?;
                let lookups = Lookups::load(&transaction)?;
                transaction.commit()?;

                tracing::debug!("Reloaded lookups at generation {generation}");
                (generation, lookups)
            }
        };

        let (_, lookups) = &*self.snapshot.insert(snapshot);

        Ok(lookups)
    }

    /// Drop the snapshot so the next [LookupCache::get] reloads it.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

/// Read the counter that changes whenever a category or account changes.
pub fn get_lookup_generation(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT version FROM lookup_generation WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Create the generation counter and the triggers that bump it.
///
/// Must run after the account and category tables exist.
pub fn create_lookup_generation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS lookup_generation (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO lookup_generation (id, version) VALUES (1, 0);",
    )?;

    for table in ["account", "category"] {
        for event in ["INSERT", "UPDATE", "DELETE"] {
            connection.execute_batch(&format!(
                "CREATE TRIGGER IF NOT EXISTS {table}_{event}_bumps_lookup_generation
                AFTER {event} ON {table}
                BEGIN
                    UPDATE lookup_generation SET version = version + 1 WHERE id = 1;
                END;",
                event = event.to_lowercase()
            ))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        account::{AccountName, create_account, delete_account},
        category::{CategoryName, CategoryType, create_category, update_category},
        db::initialize,
    };

    use super::{LookupCache, get_lookup_generation};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn generation_changes_on_every_write() {
        let conn = get_test_connection();
        let start = get_lookup_generation(&conn).unwrap();

        let account = create_account(AccountName::new("Everyday").unwrap(), &conn).unwrap();
        let after_insert = get_lookup_generation(&conn).unwrap();
        delete_account(account.id, &conn).unwrap();
        let after_delete = get_lookup_generation(&conn).unwrap();

        assert!(after_insert > start);
        assert!(after_delete > after_insert);
    }

    #[test]
    fn cache_reloads_after_category_change() {
        let conn = get_test_connection();
        let mut cache = LookupCache::new();
        let category = create_category(
            CategoryName::new("Food").unwrap(),
            CategoryType::Debit,
            &conn,
        )
        .unwrap();
        assert_eq!(
            cache.get(&conn).unwrap().category("Food").map(|c| c.id),
            Some(category.id)
        );

        update_category(
            category.id,
            CategoryName::new("Groceries").unwrap(),
            CategoryType::Debit,
            &conn,
        )
        .unwrap();

        let lookups = cache.get(&conn).unwrap();
        assert_eq!(lookups.category("Food"), None);
        assert_eq!(lookups.category_names(), vec!["Groceries"]);
    }

    #[test]
    fn cache_sees_writes_from_another_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.db");
        let first = crate::db::open(&path).unwrap();
        initialize(&first).unwrap();
        let second = crate::db::open(&path).unwrap();
        let mut cache = LookupCache::new();
        assert!(cache.get(&first).unwrap().account_names().is_empty());

        create_account(AccountName::new("Savings").unwrap(), &second).unwrap();

        assert_eq!(cache.get(&first).unwrap().account_names(), vec!["Savings"]);
    }

    #[test]
    fn invalidate_forces_reload() {
        let conn = get_test_connection();
        let mut cache = LookupCache::new();
        cache.get(&conn).unwrap();

        cache.invalidate();
        create_account(AccountName::new("Wallet").unwrap(), &conn).unwrap();

        assert_eq!(cache.get(&conn).unwrap().account("Wallet"), Some(1));
    }
}
