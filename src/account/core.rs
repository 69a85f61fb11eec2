use std::fmt::Display;

use rusqlite::{Connection, ffi};
use serde::Serialize;

use crate::{
    Error,
    db::atomically,
    error::{is_constraint_violation, is_foreign_key_violation},
    validation::InputError,
};

pub type AccountId = i64;

/// A validated, non-empty account name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AccountName(String);

impl AccountName {
    /// Create an account name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return an [InputError::EmptyName] if `name` is empty
    /// or only whitespace.
    pub fn new(name: &str) -> Result<Self, InputError> {
        let name = name.trim();

        if name.is_empty() {
            Err(InputError::EmptyName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for AccountName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank account, credit card or wallet that money moves through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The unique name of the account.
    pub name: AccountName,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;

    Ok(Account {
        id,
        name: AccountName(name),
    })
}

/// Create an account and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if an account with the same name exists,
/// or [Error::SqlError] for any other SQL error.
pub fn create_account(name: AccountName, connection: &Connection) -> Result<Account, Error> {
    connection
        .execute("INSERT INTO account (name) VALUES (?1)", (name.as_ref(),))
        .map_err(|error| {
            if is_constraint_violation(&error, ffi::SQLITE_CONSTRAINT_UNIQUE) {
                Error::DuplicateAccountName(name.to_string())
            } else {
                error.into()
            }
        })?;

    let id = connection.last_insert_rowid();
    tracing::info!("Created account {id} \"{name}\"");

    Ok(Account { id, name })
}

/// Retrieve a single account by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an account.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, name FROM account WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| error.into())
}

/// Retrieve all accounts ordered alphabetically by name.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name FROM account ORDER BY name ASC")?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Delete an account by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the account doesn't exist, or
/// [Error::AccountInUse] if transactions or balances still refer to it.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    atomically(connection, |tx| {
        let in_use: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE account_id = ?1)
                 OR EXISTS(SELECT 1 FROM initial_balance WHERE account_id = ?1)
                 OR EXISTS(SELECT 1 FROM actual_balance WHERE account_id = ?1)",
            [id],
            |row| row.get(0),
        )?;

        if in_use {
            tracing::warn!("Refused to delete account {id}, it has transactions or balances");
            return Err(Error::AccountInUse(id));
        }

        let rows_affected = tx
            .execute("DELETE FROM account WHERE id = ?1", [id])
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    Error::AccountInUse(id)
                } else {
                    error.into()
                }
            })?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    })?;

    tracing::info!("Deleted account {id}");

    Ok(())
}

#[cfg(test)]
mod account_name_tests {
    use crate::validation::InputError;

    use super::AccountName;

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(AccountName::new(" \t\n"), Err(InputError::EmptyName));
    }

    #[test]
    fn new_trims_whitespace() {
        let name = AccountName::new("  Everyday ").unwrap();

        assert_eq!(name.as_ref(), "Everyday");
    }
}

#[cfg(test)]
mod account_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize};

    use super::{AccountName, create_account, delete_account, get_account, get_all_accounts};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_account_succeeds() {
        let conn = get_test_connection();
        let name = AccountName::new("Everyday").unwrap();

        let account = create_account(name.clone(), &conn).expect("Could not create account");

        assert!(account.id > 0);
        assert_eq!(account.name, name);
        assert_eq!(get_account(account.id, &conn), Ok(account));
    }

    #[test]
    fn create_fails_on_duplicate_name() {
        let conn = get_test_connection();
        create_account(AccountName::new("Savings").unwrap(), &conn).unwrap();

        let result = create_account(AccountName::new("Savings").unwrap(), &conn);

        assert_eq!(result, Err(Error::DuplicateAccountName("Savings".to_owned())));
    }

    #[test]
    fn get_all_accounts_orders_by_name() {
        let conn = get_test_connection();
        create_account(AccountName::new("Savings").unwrap(), &conn).unwrap();
        create_account(AccountName::new("Credit Card").unwrap(), &conn).unwrap();

        let names: Vec<String> = get_all_accounts(&conn)
            .unwrap()
            .into_iter()
            .map(|account| account.name.to_string())
            .collect();

        assert_eq!(names, vec!["Credit Card", "Savings"]);
    }

    #[test]
    fn delete_missing_account_returns_not_found() {
        let conn = get_test_connection();

        assert_eq!(delete_account(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_account_with_transactions_is_rejected() {
        let conn = get_test_connection();
        let account = create_account(AccountName::new("Everyday").unwrap(), &conn).unwrap();
        conn.execute(
            "INSERT INTO category (id, name, category_type) VALUES (1, 'Food', 'Debit')",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO \"transaction\" (account_id, category_id, date, amount, remark)
             VALUES (?1, 1, ?2, 100, '')",
            (account.id, date!(2024 - 01 - 15)),
        )
        .unwrap();

        let result = delete_account(account.id, &conn);

        assert_eq!(result, Err(Error::AccountInUse(account.id)));
        assert!(get_account(account.id, &conn).is_ok());
    }

    #[test]
    fn deleted_account_id_is_not_reused() {
        let conn = get_test_connection();
        create_account(AccountName::new("Everyday").unwrap(), &conn).unwrap();
        let savings = create_account(AccountName::new("Savings").unwrap(), &conn).unwrap();
        delete_account(savings.id, &conn).unwrap();

        let wallet = create_account(AccountName::new("Wallet").unwrap(), &conn).unwrap();

        assert_ne!(wallet.id, savings.id);
        assert_eq!(get_account(savings.id, &conn), Err(Error::NotFound));
    }
}
