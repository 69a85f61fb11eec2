use rusqlite::{Connection, OptionalExtension, Row, ffi};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::AccountId,
    amount::{from_cents, round_money, to_cents},
    database_id::DatabaseId,
    error::is_constraint_violation,
};

/// The balance an account started with before any recorded transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialBalance {
    /// The id for the initial balance.
    pub id: DatabaseId,
    /// The account the balance belongs to.
    pub account_id: AccountId,
    /// The balance, which may be negative (e.g. for a credit card).
    pub balance: Decimal,
}

/// The balance of an account as observed on a given date, e.g. from a bank statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualBalance {
    /// The id for the balance observation.
    pub id: DatabaseId,
    /// The account the balance belongs to.
    pub account_id: AccountId,
    /// When the balance was observed.
    pub date: Date,
    /// The observed balance.
    pub amount: Decimal,
}

pub fn create_balance_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS initial_balance (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL UNIQUE,
            balance INTEGER NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE TABLE IF NOT EXISTS actual_balance (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_actual_balance_account_date
            ON actual_balance(account_id, date);",
    )?;

    Ok(())
}

/// Set the initial balance for an account, replacing any previous initial balance.
///
/// `balance` is rounded to two decimal places.
///
/// # Errors
/// Returns [Error::AccountNotFound] if `account_id` does not refer to an account.
pub fn set_initial_balance(
    account_id: AccountId,
    balance: Decimal,
    connection: &Connection,
) -> Result<InitialBalance, Error> {
    let cents = to_cents(round_money(balance)?);

    let initial_balance = connection
        .prepare(
            "INSERT INTO initial_balance (account_id, balance) VALUES (?1, ?2)
             ON CONFLICT(account_id) DO UPDATE SET balance = excluded.balance
             RETURNING id, account_id, balance",
        )?
        .query_row((account_id, cents), map_initial_balance_row)
        .map_err(|error| map_missing_account(error, account_id))?;

    tracing::info!("Set initial balance of account {account_id} to {cents} cents");

    Ok(initial_balance)
}

/// Get the initial balance of an account, if one has been set.
pub fn get_initial_balance(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Option<InitialBalance>, Error> {
    connection
        .prepare("SELECT id, account_id, balance FROM initial_balance WHERE account_id = :id")?
        .query_row(&[(":id", &account_id)], map_initial_balance_row)
        .optional()
        .map_err(Error::from)
}

/// Record the balance of an account on `date`.
///
/// # Errors
/// Returns [Error::AccountNotFound] if `account_id` does not refer to an account.
pub fn add_actual_balance(
    account_id: AccountId,
    date: Date,
    amount: Decimal,
    connection: &Connection,
) -> Result<ActualBalance, Error> {
    let cents = to_cents(round_money(amount)?);

    let actual_balance = connection
        .prepare(
            "INSERT INTO actual_balance (account_id, date, amount) VALUES (?1, ?2, ?3)
             RETURNING id, account_id, date, amount",
        )?
        .query_row((account_id, date, cents), map_actual_balance_row)
        .map_err(|error| map_missing_account(error, account_id))?;

    tracing::info!(
        "Recorded balance {} for account {account_id} on {date}",
        actual_balance.amount
    );

    Ok(actual_balance)
}

/// Get the recorded balances of an account, oldest first.
pub fn get_actual_balances(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<ActualBalance>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, date, amount FROM actual_balance
             WHERE account_id = :id
             ORDER BY date ASC, id ASC",
        )?
        .query_map(&[(":id", &account_id)], map_actual_balance_row)?
        .map(|maybe_balance| maybe_balance.map_err(Error::from))
        .collect()
}

fn map_initial_balance_row(row: &Row) -> Result<InitialBalance, rusqlite::Error> {
    Ok(InitialBalance {
        id: row.get(0)?,
        account_id: row.get(1)?,
        balance: from_cents(row.get(2)?),
    })
}

fn map_actual_balance_row(row: &Row) -> Result<ActualBalance, rusqlite::Error> {
    Ok(ActualBalance {
        id: row.get(0)?,
        account_id: row.get(1)?,
        date: row.get(2)?,
        amount: from_cents(row.get(3)?),
    })
}

fn map_missing_account(error: rusqlite::Error, account_id: AccountId) -> Error {
    if is_constraint_violation(&error, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
        Error::AccountNotFound(account_id)
    } else {
        error.into()
    }
}
