//! Defines the transaction record and the operations that create, change and remove it.
//!
//! Every write here runs as a single unit of work (see [atomically]): the
//! referenced category and account are re-read inside the same SQLite
//! transaction as the write, so a category deleted after the front end built
//! its lookups is caught here instead of producing an orphaned row.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_account},
    amount::Amount,
    category::{Category, CategoryId, CategoryType, get_category},
    database_id::TransactionId,
    db::atomically,
    validation::validate_note,
};

// ============================================================================
// MODELS
// ============================================================================

/// A dated movement of money tied to one account and one category.
///
/// To record a new `Transaction`, use [Transaction::build] and [add_transaction].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the money moved through.
    pub account_id: AccountId,
    /// The category of the transaction, which also determines whether it is a
    /// debit or a credit.
    pub category_id: CategoryId,
    /// When the transaction happened.
    pub date: Date,
    /// How much money moved.
    pub amount: Amount,
    /// An optional free-text note, empty if none was given.
    pub remark: String,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [NewTransaction::build] for discoverability.
    pub fn build(
        account_id: AccountId,
        category_id: CategoryId,
        date: Date,
        amount: Amount,
    ) -> NewTransaction {
        NewTransaction::build(account_id, category_id, date, amount)
    }
}

/// The payload for recording a transaction.
///
/// Usually produced by [crate::validation::validate_form] from raw form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: CategoryId,
    /// Must be no later than today. [add_transaction] trusts this field, so
    /// build it with [crate::validation::validate_date].
    pub date: Date,
    pub amount: Amount,
    pub remark: String,
    /// The category type the front end showed the user when they submitted
    /// the form.
    ///
    /// When set, [add_transaction] refuses to record the transaction if the
    /// category's stored type differs, e.g. because the user changed the
    /// category after the type was filled in.
    pub expected_type: Option<CategoryType>,
}

impl NewTransaction {
    pub fn build(
        account_id: AccountId,
        category_id: CategoryId,
        date: Date,
        amount: Amount,
    ) -> Self {
        Self {
            account_id,
            category_id,
            date,
            amount,
            remark: String::new(),
            expected_type: None,
        }
    }

    /// Set the note for the transaction.
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Set the category type to cross-check against the stored category.
    pub fn expected_type(mut self, expected_type: Option<CategoryType>) -> Self {
        self.expected_type = expected_type;
        self
    }
}

/// The fields to replace on an existing transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub date: Option<Date>,
    pub amount: Option<Amount>,
    pub remark: Option<String>,
    /// Checked against the type of the transaction's category after the update.
    pub expected_type: Option<CategoryType>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Record a new transaction and return its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if the category does not exist (any more),
/// - or [Error::TypeMismatch] if `payload.expected_type` disagrees with the category's type,
/// - or [Error::AccountNotFound] if the account does not exist (any more),
/// - or [Error::Input] if the remark is too long,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// Nothing is written when an error is returned.
///
/// The date is not checked against today here, since "today" depends on the
/// user's time zone. Build `payload` with [crate::validation::validate_form]
/// (or check the date with [crate::validation::validate_date]) first.
pub fn add_transaction(
    payload: NewTransaction,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    validate_note(Some(&payload.remark))?;

    let id = atomically(connection, |tx| {
        let category = get_existing_category(payload.category_id, tx)?;
        check_expected_type(payload.expected_type, &category)?;
        ensure_account_exists(payload.account_id, tx)?;

        tx.execute(
            "INSERT INTO \"transaction\" (account_id, category_id, date, amount, remark)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                payload.account_id,
                payload.category_id,
                payload.date,
                payload.amount,
                payload.remark,
            ],
        )?;

        Ok(tx.last_insert_rowid())
    })?;

    tracing::info!(
        "Recorded transaction {id}: {} on {} in category {} from account {}",
        payload.amount,
        payload.date,
        payload.category_id,
        payload.account_id
    );

    Ok(id)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, account_id, category_id, date, amount, remark
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace the fields set in `update` on the transaction `id` and return the
/// updated transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::CategoryNotFound]/[Error::AccountNotFound] if the new category/account does not exist,
/// - or [Error::TypeMismatch] if `update.expected_type` disagrees with the category's type,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if let Some(remark) = &update.remark {
        validate_note(Some(remark))?;
    }

    let transaction = atomically(connection, |tx| {
        let mut transaction = get_transaction(id, tx)?;

        if let Some(category_id) = update.category_id {
            transaction.category_id = category_id;
        }

        if update.category_id.is_some() || update.expected_type.is_some() {
            let category = get_existing_category(transaction.category_id, tx)?;
            check_expected_type(update.expected_type, &category)?;
        }

        if let Some(account_id) = update.account_id {
            ensure_account_exists(account_id, tx)?;
            transaction.account_id = account_id;
        }

        if let Some(date) = update.date {
            transaction.date = date;
        }

        if let Some(amount) = update.amount {
            transaction.amount = amount;
        }

        if let Some(remark) = update.remark {
            transaction.remark = remark;
        }

        tx.execute(
            "UPDATE \"transaction\"
             SET account_id = ?1, category_id = ?2, date = ?3, amount = ?4, remark = ?5
             WHERE id = ?6",
            params![
                transaction.account_id,
                transaction.category_id,
                transaction.date,
                transaction.amount,
                transaction.remark,
                id,
            ],
        )?;

        Ok(transaction)
    })?;

    tracing::info!("Updated transaction {id}");

    Ok(transaction)
}

/// Delete the transaction `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid transaction.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    atomically(connection, |tx| {
        let rows_affected = tx.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    })?;

    tracing::info!("Deleted transaction {id}");

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

fn get_existing_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    get_category(id, connection).map_err(|error| match error {
        Error::NotFound => {
            tracing::warn!("Rejected transaction for missing category {id}");
            Error::CategoryNotFound(id)
        }
        error => error,
    })
}

fn ensure_account_exists(id: AccountId, connection: &Connection) -> Result<(), Error> {
    get_account(id, connection)
        .map(|_| ())
        .map_err(|error| match error {
            Error::NotFound => {
                tracing::warn!("Rejected transaction for missing account {id}");
                Error::AccountNotFound(id)
            }
            error => error,
        })
}

fn check_expected_type(
    expected_type: Option<CategoryType>,
    category: &Category,
) -> Result<(), Error> {
    match expected_type {
        Some(expected) if expected != category.category_type => {
            tracing::warn!(
                "Rejected transaction: category {} is {} but {expected} was submitted",
                category.id,
                category.category_type
            );

            Err(Error::TypeMismatch {
                expected,
                actual: category.category_type,
            })
        }
        _ => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                remark TEXT NOT NULL DEFAULT '' CHECK (length(remark) <= 200),
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_date_id ON \"transaction\"(date, id);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let account_id = row.get(1)?;
    let category_id = row.get(2)?;
    let date = row.get(3)?;
    let amount = row.get(4)?;
    let remark = row.get(5)?;

    Ok(Transaction {
        id,
        account_id,
        category_id,
        date,
        amount,
        remark,
    })
}

// ============================================================================
// TESTS
// ============================================================================
