//! Opening the application's database, creating its tables and running units of work.

use std::path::Path;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    balance::create_balance_tables,
    category::create_category_table,
    lookup::create_lookup_generation_table,
    transaction::create_transaction_table,
};

/// Open the SQLite database at `path`, creating the file if needed.
///
/// Foreign key enforcement is a per-connection setting in SQLite, so every
/// connection must be opened through this function (or [initialize]).
pub fn open(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    enable_foreign_keys(&connection)?;

    Ok(connection)
}

/// Create any missing tables, indexes and triggers.
///
/// Safe to call on a database that is already initialized.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    enable_foreign_keys(connection)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_balance_tables(&transaction)?;
    create_lookup_generation_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn enable_foreign_keys(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)
}

/// Run `operation` as one unit of work.
///
/// The operation's reads and writes happen inside a single SQLite transaction
/// that is committed if `operation` returns `Ok` and rolled back if it returns
/// `Err`, so a failed operation leaves nothing behind. The transaction takes
/// the write lock up front, which means checks made by `operation` still hold
/// when it commits.
///
/// Units of work do not nest: `operation` must not call `atomically` again.
pub fn atomically<T, F>(connection: &Connection, operation: F) -> Result<T, Error>
where
    F: FnOnce(&SqlTransaction) -> Result<T, Error>,
{
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    match operation(&transaction) {
        Ok(value) => {
            transaction.commit()?;
            Ok(value)
        }
        Err(error) => {
            tracing::debug!("Rolling back unit of work: {error}");

            if let Err(rollback_error) = transaction.rollback() {
                tracing::error!("Could not roll back unit of work: {rollback_error}");
            }

            Err(error)
        }
    }
}
