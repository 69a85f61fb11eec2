//! Defines the app level error type and how each error is classified for the user.

use crate::{
    account::AccountId,
    category::{CategoryId, CategoryType},
    validation::InputError,
};

/// The broad class of an [Error], which tells the front end how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A form field was malformed, missing or out of range.
    ///
    /// The user should correct the field and submit again.
    Input,
    /// Something the operation refers to no longer exists or is still in use.
    ///
    /// The front end should refresh its lookups (and transaction list) before
    /// the user tries again.
    Referential,
    /// The storage layer or the environment failed.
    ///
    /// The operation was aborted without writing anything.
    Persistence,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A raw form field failed validation.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The category referenced by a transaction does not exist.
    ///
    /// This happens when the category was deleted after the front end built
    /// its lookups.
    #[error("the category with ID {0} no longer exists, refresh and try again")]
    CategoryNotFound(CategoryId),

    /// The account referenced by a transaction or balance does not exist.
    #[error("the account with ID {0} no longer exists, refresh and try again")]
    AccountNotFound(AccountId),

    /// The category type submitted with a transaction disagrees with the
    /// type stored for the category.
    #[error("the category is {actual} but the transaction was submitted as {expected}")]
    TypeMismatch {
        /// The type the front end submitted.
        expected: CategoryType,
        /// The type stored for the category.
        actual: CategoryType,
    },

    /// Tried to delete a category that transactions still refer to.
    #[error("the category with ID {0} is still used by transactions")]
    CategoryInUse(CategoryId),

    /// Tried to delete an account that transactions or balances still refer to.
    #[error("the account with ID {0} is still used by transactions or balances")]
    AccountInUse(AccountId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Reading or writing a file failed.
    #[error("file error: {0}")]
    Io(String),

    /// Writing CSV failed.
    #[error("could not write CSV: {0}")]
    Csv(String),
}

impl Error {
    /// Classify the error for the front end.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) | Error::DuplicateAccountName(_) | Error::DuplicateCategoryName(_) => {
                ErrorKind::Input
            }
            Error::CategoryNotFound(_)
            | Error::AccountNotFound(_)
            | Error::TypeMismatch { .. }
            | Error::CategoryInUse(_)
            | Error::AccountInUse(_)
            | Error::NotFound => ErrorKind::Referential,
            Error::InvalidTimezone(_) | Error::SqlError(_) | Error::Io(_) | Error::Csv(_) => {
                ErrorKind::Persistence
            }
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Csv(value.to_string())
    }
}

/// Whether `error` is a SQLite constraint violation with the given extended code,
/// e.g. [rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE].
pub(crate) fn is_constraint_violation(error: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == extended_code
    )
}

/// Whether `error` is a failed foreign key check.
///
/// SQLite reports a foreign key failure raised while an AFTER trigger runs on
/// the same statement as a trigger constraint, so both codes are accepted.
pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    is_constraint_violation(error, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
        || is_constraint_violation(error, rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER)
}

#[cfg(test)]
mod tests {
    use crate::{
        Error, ErrorKind,
        category::CategoryType,
        validation::{InputError, Selection},
    };

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn errors_are_classified() {
        assert_eq!(
            Error::from(InputError::NoSelection(Selection::Category)).kind(),
            ErrorKind::Input
        );
        assert_eq!(Error::CategoryNotFound(1).kind(), ErrorKind::Referential);
        assert_eq!(
            Error::TypeMismatch {
                expected: CategoryType::Credit,
                actual: CategoryType::Debit
            }
            .kind(),
            ErrorKind::Referential
        );
        assert_eq!(
            Error::SqlError(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn input_errors_display_their_own_message() {
        let error = Error::from(InputError::EmptyAmount);

        assert_eq!(error.to_string(), "Amount cannot be empty.");
    }
}
