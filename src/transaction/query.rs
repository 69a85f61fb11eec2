//! Listing transactions for display, optionally filtered by date range and category.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::AccountId,
    amount::Amount,
    category::{CategoryId, CategoryType},
    database_id::TransactionId,
    lookup::Lookups,
    validation::{InputError, validate_category},
};

/// The value of the category filter selector that shows every category.
pub const ALL_CATEGORIES: &str = "All";

/// Which categories to include when listing transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    /// Resolve the category filter selector.
    ///
    /// An empty selection or [ALL_CATEGORIES] means no filter; anything else
    /// must name a known category.
    pub fn from_selection(selected: &str, lookups: &Lookups) -> Result<Self, InputError> {
        let selected = selected.trim();

        if selected.is_empty() || selected == ALL_CATEGORIES {
            return Ok(Self::All);
        }

        validate_category(selected, lookups).map(Self::Only)
    }
}

/// Filters for [query_transactions]. Both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category: CategoryFilter,
}

/// A transaction joined with the names of its account and category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub date: Date,
    pub amount: Amount,
    pub remark: String,
    pub account_id: AccountId,
    pub account_name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_type: CategoryType,
}

/// List the transactions matching `filter`, newest first.
///
/// Transactions on the same date are ordered by descending ID, i.e. the most
/// recently recorded first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn query_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    let category_id = match filter.category {
        CategoryFilter::All => None,
        CategoryFilter::Only(id) => Some(id),
    };

    connection
        .prepare(
            "SELECT t.id, t.date, t.amount, t.remark, a.id, a.name, c.id, c.name, c.category_type
             FROM \"transaction\" t
             INNER JOIN account a ON a.id = t.account_id
             INNER JOIN category c ON c.id = t.category_id
             WHERE (?1 IS NULL OR t.date >= ?1)
               AND (?2 IS NULL OR t.date <= ?2)
               AND (?3 IS NULL OR t.category_id = ?3)
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            params![filter.start_date, filter.end_date, category_id],
            map_transaction_row_with_names,
        )?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn map_transaction_row_with_names(row: &Row) -> Result<TransactionRow, rusqlite::Error> {
    Ok(TransactionRow {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        remark: row.get(3)?,
        account_id: row.get(4)?,
        account_name: row.get(5)?,
        category_id: row.get(6)?,
        category_name: row.get(7)?,
        category_type: row.get(8)?,
    })
}
