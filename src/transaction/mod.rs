//! Recording, listing and summarising transactions.
//!
//! This module contains:
//! - The `Transaction` model and `NewTransaction` payload for recording transactions
//! - The recorder functions that add, update and delete transactions as single units of work
//! - Filtered listing and monthly/category summaries

mod core;
mod query;
mod summary;

pub use core::{
    NewTransaction, Transaction, TransactionUpdate, add_transaction, count_transactions,
    create_transaction_table, delete_transaction, get_transaction, map_transaction_row,
    update_transaction,
};
pub use query::{
    ALL_CATEGORIES, CategoryFilter, TransactionFilter, TransactionRow, query_transactions,
};
pub use summary::{CategorySummary, MonthlySummary, summary_by_category, summary_by_month};
