//! Expense Tracker records personal income and expenses against accounts and
//! categories in a local SQLite database.
//!
//! This library provides the validation and recording core: form validators
//! that turn raw user input into typed values, and a recorder that writes each
//! transaction as a single unit of work after re-checking that everything it
//! refers to still exists.

pub mod account;
pub mod amount;
pub mod balance;
pub mod category;
pub mod config;
mod database_id;
pub mod db;
mod error;
pub mod export;
pub mod logging;
pub mod lookup;
mod timezone;
pub mod transaction;
pub mod validation;

pub use config::Config;
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use error::{Error, ErrorKind};
pub use timezone::local_today;
