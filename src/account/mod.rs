//! Accounts that transactions and balances are recorded against.

mod core;

pub use core::{
    Account, AccountId, AccountName, create_account, create_account_table, delete_account,
    get_account, get_all_accounts, map_row_to_account,
};
