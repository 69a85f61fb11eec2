//! Opening balances and dated balance observations for accounts.

mod core;

pub use core::{
    ActualBalance, InitialBalance, add_actual_balance, create_balance_tables,
    get_actual_balances, get_initial_balance, set_initial_balance,
};
