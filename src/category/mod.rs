//! Categories classify transactions, e.g. "Groceries" (Debit) or "Salary" (Credit).

mod db;
mod domain;

pub use db::{
    create_category, create_category_table, delete_category, get_all_categories, get_category,
    map_category_row, update_category,
};
pub use domain::{Category, CategoryId, CategoryName, CategoryType};
