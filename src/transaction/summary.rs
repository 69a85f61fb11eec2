//! Totals of transactions grouped by month or by category.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    amount::from_cents,
    category::{CategoryId, CategoryType},
};

/// Debit and credit totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The month in the format "YYYY-MM".
    pub month: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Credits minus debits. Negative when more was spent than earned.
    pub net: Decimal,
}

/// The total of all transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_type: CategoryType,
    pub total: Decimal,
}

/// Total debits and credits per month, newest month first.
///
/// Months without transactions are omitted.
pub fn summary_by_month(connection: &Connection) -> Result<Vec<MonthlySummary>, Error> {
    connection
        .prepare(
            "SELECT substr(t.date, 1, 7) AS month,
                    COALESCE(SUM(CASE WHEN c.category_type = 'Debit' THEN t.amount END), 0),
                    COALESCE(SUM(CASE WHEN c.category_type = 'Credit' THEN t.amount END), 0)
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             GROUP BY month
             ORDER BY month DESC",
        )?
        .query_map([], |row| {
            let debit: i64 = row.get(1)?;
            let credit: i64 = row.get(2)?;

            Ok(MonthlySummary {
                month: row.get(0)?,
                debit: from_cents(debit),
                credit: from_cents(credit),
                net: from_cents(credit - debit),
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(Error::from))
        .collect()
}

/// Total per category for transactions between `start_date` and `end_date`
/// (both inclusive, either may be omitted), largest total first.
///
/// Categories without matching transactions are omitted.
pub fn summary_by_category(
    start_date: Option<Date>,
    end_date: Option<Date>,
    connection: &Connection,
) -> Result<Vec<CategorySummary>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, c.category_type, SUM(t.amount) AS total
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE (?1 IS NULL OR t.date >= ?1)
               AND (?2 IS NULL OR t.date <= ?2)
             GROUP BY c.id
             ORDER BY total DESC, c.name ASC",
        )?
        .query_map(params![start_date, end_date], |row| {
            let total: i64 = row.get(3)?;

            Ok(CategorySummary {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                category_type: row.get(2)?,
                total: from_cents(total),
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(Error::from))
        .collect()
}
