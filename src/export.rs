//! Exporting transactions as CSV.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use time::Date;

use crate::{Error, category::CategoryType, transaction::TransactionRow};

#[derive(Serialize)]
struct ExportRow<'a> {
    id: i64,
    date: String,
    account: &'a str,
    category: &'a str,
    #[serde(rename = "type")]
    category_type: CategoryType,
    amount: String,
    remark: &'a str,
}

/// Write `rows` as CSV with a header row to `writer`.
pub fn export_transactions_csv<W: Write>(rows: &[TransactionRow], writer: W) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for row in rows {
        writer.serialize(ExportRow {
            id: row.id,
            date: row.date.to_string(),
            account: &row.account_name,
            category: &row.category_name,
            category_type: row.category_type,
            amount: row.amount.to_string(),
            remark: &row.remark,
        })?;
    }

    // The header is only written with the first record.
    if rows.is_empty() {
        writer.write_record([
            "id", "date", "account", "category", "type", "amount", "remark",
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Write `rows` to `transactions-YYYY-MM-DD.csv` in `dir`, creating `dir` if
/// needed, and return the path of the new file.
pub fn export_to_dir(rows: &[TransactionRow], dir: &Path, today: Date) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("transactions-{today}.csv"));
    let file = fs::File::create(&path)?;
    export_transactions_csv(rows, file)?;

    tracing::info!("Exported {} transactions to {}", rows.len(), path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{amount::Amount, category::CategoryType, transaction::TransactionRow};

    use super::{export_to_dir, export_transactions_csv};

    fn row() -> TransactionRow {
        TransactionRow {
            id: 3,
            date: date!(2024 - 01 - 15),
            amount: Amount::new(Decimal::new(425, 1)).unwrap(),
            remark: "lunch, with friends".to_owned(),
            account_id: 1,
            account_name: "Everyday".to_owned(),
            category_id: 2,
            category_name: "Food".to_owned(),
            category_type: CategoryType::Debit,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut output = Vec::new();

        export_transactions_csv(&[row()], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,date,account,category,type,amount,remark\n\
             3,2024-01-15,Everyday,Food,Debit,42.50,\"lunch, with friends\"\n"
        );
    }

    #[test]
    fn writes_header_when_empty() {
        let mut output = Vec::new();

        export_transactions_csv(&[], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,date,account,category,type,amount,remark\n"
        );
    }

    #[test]
    fn writes_dated_file_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("exports");

        let path = export_to_dir(&[row()], &export_dir, date!(2024 - 02 - 01)).unwrap();

        assert_eq!(path, export_dir.join("transactions-2024-02-01.csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("id,date,account,category,type,amount,remark\n"));
        assert_eq!(contents.lines().count(), 2);
    }
}
