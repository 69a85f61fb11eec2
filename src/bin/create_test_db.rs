use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    account::{AccountName, create_account},
    amount::Amount,
    balance::set_initial_balance,
    category::{CategoryName, CategoryType, create_category},
    db, initialize_db,
    transaction::{Transaction, add_transaction},
};

/// A utility for creating a test database for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = db::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating accounts and categories...");

    let everyday = create_account(AccountName::new("Everyday")?, &conn)?;
    let savings = create_account(AccountName::new("Savings")?, &conn)?;
    set_initial_balance(everyday.id, Decimal::new(150_000, 2), &conn)?;
    set_initial_balance(savings.id, Decimal::new(1_000_000, 2), &conn)?;

    let salary = create_category(CategoryName::new("Salary")?, CategoryType::Credit, &conn)?;
    let groceries = create_category(
        CategoryName::new("Groceries")?,
        CategoryType::Debit,
        &conn,
    )?;
    let rent = create_category(CategoryName::new("Rent")?, CategoryType::Debit, &conn)?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();

    for week in 0..12 {
        let date = today - Duration::weeks(week);

        let groceries_amount = Amount::new(Decimal::new(8540 + week * 125, 2))?;
        add_transaction(
            Transaction::build(everyday.id, groceries.id, date, groceries_amount)
                .remark("Weekly shop"),
            &conn,
        )?;

        if week % 2 == 0 {
            let pay = Amount::new(Decimal::new(240_000, 2))?;
            add_transaction(
                Transaction::build(everyday.id, salary.id, date, pay).remark("Pay"),
                &conn,
            )?;
        }

        if week % 4 == 0 {
            let rent_amount = Amount::new(Decimal::new(180_000, 2))?;
            add_transaction(
                Transaction::build(everyday.id, rent.id, date, rent_amount),
                &conn,
            )?;
        }
    }

    println!("Success!");

    Ok(())
}
