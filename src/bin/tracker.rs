use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::filter::LevelFilter;

use expense_tracker::{
    Config, Error, ErrorKind,
    account::{AccountName, create_account, delete_account, get_all_accounts},
    balance::{add_actual_balance, get_actual_balances, get_initial_balance, set_initial_balance},
    category::{
        CategoryName, CategoryType, create_category, delete_category, get_all_categories,
        update_category,
    },
    config::{DEFAULT_DB_PATH, DEFAULT_EXPORT_DIR, DEFAULT_TIMEZONE},
    db, export, initialize_db,
    logging::init_logging,
    lookup::Lookups,
    transaction::{
        ALL_CATEGORIES, CategoryFilter, TransactionFilter, TransactionRow, TransactionUpdate,
        add_transaction, delete_transaction, query_transactions, summary_by_category,
        summary_by_month, update_transaction,
    },
    validation::{
        TransactionForm, parse_filter_date, validate_account, validate_amount, validate_balance,
        validate_category, validate_category_type, validate_date, validate_form, validate_note,
    },
};

/// Record and review personal income and expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path to the application SQLite database.
    #[arg(long, env = "EXPENSE_TRACKER_DB", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,

    /// Canonical timezone name used to decide what "today" is, e.g. "Pacific/Auckland".
    #[arg(long, env = "EXPENSE_TRACKER_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Directory that exports are written to.
    #[arg(long, env = "EXPENSE_TRACKER_EXPORT_DIR", default_value = DEFAULT_EXPORT_DIR)]
    export_dir: PathBuf,

    /// Level of the logs written to stderr.
    #[arg(long, env = "EXPENSE_TRACKER_LOG_LEVEL", default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// Optional file that receives debug logs.
    #[arg(long, env = "EXPENSE_TRACKER_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            db_path: self.db_path.clone(),
            local_timezone: self.timezone.clone(),
            export_dir: self.export_dir.clone(),
            log_level: self.log_level,
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and its tables.
    Init,
    /// Manage accounts.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage categories.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Record a new transaction.
    Add(TransactionFields),
    /// Change fields of an existing transaction.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: TransactionFields,
    },
    /// Delete a transaction.
    Delete { id: i64 },
    /// List transactions, newest first.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Print the transactions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show totals.
    #[command(subcommand)]
    Summary(SummaryCommand),
    /// Manage account balances.
    #[command(subcommand)]
    Balance(BalanceCommand),
    /// Export transactions as CSV into the export directory.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Add { name: String },
    List,
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add {
        name: String,
        /// "Debit" or "Credit".
        #[arg(long = "type")]
        category_type: String,
    },
    List,
    Update {
        name: String,
        /// The new name, defaults to the current one.
        #[arg(long)]
        new_name: Option<String>,
        /// The new type, defaults to the current one.
        #[arg(long = "type")]
        category_type: Option<String>,
    },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum SummaryCommand {
    /// Debit and credit totals per month.
    Month,
    /// Totals per category.
    Category {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BalanceCommand {
    /// Set the opening balance of an account.
    SetInitial {
        #[arg(long)]
        account: String,
        #[arg(long)]
        balance: String,
    },
    /// Show the opening balance of an account.
    Initial {
        #[arg(long)]
        account: String,
    },
    /// Record the balance of an account on a date.
    AddActual {
        #[arg(long)]
        account: String,
        /// Defaults to today.
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long)]
        amount: String,
    },
    /// List the recorded balances of an account.
    Actual {
        #[arg(long)]
        account: String,
    },
}

/// The raw transaction form fields.
#[derive(Args, Debug)]
struct TransactionFields {
    /// YYYY-MM-DD, defaults to today when adding.
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    amount: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    account: Option<String>,
    /// "Debit" or "Credit", defaults to the category's type when adding.
    #[arg(long = "type")]
    category_type: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Earliest date to include, YYYY-MM-DD.
    #[arg(long)]
    start: Option<String>,
    /// Latest date to include, YYYY-MM-DD.
    #[arg(long)]
    end: Option<String>,
    /// Category name, or "All".
    #[arg(long, default_value = ALL_CATEGORIES)]
    category: String,
}

impl FilterArgs {
    fn resolve(&self, lookups: &Lookups) -> Result<TransactionFilter, Error> {
        Ok(TransactionFilter {
            start_date: parse_filter_date(self.start.as_deref())?,
            end_date: parse_filter_date(self.end.as_deref())?,
            category: CategoryFilter::from_selection(&self.category, lookups)?,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();

    if let Err(error) = init_logging(config.log_level, config.log_file.as_deref()) {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");

            if error.kind() == ErrorKind::Referential {
                eprintln!("The data changed since it was last read, check the lists and try again.");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> Result<(), Error> {
    let conn = db::open(&config.db_path)?;
    initialize_db(&conn)?;

    match command {
        Command::Init => {
            println!("Database ready at {}", config.db_path.display());
        }
        Command::Account(command) => run_account(command, &conn)?,
        Command::Category(command) => run_category(command, &conn)?,
        Command::Add(fields) => {
            let lookups = Lookups::load(&conn)?;
            let category = fields.category.unwrap_or_default();
            let category_type = fields.category_type.unwrap_or_else(|| {
                lookups
                    .category(category.trim())
                    .map(|entry| entry.category_type.to_string())
                    .unwrap_or_default()
            });
            let form = TransactionForm {
                date: fields.date.unwrap_or_default(),
                amount: fields.amount.unwrap_or_default(),
                category,
                account: fields.account.unwrap_or_default(),
                category_type,
                note: fields.note,
            };

            let payload = validate_form(&form, &lookups, config.today()?)?;
            let id = add_transaction(payload, &conn)?;
            println!("Recorded transaction {id}");
        }
        Command::Edit { id, fields } => {
            let lookups = Lookups::load(&conn)?;
            let update = build_update(fields, &lookups, config)?;
            let transaction = update_transaction(id, update, &conn)?;
            println!(
                "Updated transaction {id}: {} {}",
                transaction.date, transaction.amount
            );
        }
        Command::Delete { id } => {
            delete_transaction(id, &conn)?;
            println!("Deleted transaction {id}");
        }
        Command::List { filter, json } => {
            let lookups = Lookups::load(&conn)?;
            let rows = query_transactions(&filter.resolve(&lookups)?, &conn)?;

            if json {
                let mut stdout = std::io::stdout().lock();
                serde_json::to_writer_pretty(&mut stdout, &rows).map_err(std::io::Error::from)?;
                writeln!(stdout)?;
            } else {
                print_rows(&rows);
            }
        }
        Command::Summary(SummaryCommand::Month) => {
            for month in summary_by_month(&conn)? {
                println!(
                    "{}  debit {:>12}  credit {:>12}  net {:>12}",
                    month.month, month.debit, month.credit, month.net
                );
            }
        }
        Command::Summary(SummaryCommand::Category { start, end }) => {
            let start = parse_filter_date(start.as_deref())?;
            let end = parse_filter_date(end.as_deref())?;

            for category in summary_by_category(start, end, &conn)? {
                println!(
                    "{:<24} {:<6} {:>12}",
                    category.category_name, category.category_type, category.total
                );
            }
        }
        Command::Balance(command) => run_balance(command, &conn, config)?,
        Command::Export { filter } => {
            let lookups = Lookups::load(&conn)?;
            let rows = query_transactions(&filter.resolve(&lookups)?, &conn)?;
            let path = export::export_to_dir(&rows, &config.export_dir, config.today()?)?;
            println!("Exported {} transactions to {}", rows.len(), path.display());
        }
    }

    Ok(())
}

fn run_account(command: AccountCommand, conn: &Connection) -> Result<(), Error> {
    match command {
        AccountCommand::Add { name } => {
            let account = create_account(AccountName::new(&name)?, conn)?;
            println!("Created account {} \"{}\"", account.id, account.name);
        }
        AccountCommand::List => {
            for account in get_all_accounts(conn)? {
                println!("{:>4}  {}", account.id, account.name);
            }
        }
        AccountCommand::Delete { name } => {
            let id = validate_account(&name, &Lookups::load(conn)?)?;
            delete_account(id, conn)?;
            println!("Deleted account \"{}\"", name.trim());
        }
    }

    Ok(())
}

fn run_category(command: CategoryCommand, conn: &Connection) -> Result<(), Error> {
    match command {
        CategoryCommand::Add {
            name,
            category_type,
        } => {
            let category_type = validate_category_type(&category_type, &CategoryType::ALL)?;
            let category = create_category(CategoryName::new(&name)?, category_type, conn)?;
            println!(
                "Created category {} \"{}\" ({})",
                category.id, category.name, category.category_type
            );
        }
        CategoryCommand::List => {
            for category in get_all_categories(conn)? {
                println!(
                    "{:>4}  {:<24} {}",
                    category.id, category.name, category.category_type
                );
            }
        }
        CategoryCommand::Update {
            name,
            new_name,
            category_type,
        } => {
            let lookups = Lookups::load(conn)?;
            let id = validate_category(&name, &lookups)?;
            let new_name = CategoryName::new(new_name.as_deref().unwrap_or(&name))?;
            let category_type = match category_type {
                Some(category_type) => {
                    validate_category_type(&category_type, &CategoryType::ALL)?
                }
                None => lookups
                    .category(name.trim())
                    .map(|entry| entry.category_type)
                    .ok_or(Error::CategoryNotFound(id))?,
            };

            let category = update_category(id, new_name, category_type, conn)?;
            println!(
                "Updated category {} \"{}\" ({})",
                category.id, category.name, category.category_type
            );
        }
        CategoryCommand::Delete { name } => {
            let id = validate_category(&name, &Lookups::load(conn)?)?;
            delete_category(id, conn)?;
            println!("Deleted category \"{}\"", name.trim());
        }
    }

    Ok(())
}

fn run_balance(command: BalanceCommand, conn: &Connection, config: &Config) -> Result<(), Error> {
    let lookups = Lookups::load(conn)?;

    match command {
        BalanceCommand::SetInitial { account, balance } => {
            let account_id = validate_account(&account, &lookups)?;
            let balance = set_initial_balance(account_id, validate_balance(&balance)?, conn)?;
            println!("Initial balance of \"{}\" is {}", account.trim(), balance.balance);
        }
        BalanceCommand::Initial { account } => {
            let account_id = validate_account(&account, &lookups)?;
            match get_initial_balance(account_id, conn)? {
                Some(balance) => println!("{}", balance.balance),
                None => println!("No initial balance set for \"{}\"", account.trim()),
            }
        }
        BalanceCommand::AddActual {
            account,
            date,
            amount,
        } => {
            let account_id = validate_account(&account, &lookups)?;
            let date = validate_date(&date, config.today()?)?;
            let balance = add_actual_balance(account_id, date, validate_balance(&amount)?, conn)?;
            println!(
                "Recorded balance {} for \"{}\" on {}",
                balance.amount,
                account.trim(),
                balance.date
            );
        }
        BalanceCommand::Actual { account } => {
            let account_id = validate_account(&account, &lookups)?;
            for balance in get_actual_balances(account_id, conn)? {
                println!("{}  {:>12}", balance.date, balance.amount);
            }
        }
    }

    Ok(())
}

/// Validate each field given on the command line and leave the rest unchanged.
fn build_update(
    fields: TransactionFields,
    lookups: &Lookups,
    config: &Config,
) -> Result<TransactionUpdate, Error> {
    let date = match fields.date {
        Some(date) => Some(validate_date(&date, config.today()?)?),
        None => None,
    };

    Ok(TransactionUpdate {
        account_id: fields
            .account
            .map(|account| validate_account(&account, lookups))
            .transpose()?,
        category_id: fields
            .category
            .map(|category| validate_category(&category, lookups))
            .transpose()?,
        date,
        amount: fields
            .amount
            .map(|amount| validate_amount(&amount))
            .transpose()?,
        remark: fields
            .note
            .map(|note| validate_note(Some(note.trim())))
            .transpose()?,
        expected_type: fields
            .category_type
            .map(|category_type| validate_category_type(&category_type, &CategoryType::ALL))
            .transpose()?,
    })
}

fn print_rows(rows: &[TransactionRow]) {
    for row in rows {
        println!(
            "{:>5}  {}  {:>12}  {:<6}  {:<20}  {:<16}  {}",
            row.id,
            row.date,
            row.amount,
            row.category_type,
            row.category_name,
            row.account_name,
            row.remark
        );
    }
}
