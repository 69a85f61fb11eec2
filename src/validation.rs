//! Validation of raw form fields.
//!
//! Every validator is a pure function that takes the text the user entered (or
//! selected) and returns either a normalized value or an [InputError] saying
//! what is wrong with it. Validators never touch the database: category and
//! account names are checked against a [Lookups] snapshot supplied by the caller.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    account::AccountId,
    amount::{Amount, round_money},
    category::{CategoryId, CategoryType},
    lookup::Lookups,
    transaction::NewTransaction,
};

/// The text shown in the category selector before the user picks one.
pub const CATEGORY_PLACEHOLDER: &str = "Category";

/// The text shown in the account selector before the user picks one.
pub const ACCOUNT_PLACEHOLDER: &str = "Account";

/// The text shown in the category type field before it is filled in.
pub const TYPE_PLACEHOLDER: &str = "Type";

/// The maximum number of characters in a transaction note.
pub const MAX_NOTE_LENGTH: usize = 200;

/// Which selector an [InputError::NoSelection] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Category,
    Account,
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Category => f.write_str("category"),
            Selection::Account => f.write_str("account"),
        }
    }
}

/// The reasons a raw form field can be rejected.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The text is not a valid `YYYY-MM-DD` calendar date.
    #[error("Invalid date \"{0}\". Use YYYY-MM-DD.")]
    InvalidFormat(String),

    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed.")]
    FutureDate(Date),

    #[error("Amount cannot be empty.")]
    EmptyAmount,

    #[error("Amount \"{0}\" must be a number.")]
    NotANumber(String),

    #[error("Transaction amount cannot be negative.")]
    NegativeAmount,

    /// The amount has more than ten digits before the decimal point.
    #[error("Amount is too large.")]
    AmountTooLarge,

    /// The selector is empty or still shows its placeholder.
    #[error("Please select a valid {0}.")]
    NoSelection(Selection),

    #[error("Invalid category \"{0}\".")]
    UnknownCategory(String),

    #[error("Invalid account \"{0}\".")]
    UnknownAccount(String),

    #[error("Category type is missing.")]
    MissingType,

    #[error("Invalid category type \"{given}\". Must be one of {}.", format_types(.allowed))]
    InvalidType {
        /// The text that was submitted.
        given: String,
        /// The types that would have been accepted.
        allowed: Vec<CategoryType>,
    },

    #[error("Transaction note must be at most 200 characters.")]
    NoteTooLong,

    /// An account or category name was empty.
    #[error("Name cannot be empty.")]
    EmptyName,
}

fn format_types(types: &[CategoryType]) -> String {
    types
        .iter()
        .map(CategoryType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a transaction date.
///
/// An empty string means "today". `today` is supplied by the caller, see
/// [crate::Config::today].
///
/// # Errors
/// Returns [InputError::InvalidFormat] if `text` is not a `YYYY-MM-DD` calendar
/// date, or [InputError::FutureDate] if it is after `today`.
pub fn validate_date(text: &str, today: Date) -> Result<Date, InputError> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(today);
    }

    let date = parse_iso_date(text)?;

    if date > today {
        return Err(InputError::FutureDate(date));
    }

    Ok(date)
}

/// Parse an optional date used to filter queries. Empty text means no filter.
///
/// Unlike [validate_date], future dates are allowed.
pub fn parse_filter_date(text: Option<&str>) -> Result<Option<Date>, InputError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_iso_date(text).map(Some),
    }
}

fn parse_iso_date(text: &str) -> Result<Date, InputError> {
    Date::parse(
        text,
        format_description!("[year]-[month padding:none]-[day padding:none]"),
    )
        .map_err(|_| InputError::InvalidFormat(text.to_owned()))
}

/// Validate a transaction amount.
///
/// Zero is allowed. The result is rounded to two decimal places.
///
/// # Errors
/// Returns [InputError::EmptyAmount] for blank text, [InputError::NotANumber]
/// if the text is not a decimal number, or [InputError::NegativeAmount] if
/// the number is below zero.
pub fn validate_amount(text: &str) -> Result<Amount, InputError> {
    Amount::new(parse_decimal(text)?)
}

/// Validate an account balance, which unlike a transaction amount may be negative.
pub fn validate_balance(text: &str) -> Result<Decimal, InputError> {
    round_money(parse_decimal(text)?)
}

fn parse_decimal(text: &str) -> Result<Decimal, InputError> {
    let text = text.trim();

    if text.is_empty() {
        return Err(InputError::EmptyAmount);
    }

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| parse_out_of_range(text))
        .ok_or_else(|| InputError::NotANumber(text.to_owned()))
}

/// Values smaller in magnitude than this round to zero.
const HALF_CENT: f64 = 0.005;

/// Handle numbers that are valid but too large or too precise for [Decimal].
///
/// Huge values map to [Decimal::MAX] or [Decimal::MIN] so that the caller
/// reports them as too large (or negative). Tiny values map to zero, or to the
/// smallest negative [Decimal] so a negative sign is still rejected.
fn parse_out_of_range(text: &str) -> Option<Decimal> {
    let value: f64 = text.parse().ok()?;

    // Rejects "NaN", "inf" and friends, while "1e400" still parses as infinite.
    if value.is_nan() || !text.bytes().any(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let negative = value.is_sign_negative() && value != 0.0;

    if value.abs() >= 1e10 {
        Some(if negative { Decimal::MIN } else { Decimal::MAX })
    } else if value.abs() < HALF_CENT {
        Some(if negative {
            Decimal::new(-1, 28)
        } else {
            Decimal::ZERO
        })
    } else {
        Decimal::try_from(value).ok()
    }
}

/// Validate the selected category name and return its ID.
///
/// # Errors
/// Returns [InputError::NoSelection] if nothing (or the placeholder) is
/// selected, or [InputError::UnknownCategory] if `lookups` has no category
/// with that name.
pub fn validate_category(selected: &str, lookups: &Lookups) -> Result<CategoryId, InputError> {
    let selected = selected.trim();

    if selected.is_empty() || selected == CATEGORY_PLACEHOLDER {
        return Err(InputError::NoSelection(Selection::Category));
    }

    lookups
        .category(selected)
        .map(|entry| entry.id)
        .ok_or_else(|| InputError::UnknownCategory(selected.to_owned()))
}

/// Validate the selected account name and return its ID.
///
/// # Errors
/// Returns [InputError::NoSelection] if nothing (or the placeholder) is
/// selected, or [InputError::UnknownAccount] if `lookups` has no account
/// with that name.
pub fn validate_account(selected: &str, lookups: &Lookups) -> Result<AccountId, InputError> {
    let selected = selected.trim();

    if selected.is_empty() || selected == ACCOUNT_PLACEHOLDER {
        return Err(InputError::NoSelection(Selection::Account));
    }

    lookups
        .account(selected)
        .ok_or_else(|| InputError::UnknownAccount(selected.to_owned()))
}

/// Validate the category type against the `allowed` types.
///
/// # Errors
/// Returns [InputError::MissingType] if the type is empty (or the placeholder),
/// or [InputError::InvalidType] if it is not one of `allowed`.
pub fn validate_category_type(
    selected_type: &str,
    allowed: &[CategoryType],
) -> Result<CategoryType, InputError> {
    let selected_type = selected_type.trim();

    if selected_type.is_empty() || selected_type == TYPE_PLACEHOLDER {
        return Err(InputError::MissingType);
    }

    let invalid_type = || InputError::InvalidType {
        given: selected_type.to_owned(),
        allowed: allowed.to_vec(),
    };

    let category_type = CategoryType::from_str(selected_type).map_err(|_| invalid_type())?;

    if allowed.contains(&category_type) {
        Ok(category_type)
    } else {
        Err(invalid_type())
    }
}

/// Validate a transaction note. A missing note becomes an empty string.
///
/// # Errors
/// Returns [InputError::NoteTooLong] if the note has more than
/// [MAX_NOTE_LENGTH] characters.
pub fn validate_note(text: Option<&str>) -> Result<String, InputError> {
    let Some(text) = text else {
        return Ok(String::new());
    };

    if text.chars().count() > MAX_NOTE_LENGTH {
        return Err(InputError::NoteTooLong);
    }

    Ok(text.to_owned())
}

/// The raw fields of the new transaction form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    pub date: String,
    pub amount: String,
    pub category: String,
    pub account: String,
    pub category_type: String,
    pub note: Option<String>,
}

/// Run every validator over `form` and build the payload for
/// [crate::transaction::add_transaction].
///
/// Fields are checked in the order date, amount, category, note, account,
/// type, and the first failure is returned. The payload carries the submitted
/// category type so the recorder can check it against the stored one.
pub fn validate_form(
    form: &TransactionForm,
    lookups: &Lookups,
    today: Date,
) -> Result<NewTransaction, InputError> {
    let date = validate_date(&form.date, today)?;
    let amount = validate_amount(&form.amount)?;
    let category_id = validate_category(&form.category, lookups)?;
    let note = validate_note(form.note.as_deref().map(str::trim))?;
    let account_id = validate_account(&form.account, lookups)?;
    let category_type = validate_category_type(&form.category_type, &CategoryType::ALL)?;

    Ok(
        NewTransaction::build(account_id, category_id, date, amount)
            .remark(note)
            .expected_type(Some(category_type)),
    )
}

#[cfg(test)]
mod date_tests {
    use time::macros::date;

    use super::{InputError, parse_filter_date, validate_date};

    const TODAY: time::Date = date!(2025 - 06 - 15);

    #[test]
    fn empty_defaults_to_today() {
        assert_eq!(validate_date("", TODAY), Ok(TODAY));
        assert_eq!(validate_date("   ", TODAY), Ok(TODAY));
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(validate_date("2024-01-15", TODAY), Ok(date!(2024 - 01 - 15)));
    }

    #[test]
    fn unpadded_month_and_day_are_normalized() {
        let parsed = validate_date("2024-1-5", TODAY);

        assert_eq!(parsed, Ok(date!(2024 - 01 - 05)));
        assert_eq!(parsed.map(|date| date.to_string()), Ok("2024-01-05".to_owned()));
        assert_eq!(validate_date("2024-01-5", TODAY), Ok(date!(2024 - 01 - 05)));
    }

    #[test]
    fn today_is_allowed() {
        assert_eq!(validate_date("2025-06-15", TODAY), Ok(TODAY));
    }

    #[test]
    fn future_date_is_rejected() {
        assert_eq!(
            validate_date("2025-06-16", TODAY),
            Err(InputError::FutureDate(date!(2025 - 06 - 16)))
        );
    }

    #[test]
    fn invalid_calendar_date_is_invalid_format() {
        assert_eq!(
            validate_date("2024-02-30", TODAY),
            Err(InputError::InvalidFormat("2024-02-30".to_owned()))
        );
    }

    #[test]
    fn other_formats_are_rejected() {
        for text in ["15/01/2024", "2024/1/5", "yesterday", "2024-01-15T10:00"] {
            assert_eq!(
                validate_date(text, TODAY),
                Err(InputError::InvalidFormat(text.to_owned())),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn filter_date_allows_future_and_empty() {
        assert_eq!(parse_filter_date(None), Ok(None));
        assert_eq!(parse_filter_date(Some(" ")), Ok(None));
        assert_eq!(
            parse_filter_date(Some("2999-01-01")),
            Ok(Some(date!(2999 - 01 - 01)))
        );
        assert_eq!(
            parse_filter_date(Some("01-01-2024")),
            Err(InputError::InvalidFormat("01-01-2024".to_owned()))
        );
    }
}

#[cfg(test)]
mod amount_tests {
    use rust_decimal::Decimal;

    use super::{InputError, validate_amount, validate_balance};

    #[test]
    fn parses_decimal() {
        let amount = validate_amount("12.50").unwrap();

        assert_eq!(amount.value(), Decimal::new(125, 1));
    }

    #[test]
    fn accepts_zero() {
        assert_eq!(validate_amount("0").map(|amount| amount.cents()), Ok(0));
    }

    #[test]
    fn accepts_scientific_notation() {
        assert_eq!(validate_amount("1e2").map(|amount| amount.cents()), Ok(10_000));
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(validate_amount(""), Err(InputError::EmptyAmount));
        assert_eq!(validate_amount(" \t"), Err(InputError::EmptyAmount));
    }

    #[test]
    fn negative_numbers_are_rejected() {
        for text in [
            "-1",
            "-0.01",
            "-12.50",
            "-1e3",
            "-0.001",
            "-1e-30",
            "-1e400",
            "-99999999999999999999999999999999",
        ] {
            assert_eq!(
                validate_amount(text),
                Err(InputError::NegativeAmount),
                "{text} should be rejected as negative"
            );
        }
    }

    #[test]
    fn out_of_range_numbers_are_classified() {
        assert_eq!(validate_amount("1e-30").map(|amount| amount.cents()), Ok(0));
        assert_eq!(
            validate_amount("0.0000000000000000000000000000001").map(|amount| amount.cents()),
            Ok(0)
        );
        assert_eq!(validate_amount("1e400"), Err(InputError::AmountTooLarge));
        assert_eq!(
            validate_amount("99999999999999999999999999999999"),
            Err(InputError::AmountTooLarge)
        );
        assert_eq!(validate_balance("-1e400"), Err(InputError::AmountTooLarge));
        assert_eq!(validate_balance("-1e-30"), Ok(Decimal::ZERO));
    }

    #[test]
    fn non_numbers_are_rejected() {
        for text in ["abc", "12,50", "$12", "NaN", "inf", "1.2.3", "--1"] {
            assert_eq!(
                validate_amount(text),
                Err(InputError::NotANumber(text.to_owned())),
                "{text} should be rejected as not a number"
            );
        }
    }

    #[test]
    fn balance_may_be_negative() {
        assert_eq!(validate_balance("-250.755"), Ok(Decimal::new(-25076, 2)));
    }
}

#[cfg(test)]
mod selection_tests {
    use crate::{
        account::{Account, AccountName},
        category::{Category, CategoryName, CategoryType},
        lookup::Lookups,
    };

    use super::{
        InputError, Selection, validate_account, validate_category, validate_category_type,
        validate_note,
    };

    fn test_lookups() -> Lookups {
        Lookups::new(
            vec![
                Category {
                    id: 2,
                    name: CategoryName::new("Food").unwrap(),
                    category_type: CategoryType::Debit,
                },
                Category {
                    id: 3,
                    name: CategoryName::new("Salary").unwrap(),
                    category_type: CategoryType::Credit,
                },
            ],
            vec![Account {
                id: 1,
                name: AccountName::new("Everyday").unwrap(),
            }],
        )
    }

    #[test]
    fn known_category_returns_id() {
        assert_eq!(validate_category("Food", &test_lookups()), Ok(2));
    }

    #[test]
    fn placeholder_category_is_no_selection() {
        let lookups = test_lookups();

        assert_eq!(
            validate_category("Category", &lookups),
            Err(InputError::NoSelection(Selection::Category))
        );
        assert_eq!(
            validate_category("", &lookups),
            Err(InputError::NoSelection(Selection::Category))
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(
            validate_category("Travel", &test_lookups()),
            Err(InputError::UnknownCategory("Travel".to_owned()))
        );
    }

    #[test]
    fn account_follows_same_contract() {
        let lookups = test_lookups();

        assert_eq!(validate_account("Everyday", &lookups), Ok(1));
        assert_eq!(
            validate_account("Account", &lookups),
            Err(InputError::NoSelection(Selection::Account))
        );
        assert_eq!(
            validate_account("Savings", &lookups),
            Err(InputError::UnknownAccount("Savings".to_owned()))
        );
    }

    #[test]
    fn category_type_must_be_present_and_allowed() {
        let allowed = CategoryType::ALL;

        assert_eq!(
            validate_category_type("Credit", &allowed),
            Ok(CategoryType::Credit)
        );
        assert_eq!(
            validate_category_type("", &allowed),
            Err(InputError::MissingType)
        );
        assert_eq!(
            validate_category_type("Type", &allowed),
            Err(InputError::MissingType)
        );
        assert_eq!(
            validate_category_type("Transfer", &allowed),
            Err(InputError::InvalidType {
                given: "Transfer".to_owned(),
                allowed: allowed.to_vec(),
            })
        );
    }

    #[test]
    fn category_type_outside_allowed_subset_is_invalid() {
        let result = validate_category_type("Credit", &[CategoryType::Debit]);

        assert_eq!(
            result,
            Err(InputError::InvalidType {
                given: "Credit".to_owned(),
                allowed: vec![CategoryType::Debit],
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid category type \"Credit\". Must be one of Debit."
        );
    }

    #[test]
    fn note_length_is_limited() {
        assert_eq!(validate_note(None), Ok(String::new()));
        assert_eq!(validate_note(Some("lunch")), Ok("lunch".to_owned()));

        let longest = "é".repeat(200);
        assert_eq!(validate_note(Some(&longest)), Ok(longest.clone()));
        assert_eq!(
            validate_note(Some(&format!("{longest}x"))),
            Err(InputError::NoteTooLong)
        );
    }
}

#[cfg(test)]
mod form_tests {
    use time::macros::date;

    use crate::{
        account::{Account, AccountName},
        category::{Category, CategoryName, CategoryType},
        lookup::Lookups,
    };

    use super::{InputError, TransactionForm, validate_form};

    fn test_lookups() -> Lookups {
        Lookups::new(
            vec![Category {
                id: 2,
                name: CategoryName::new("Food").unwrap(),
                category_type: CategoryType::Debit,
            }],
            vec![Account {
                id: 1,
                name: AccountName::new("Everyday").unwrap(),
            }],
        )
    }

    fn valid_form() -> TransactionForm {
        TransactionForm {
            date: "2024-01-15".to_owned(),
            amount: "42.50".to_owned(),
            category: "Food".to_owned(),
            account: "Everyday".to_owned(),
            category_type: "Debit".to_owned(),
            note: Some(" lunch ".to_owned()),
        }
    }

    #[test]
    fn valid_form_builds_payload() {
        let payload = validate_form(&valid_form(), &test_lookups(), date!(2024 - 02 - 01))
            .expect("form should be valid");

        assert_eq!(payload.account_id, 1);
        assert_eq!(payload.category_id, 2);
        assert_eq!(payload.date, date!(2024 - 01 - 15));
        assert_eq!(payload.amount.cents(), 4250);
        assert_eq!(payload.remark, "lunch");
        assert_eq!(payload.expected_type, Some(CategoryType::Debit));
    }

    #[test]
    fn future_date_blocks_the_payload() {
        let form = TransactionForm {
            date: "2024-02-02".to_owned(),
            ..valid_form()
        };

        let result = validate_form(&form, &test_lookups(), date!(2024 - 02 - 01));

        assert_eq!(result, Err(InputError::FutureDate(date!(2024 - 02 - 02))));
    }

    #[test]
    fn first_failure_is_reported() {
        let form = TransactionForm {
            amount: "abc".to_owned(),
            category: "Category".to_owned(),
            category_type: String::new(),
            ..valid_form()
        };

        let result = validate_form(&form, &test_lookups(), date!(2024 - 02 - 01));

        assert_eq!(result, Err(InputError::NotANumber("abc".to_owned())));
    }
}
