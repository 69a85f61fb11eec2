//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::validation::InputError;

/// Database identifier for a category.
pub type CategoryId = i64;

/// Whether money leaves (debit) or enters (credit) an account for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryType {
    Debit,
    Credit,
}

impl CategoryType {
    /// Every category type, in display order.
    pub const ALL: [CategoryType; 2] = [CategoryType::Debit, CategoryType::Credit];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Debit => "Debit",
            CategoryType::Credit => "Credit",
        }
    }
}

impl FromStr for CategoryType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryType::ALL
            .into_iter()
            .find(|category_type| category_type.as_str() == s)
            .ok_or_else(|| InputError::InvalidType {
                given: s.to_owned(),
                allowed: CategoryType::ALL.to_vec(),
            })
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return an [InputError::EmptyName] if `name` is empty
    /// or only whitespace.
    pub fn new(name: &str) -> Result<Self, InputError> {
        let name = name.trim();

        if name.is_empty() {
            Err(InputError::EmptyName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for classifying transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub category_type: CategoryType,
}
