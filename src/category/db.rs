//! Database operations for categories.

use rusqlite::{Connection, Row, ffi};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, CategoryType},
    db::atomically,
    error::{is_constraint_violation, is_foreign_key_violation},
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name exists.
pub fn create_category(
    name: CategoryName,
    category_type: CategoryType,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (name, category_type) VALUES (?1, ?2);",
            (name.as_ref(), category_type),
        )
        .map_err(|error| map_unique_violation(error, &name))?;

    let id = connection.last_insert_rowid();
    tracing::info!("Created category {id} \"{name}\" ({category_type})");

    Ok(Category {
        id,
        name,
        category_type,
    })
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, category_type FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, category_type FROM category ORDER BY name ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category and/or change its type and return the updated category.
///
/// Changing the type does not touch transactions already recorded against the category.
///
/// # Errors
/// Returns [Error::NotFound] if the category doesn't exist, or
/// [Error::DuplicateCategoryName] if another category already has `new_name`.
pub fn update_category(
    category_id: CategoryId,
    new_name: CategoryName,
    new_type: CategoryType,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, category_type = ?2 WHERE id = ?3",
            (new_name.as_ref(), new_type, category_id),
        )
        .map_err(|error| map_unique_violation(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    tracing::info!("Updated category {category_id} to \"{new_name}\" ({new_type})");

    Ok(Category {
        id: category_id,
        name: new_name,
        category_type: new_type,
    })
}

/// Delete a category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the category doesn't exist, or
/// [Error::CategoryInUse] if transactions still refer to it.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    atomically(connection, |tx| {
        let in_use: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE category_id = ?1)",
            [category_id],
            |row| row.get(0),
        )?;

        if in_use {
            tracing::warn!("Refused to delete category {category_id}, it has transactions");
            return Err(Error::CategoryInUse(category_id));
        }

        let rows_affected = tx
            .execute("DELETE FROM category WHERE id = ?1", [category_id])
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    Error::CategoryInUse(category_id)
                } else {
                    error.into()
                }
            })?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    })?;

    tracing::info!("Deleted category {category_id}");

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category_type TEXT NOT NULL CHECK (category_type IN ('Debit', 'Credit'))
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let category_type = row.get(2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        category_type,
    })
}

fn map_unique_violation(error: rusqlite::Error, name: &CategoryName) -> Error {
    if is_constraint_violation(&error, ffi::SQLITE_CONSTRAINT_UNIQUE) {
        Error::DuplicateCategoryName(name.to_string())
    } else {
        error.into()
    }
}
