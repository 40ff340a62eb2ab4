//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
};

/// The category for expenses that were recorded without one.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// The description given to the [UNCATEGORIZED] category when it is created.
pub const UNCATEGORIZED_DESCRIPTION: &str =
    "Default category for expenses without a specified category";

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name exists.
pub fn create_category(
    name: CategoryName,
    description: Option<&str>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (name, description) VALUES (?1, ?2);",
            (name.as_ref(), description),
        )
        .map_err(|error| map_unique_violation(error, &name))?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        description: description.map(str::to_owned),
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, description FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a category by its exact name, if it exists.
pub fn get_category_by_name(
    name: &CategoryName,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .prepare("SELECT id, name, description FROM category WHERE name = ?1;")?
        .query_row((name.as_ref(),), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, description FROM category ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Find the category called `name`, creating it with `description` if it does
/// not exist yet.
///
/// Returns the category and whether it was created by this call.
pub fn get_or_create_category(
    name: CategoryName,
    description: Option<&str>,
    connection: &Connection,
) -> Result<(Category, bool), Error> {
    match get_category_by_name(&name, connection)? {
        Some(category) => Ok((category, false)),
        None => create_category(name, description, connection).map(|category| (category, true)),
    }
}

/// Update a category's name and description.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category doesn't exist, or
/// [Error::DuplicateCategoryName] if another category already has `new_name`.
pub fn update_category(
    category_id: CategoryId,
    new_name: CategoryName,
    new_description: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, description = ?2 WHERE id = ?3",
            (new_name.as_ref(), new_description, category_id),
        )
        .map_err(|error| map_unique_violation(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category by ID.
///
/// # Errors
/// Returns [Error::CategoryInUse] if any expense refers to the category, or
/// [Error::DeleteMissingCategory] if the category doesn't exist.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let expense_count: u32 = connection.query_row(
        "SELECT COUNT(1) FROM expense WHERE category_id = ?1",
        [category_id],
        |row| row.get(0),
    )?;

    if expense_count > 0 {
        return Err(Error::CategoryInUse(expense_count));
    }

    let rows_affected = connection
        .execute("DELETE FROM category WHERE id = ?1", [category_id])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::CategoryInUse(expense_count),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName(name.to_string()),
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let description = row.get(2)?;

    Ok(Category {
        id,
        name,
        description,
    })
}
