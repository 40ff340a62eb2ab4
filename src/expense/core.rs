//! Defines the core data models and database queries for expenses.

use rust_decimal::Decimal;
use rusqlite::{
    Connection, Row,
    types::{Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryId};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// Money spent on a particular day, filed under a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// How much was spent, as an exact decimal number.
    pub amount: Decimal,
    /// The ID of the category the expense belongs to.
    pub category_id: CategoryId,
    /// When the money was spent.
    pub date: Date,
    /// A free text note about the expense, may be empty.
    pub description: String,
    /// When the expense was recorded (UTC).
    pub created_at: OffsetDateTime,
    /// When the expense was last changed (UTC).
    pub updated_at: OffsetDateTime,
}

/// The user editable fields of an [Expense].
///
/// Used both for creating new expenses and for replacing the fields of an
/// existing expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// How much was spent.
    pub amount: Decimal,
    /// The category to file the expense under.
    pub category_id: CategoryId,
    /// When the money was spent.
    pub date: Date,
    /// A free text note, may be empty.
    pub description: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str = "id, amount, category_id, date, description, created_at, updated_at";

/// Create a new expense in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO expense (amount, category_id, date, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                new_expense.amount.to_string(),
                new_expense.category_id,
                new_expense.date,
                &new_expense.description,
                now,
            ),
            map_expense_row,
        )
        .map_err(|error| map_foreign_key_violation(error, new_expense.category_id))
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Replace the editable fields of the expense `id` and bump its `updated_at`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if `id` does not refer to a valid expense,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    changes: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "UPDATE expense
             SET amount = ?1, category_id = ?2, date = ?3, description = ?4, updated_at = ?5
             WHERE id = ?6
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                changes.amount.to_string(),
                changes.category_id,
                changes.date,
                &changes.description,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingExpense,
            error => map_foreign_key_violation(error, changes.category_id),
        })
}

/// Delete the expense `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Get the total number of expenses in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // The list page filters and sorts by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_category ON expense(category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
///
/// The row must have the columns in [EXPENSE_COLUMNS] order.
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = get_amount(row, 1)?;
    let category_id = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let created_at = row.get(5)?;
    let updated_at = row.get(6)?;

    Ok(Expense {
        id,
        amount,
        category_id,
        date,
        description,
        created_at,
        updated_at,
    })
}

/// Read the decimal amount stored in column `index`.
///
/// Amounts are written as text. Integer and real values are also accepted so
/// that rows written by other tools can still be read.
pub(super) fn get_amount(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let conversion_error = |data_type: Type, error: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(index, data_type, error)
    };

    match row.get_ref(index)? {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map_err(|error| conversion_error(Type::Text, Box::new(error)))?
            .trim()
            .parse::<Decimal>()
            .map_err(|error| conversion_error(Type::Text, Box::new(error))),
        ValueRef::Integer(integer) => Ok(Decimal::from(integer)),
        ValueRef::Real(real) => {
            Decimal::try_from(real).map_err(|error| conversion_error(Type::Real, Box::new(error)))
        }
        other => Err(rusqlite::Error::InvalidColumnType(
            index,
            "amount".to_owned(),
            other.data_type(),
        )),
    }
}

fn map_foreign_key_violation(error: rusqlite::Error, category_id: CategoryId) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(category_id),
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
