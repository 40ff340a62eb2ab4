//! Narrowing the expense list down to a date range.

use rust_decimal::Decimal;
use rusqlite::{Connection, Row};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    category::CategoryId,
    expense::{ExpenseId, core::get_amount},
};

const ISO_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date.
pub(super) fn parse_iso_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text.trim(), ISO_DATE_FORMAT)
}

/// An optional, inclusive date range for the expense list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    /// Earliest date to include.
    pub start: Option<Date>,
    /// Latest date to include.
    pub end: Option<Date>,
}

impl DateFilter {
    /// Build a filter from the raw `start_date` and `end_date` query values.
    ///
    /// Missing, empty and whitespace-only values do not restrict that side of
    /// the range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateFilter] if a non-blank value is not a
    /// `YYYY-MM-DD` date.
    pub fn parse(start_date: Option<&str>, end_date: Option<&str>) -> Result<Self, Error> {
        Ok(Self {
            start: parse_bound("start_date", start_date)?,
            end: parse_bound("end_date", end_date)?,
        })
    }

    /// Whether either bound is set.
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

fn parse_bound(field: &'static str, value: Option<&str>) -> Result<Option<Date>, Error> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    parse_iso_date(value)
        .map(Some)
        .map_err(|_| Error::InvalidDateFilter {
            field,
            value: value.to_owned(),
        })
}

/// An expense joined with the name of its category.
///
/// `category_name` is `None` when the expense points at a category that no
/// longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub category_id: CategoryId,
    pub category_name: Option<String>,
    pub date: Date,
    pub description: String,
}

/// Get the expenses within `filter`, most recent first.
///
/// Expenses on the same date are ordered by ID, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn get_filtered_expenses(
    filter: &DateFilter,
    connection: &Connection,
) -> Result<Vec<ExpenseRow>, Error> {
    connection
        .prepare(
            "SELECT expense.id, expense.amount, expense.category_id, category.name,
                expense.date, expense.description
            FROM expense
            LEFT JOIN category ON category.id = expense.category_id
            WHERE (?1 IS NULL OR expense.date >= ?1)
                AND (?2 IS NULL OR expense.date <= ?2)
            ORDER BY expense.date DESC, expense.id DESC",
        )?
        .query_map((filter.start, filter.end), map_expense_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

fn map_expense_row(row: &Row) -> Result<ExpenseRow, rusqlite::Error> {
    Ok(ExpenseRow {
        id: row.get(0)?,
        amount: get_amount(row, 1)?,
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
    })
}
