//! Moves expenses from the old free text `expense.category` column to the
//! category table.
//!
//! Older databases stored the category name directly on each expense. The
//! backfill creates one category per distinct name, points every expense at
//! its category through `expense.category_id` and files expenses without a
//! name under [UNCATEGORIZED]. Running it again changes nothing.

use std::{collections::HashSet, fmt};

use rusqlite::Connection;

use crate::{
    Error,
    category::{
        CategoryName, UNCATEGORIZED, UNCATEGORIZED_DESCRIPTION, create_category_table,
        get_or_create_category,
    },
};

/// What [backfill_categories] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Categories that did not exist before.
    pub categories_created: usize,
    /// Expenses linked to the category named in their legacy column.
    pub expenses_linked: usize,
    /// Expenses with no legacy category that were filed under [UNCATEGORIZED].
    pub expenses_uncategorized: usize,
}

impl fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} categories, linked {} expenses, moved {} expenses to \"{UNCATEGORIZED}\"",
            self.categories_created, self.expenses_linked, self.expenses_uncategorized
        )
    }
}

/// What [revert_category_backfill] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertReport {
    /// Expenses whose legacy category column was filled in again.
    pub expenses_restored: usize,
    /// Categories removed.
    pub categories_deleted: usize,
}

impl fmt::Display for RevertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restored {} expenses, deleted {} categories",
            self.expenses_restored, self.categories_deleted
        )
    }
}

/// Link every expense to a category row based on its legacy category name.
///
/// All changes happen in one transaction.
///
/// # Errors
/// Returns a:
/// - [Error::MissingLegacyCategoryColumn] if `expense.category` does not exist,
/// - or [Error::SqlError] if any statement fails, in which case nothing is changed.
pub fn backfill_categories(connection: &mut Connection) -> Result<BackfillReport, Error> {
    let transaction = connection.transaction()?;
    let columns = expense_columns(&transaction)?;

    if !columns.contains("category") {
        return Err(Error::MissingLegacyCategoryColumn);
    }

    create_category_table(&transaction)?;

    if !columns.contains("category_id") {
        tracing::info!("adding expense.category_id");
        transaction.execute(
            "ALTER TABLE expense ADD COLUMN category_id INTEGER REFERENCES category(id)",
            (),
        )?;
    }

    let legacy_names: Vec<String> = transaction
        .prepare(
            "SELECT DISTINCT TRIM(category) FROM expense
            WHERE category IS NOT NULL AND TRIM(category) != ''",
        )?
        .query_map((), |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut report = BackfillReport::default();

    for name in legacy_names {
        let (category, created) =
            get_or_create_category(CategoryName::new(&name)?, None, &transaction)?;

        if created {
            tracing::debug!("created category {} ({})", category.name, category.id);
            report.categories_created += 1;
        }
    }

    report.expenses_linked = transaction.execute(
        "UPDATE expense
        SET category_id = (
            SELECT category.id FROM category WHERE category.name = TRIM(expense.category)
        )
        WHERE category_id IS NULL AND TRIM(COALESCE(category, '')) != ''",
        (),
    )?;

    let unlinked: i64 = transaction.query_row(
        "SELECT COUNT(id) FROM expense WHERE category_id IS NULL",
        (),
        |row| row.get(0),
    )?;

    if unlinked > 0 {
        let (uncategorized, created) = get_or_create_category(
            CategoryName::new_unchecked(UNCATEGORIZED),
            Some(UNCATEGORIZED_DESCRIPTION),
            &transaction,
        )?;

        if created {
            report.categories_created += 1;
        }

        report.expenses_uncategorized = transaction.execute(
            "UPDATE expense SET category_id = ?1 WHERE category_id IS NULL",
            (uncategorized.id,),
        )?;
    }

    transaction.commit()?;

    Ok(report)
}

/// Undo [backfill_categories].
///
/// Copies each linked category name back into `expense.category`, clears
/// `expense.category_id` and deletes every category. A database that was
/// never backfilled is left alone.
///
/// # Errors
/// Returns an [Error::SqlError] if any statement fails, e.g. when
/// `expense.category_id` does not accept NULL, in which case nothing is
/// changed.
pub fn revert_category_backfill(connection: &mut Connection) -> Result<RevertReport, Error> {
    let transaction = connection.transaction()?;
    let columns = expense_columns(&transaction)?;

    if !columns.contains("category_id") {
        tracing::info!("expense.category_id does not exist, nothing to revert");
        return Ok(RevertReport::default());
    }

    if !columns.contains("category") {
        transaction.execute("ALTER TABLE expense ADD COLUMN category TEXT", ())?;
    }

    let expenses_restored = transaction.execute(
        "UPDATE expense
        SET category = (SELECT category.name FROM category WHERE category.id = expense.category_id)
        WHERE category_id IN (SELECT id FROM category)",
        (),
    )?;
    transaction.execute("UPDATE expense SET category_id = NULL", ())?;
    let categories_deleted = transaction.execute("DELETE FROM category", ())?;

    transaction.commit()?;

    Ok(RevertReport {
        expenses_restored,
        categories_deleted,
    })
}

fn expense_columns(connection: &Connection) -> Result<HashSet<String>, Error> {
    connection
        .prepare("SELECT name FROM pragma_table_info('expense')")?
        .query_map((), |row| row.get(0))?
        .map(|name| name.map_err(Error::from))
        .collect()
}
