//! Database setup shared by the web server and the command line tools.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, category::create_category_table, expense::create_expense_table};

/// Enable foreign key enforcement and create the tables for the domain models.
///
/// The tables are created in a single exclusive transaction, so either all of
/// them exist afterwards or none of the changes are applied. Calling this on
/// an already initialized database is a no-op.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are off by default in SQLite and the pragma is a no-op
    // inside a transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
