use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use expense_tracker::{backfill_categories, revert_category_backfill};

/// A one-shot utility that moves expenses from the old free text category
/// column to the category table.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Copy category names back to the old column and delete all categories.
    #[arg(long)]
    revert: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let mut conn = Connection::open(db_path)?;
    conn.pragma_update(None, "foreign_keys", true)?;

    if args.revert {
        println!("Reverting category backfill in {db_path:#?}");
        let report = revert_category_backfill(&mut conn)?;
        println!("Done: {report}");
    } else {
        println!("Backfilling categories in {db_path:#?}");
        let report = backfill_categories(&mut conn)?;
        println!("Done: {report}");
    }

    Ok(())
}
