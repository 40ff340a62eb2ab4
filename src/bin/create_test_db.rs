use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::macros::date;

use expense_tracker::{
    CategoryName, NewExpense, count_expenses, create_category, create_expense, initialize_db,
};

/// A utility for creating a test database for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test expenses...");

    let fixtures = [
        (
            "Entertainment",
            "Movies, games and events",
            Decimal::new(150, 1),
            date!(2025 - 10 - 22),
            "Movie ticket",
        ),
        (
            "Transportation",
            "Fuel, fares and parking",
            Decimal::new(450, 1),
            date!(2025 - 10 - 23),
            "Gas fill-up",
        ),
        (
            "Food & Dining",
            "Restaurants, cafes and groceries",
            Decimal::new(125, 1),
            date!(2025 - 10 - 24),
            "Lunch at local cafe",
        ),
    ];

    for (category_name, category_description, amount, date, description) in fixtures {
        let category = create_category(
            CategoryName::new(category_name)?,
            Some(category_description),
            &conn,
        )?;

        create_expense(
            NewExpense {
                amount,
                category_id: category.id,
                date,
                description: description.to_owned(),
            },
            &conn,
        )?;
    }

    println!("Success! Created {} expenses.", count_expenses(&conn)?);

    Ok(())
}
