//! CSV export of the filtered expense list.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use time::Date;

use crate::{Error, expense::ExpenseRow};

const CSV_HEADER: [&str; 4] = ["Date", "Category", "Amount", "Description"];

/// A CSV document served as a file download.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub body: Vec<u8>,
}

impl IntoResponse for CsvExport {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/csv".to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Write `rows` as CSV in the order given.
///
/// # Errors
/// Returns a:
/// - [Error::DanglingCategory] if a row has no category name,
/// - or [Error::CsvExport] if the CSV writer fails.
pub fn export_csv(rows: &[ExpenseRow]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for row in rows {
        let category = row
            .category_name
            .as_deref()
            .ok_or(Error::DanglingCategory(row.id))?;
        let date = row.date.to_string();
        let amount = format_amount(row.amount);

        writer
            .write_record([
                date.as_str(),
                category,
                amount.as_str(),
                row.description.as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvExport(error.to_string()))
}

/// Plain decimal notation with trailing zeros removed, keeping ".0" on whole
/// numbers: `12.50` is written as `12.5` and `45` as `45.0`.
fn format_amount(amount: Decimal) -> String {
    let mut text = amount.normalize().to_string();

    if !text.contains('.') {
        text.push_str(".0");
    }

    text
}

fn csv_error(error: csv::Error) -> Error {
    Error::CsvExport(error.to_string())
}

/// The download name for an export of the date range `start` to `end`.
///
/// `today` is used when neither bound is set.
pub fn csv_filename(start: Option<Date>, end: Option<Date>, today: Date) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("expenses_{start}_to_{end}.csv"),
        (Some(start), None) => format!("expenses_from_{start}.csv"),
        (None, Some(end)) => format!("expenses_until_{end}.csv"),
        (None, None) => format!("expenses_{today}.csv"),
    }
}
