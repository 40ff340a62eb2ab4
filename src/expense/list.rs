//! The expense list page: filter form, pie charts, expense table and CSV export.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    endpoints,
    expense::{
        CategorySummary, DateFilter, ExpenseRow,
        chart::{chart_head_elements, chart_view},
        export::{CsvExport, csv_filename, export_csv},
        get_filtered_expenses, notice_view, summarize_by_category,
    },
    html::{
        BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the expense list page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to name unfiltered CSV exports.
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// How the expense list should be returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Html,
    Csv,
}

/// The query string for the expense list page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub format: ListFormat,
    /// Confirms the change that led to this page, e.g. "deleted".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Render the expense list, or download it as CSV when `format=csv`.
///
/// # Errors
/// Returns an [Error::InvalidDateFilter] for malformed dates, which is
/// rendered as a 400 page.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Response, Error> {
    let filter = DateFilter::parse(query.start_date.as_deref(), query.end_date.as_deref())
        .inspect_err(|error| tracing::debug!("rejected expense filter: {error}"))?;

    let rows = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_filtered_expenses(&filter, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"))?
    };

    match query.format {
        ListFormat::Csv => {
            let today = local_today(&state.local_timezone)?;
            let body = export_csv(&rows)
                .inspect_err(|error| tracing::error!("Failed to export expenses: {error}"))?;

            Ok(CsvExport {
                filename: csv_filename(filter.start, filter.end, today),
                body,
            }
            .into_response())
        }
        ListFormat::Html => {
            let summary = summarize_by_category(&rows)
                .inspect_err(|error| tracing::error!("Failed to summarize expenses: {error}"))?;

            let notice = notice_view(query.notice.as_deref());

            Ok(expenses_view(&rows, &summary, &filter, notice).into_response())
        }
    }
}

/// The CSV download link for the current filter.
fn export_url(filter: &DateFilter) -> String {
    let query = ExpenseListQuery {
        start_date: filter.start.map(|date| date.to_string()),
        end_date: filter.end.map(|date| date.to_string()),
        format: ListFormat::Csv,
        notice: None,
    };

    match serde_urlencoded::to_string(&query) {
        Ok(query_string) => format!("{}?{query_string}", endpoints::EXPENSES_VIEW),
        Err(error) => {
            tracing::error!("could not encode export query: {error}");
            format!("{}?format=csv", endpoints::EXPENSES_VIEW)
        }
    }
}

fn filter_form(filter: &DateFilter) -> Markup {
    let start = filter.start.map(|date| date.to_string()).unwrap_or_default();
    let end = filter.end.map(|date| date.to_string()).unwrap_or_default();

    html!(
        form
            id="filter-form"
            method="get"
            action=(endpoints::EXPENSES_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="start_date"
                    type="date"
                    name="start_date"
                    value=(start)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="end_date"
                    type="date"
                    name="end_date"
                    value=(end)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }

            @if filter.is_active() {
                a href=(endpoints::EXPENSES_VIEW) class=(LINK_STYLE) { "Clear Filters" }
            }

            a href=(export_url(filter)) class=(LINK_STYLE) download { "Export CSV" }
        }
    )
}

fn expenses_table(rows: &[ExpenseRow]) -> Markup {
    let table_row = |row: &ExpenseRow| {
        let view_url = endpoints::format_endpoint(endpoints::EXPENSE_VIEW, row.id);
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, row.id);
        let delete_url = endpoints::format_endpoint(endpoints::EXPENSE_API, row.id);
        let category_url =
            endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, row.category_id);
        let amount = row
            .amount
            .to_f64()
            .map(format_currency)
            .unwrap_or_else(|| row.amount.to_string());

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (row.date) }
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(category_url) class=(CATEGORY_BADGE_STYLE)
                    {
                        (row.category_name.as_deref().unwrap_or_default())
                    }
                }
                td class=(TABLE_CELL_STYLE) { (amount) }
                td class=(TABLE_CELL_STYLE) { (row.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        a href=(view_url) class=(LINK_STYLE) { "View" }
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            "Are you sure you want to delete this expense?",
                        ))
                    }
                }
            }
        )
    };

    html!(
        section class="dark:bg-gray-800 overflow-x-auto"
        {
            table id="expenses" class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for row in rows {
                        (table_row(row))
                    }

                    @if rows.is_empty() {
                        tr
                        {
                            td
                                colspan="5"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No expenses found. "
                                a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                                {
                                    "Record an expense"
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn expenses_view(
    rows: &[ExpenseRow],
    summary: &CategorySummary,
    filter: &DateFilter,
    notice: Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                (notice)

                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE) { "New Expense" }
                }

                (filter_form(filter))
                (chart_view(summary))
                (expenses_table(rows))
            }
        }
    );

    base("Expenses", &chart_head_elements(summary), &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        expense::{DateFilter, NewExpense, create_expense},
        test_utils::{
            assert_content_type, assert_valid_html, get_header, get_test_connection,
            parse_html_document,
        },
    };

    use super::{ExpenseListQuery, ExpensesPageState, ListFormat, export_url, get_expenses_page};

    fn get_state_with_fixtures() -> ExpensesPageState {
        let connection = get_test_connection();
        for (category, amount, date, description) in [
            ("Entertainment", dec!(15.0), date!(2025 - 10 - 22), "Movie ticket"),
            ("Transportation", dec!(45.0), date!(2025 - 10 - 23), "Gas fill-up"),
            ("Food & Dining", dec!(12.5), date!(2025 - 10 - 24), "Lunch at local cafe"),
        ] {
            let category =
                create_category(CategoryName::new_unchecked(category), None, &connection).unwrap();
            create_expense(
                NewExpense {
                    amount,
                    category_id: category.id,
                    date,
                    description: description.to_owned(),
                },
                &connection,
            )
            .unwrap();
        }

        ExpensesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn query(start: &str, end: &str, format: ListFormat) -> Query<ExpenseListQuery> {
        Query(ExpenseListQuery {
            start_date: Some(start.to_owned()),
            end_date: Some(end.to_owned()),
            format,
            notice: None,
        })
    }

    fn table_dates(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("#expenses tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn lists_all_expenses_most_recent_first() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(State(state), Query(ExpenseListQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            table_dates(&html),
            vec!["2025-10-24", "2025-10-23", "2025-10-22"]
        );
        let clear = Selector::parse("#filter-form a[href='/expenses']").unwrap();
        assert!(html.select(&clear).next().is_none());
    }

    #[tokio::test]
    async fn empty_bounds_are_ignored() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(State(state), query("", "", ListFormat::Html))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(table_dates(&html).len(), 3);
    }

    #[tokio::test]
    async fn start_date_filters_list_and_chart() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(State(state), query("2025-10-24", "", ListFormat::Html))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(table_dates(&html), vec!["2025-10-24"]);
        let summary_labels = html
            .select(&Selector::parse("#category-summary tbody td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(summary_labels, vec!["Food & Dining"]);
        let clear = Selector::parse("#filter-form a[href='/expenses']").unwrap();
        assert!(html.select(&clear).next().is_some());
        let start_input = html
            .select(&Selector::parse("input#start_date").unwrap())
            .next()
            .unwrap();
        assert_eq!(start_input.value().attr("value"), Some("2025-10-24"));
    }

    #[tokio::test]
    async fn empty_result_shows_no_chart_message() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(
            State(state),
            query("2025-10-24", "2025-10-22", ListFormat::Html),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert!(table_dates(&html).iter().all(|cell| cell.starts_with("No expenses")));
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No expenses to chart"));
    }

    #[tokio::test]
    async fn malformed_date_is_rejected() {
        let state = get_state_with_fixtures();

        let result =
            get_expenses_page(State(state), query("24/10/2025", "", ListFormat::Html)).await;

        assert_eq!(
            result.map(|_| ()),
            Err(Error::InvalidDateFilter {
                field: "start_date",
                value: "24/10/2025".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn csv_export_of_everything() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(
            State(state),
            Query(ExpenseListQuery {
                format: ListFormat::Csv,
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv");
        let disposition = get_header(&response, "content-disposition");
        assert!(disposition.starts_with("attachment; filename=\"expenses_"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Date,Category,Amount,Description",
                "2025-10-24,Food & Dining,12.5,Lunch at local cafe",
                "2025-10-23,Transportation,45.0,Gas fill-up",
                "2025-10-22,Entertainment,15.0,Movie ticket",
            ]
        );
    }

    #[tokio::test]
    async fn csv_export_of_one_day() {
        let state = get_state_with_fixtures();

        let response = get_expenses_page(
            State(state),
            query("2025-10-24", "2025-10-24", ListFormat::Csv),
        )
        .await
        .unwrap();

        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"expenses_2025-10-24_to_2025-10-24.csv\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn export_url_keeps_active_bounds() {
        assert_eq!(export_url(&DateFilter::default()), "/expenses?format=csv");
        assert_eq!(
            export_url(&DateFilter {
                start: Some(date!(2025 - 10 - 22)),
                end: None,
            }),
            "/expenses?start_date=2025-10-22&format=csv"
        );
    }

    #[tokio::test]
    async fn confirms_deleted_expense() {
        let state = get_state_with_fixtures();
        let query = ExpenseListQuery {
            notice: Some("deleted".to_owned()),
            ..Default::default()
        };

        let response = get_expenses_page(State(state), Query(query)).await.unwrap();

        let html = parse_html_document(response).await;
        let notice = html
            .select(&Selector::parse("#notice [role=alert] p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(notice, vec!["Expense was successfully deleted."]);
    }

    #[tokio::test]
    async fn overflowing_category_total_is_an_error() {
        let state = get_state_with_fixtures();
        {
            let connection = state.db_connection.lock().unwrap();
            for _ in 0..2 {
                create_expense(
                    NewExpense {
                        amount: "50000000000000000000000000000".parse().unwrap(),
                        category_id: 1,
                        date: date!(2025 - 10 - 25),
                        description: "Typo".to_owned(),
                    },
                    &connection,
                )
                .unwrap();
            }
        }

        let result = get_expenses_page(State(state), Query(ExpenseListQuery::default())).await;

        assert_eq!(
            result.map(|_| ()),
            Err(Error::AmountOverflow("Entertainment".to_owned()))
        );
    }
}
