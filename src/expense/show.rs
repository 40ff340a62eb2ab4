//! The page for a single expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;

use crate::{
    AppState, Error,
    category::{Category, get_category},
    endpoints,
    expense::{Expense, ExpenseId, NoticeQuery, get_expense, notice_view},
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links,
        format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the expense page.
#[derive(Debug, Clone)]
pub struct ExpensePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the details of a single expense.
///
/// A `notice` query parameter confirms the change that led here.
pub async fn get_expense_page(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<ExpensePageState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(expense_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve expense {expense_id}: {error}")
    })?;

    let category = match get_category(expense.category_id, &connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            tracing::error!(
                "expense {expense_id} refers to missing category {}",
                expense.category_id
            );
            return Err(Error::DanglingCategory(expense_id));
        }
        Err(error) => {
            tracing::error!("Failed to retrieve category {}: {error}", expense.category_id);
            return Err(error);
        }
    };

    let notice = notice_view(query.notice.as_deref());

    Ok(expense_view(&expense, &category, notice).into_response())
}

fn expense_view(expense: &Expense, category: &Category, notice: Markup) -> Markup {
    let amount = expense
        .amount
        .to_f64()
        .map(format_currency)
        .unwrap_or_else(|| expense.amount.to_string());
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);
    let delete_url = endpoints::format_endpoint(endpoints::EXPENSE_API, expense.id);
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let detail = |term: &str, value: Markup| {
        html! {
            div class="py-2 grid grid-cols-3 gap-4" {
                dt class="font-medium" { (term) }
                dd class="col-span-2" { (value) }
            }
        }
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-xl"
            {
                (notice)

                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expense" }

                    a href=(endpoints::EXPENSES_VIEW) class=(LINK_STYLE) { "Back to expenses" }
                }

                dl id="expense-details" class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    (detail("Amount", html!((amount))))
                    (detail("Category", html!(span class=(CATEGORY_BADGE_STYLE) { (category.name) })))
                    (detail("Date", html!((expense.date))))
                    (detail("Description", html!((expense.description))))
                    (detail("Recorded", html!((expense.created_at.date()))))
                    (detail("Last updated", html!((expense.updated_at.date()))))
                }

                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        "Are you sure you want to delete this expense?",
                    ))
                }
            }
        }
    };

    base("Expense", &[], &content)
}
