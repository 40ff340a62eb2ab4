//! Expense deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints,
    expense::{ExpenseId, ExpenseNotice, delete_expense},
};

/// The state needed for deleting an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete an expense and send the client back to the expense list.
pub async fn delete_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<DeleteExpenseState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_expense(expense_id, &connection) {
        Ok(()) => {
            tracing::info!("deleted expense {expense_id}");

            (
                HxRedirect(ExpenseNotice::Deleted.redirect_url(endpoints::EXPENSES_VIEW)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DeleteMissingExpense) => {
            tracing::debug!("tried to delete missing expense {expense_id}");
            Error::DeleteMissingExpense.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        endpoints,
        expense::{NewExpense, count_expenses, create_expense},
        test_utils::{assert_hx_redirect, get_test_connection, parse_html_fragment},
    };

    use super::{DeleteExpenseState, delete_expense_endpoint};

    #[tokio::test]
    async fn delete_redirects_to_expense_list() {
        let connection = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Food"), None, &connection).unwrap();
        let expense = create_expense(
            NewExpense {
                amount: dec!(12.5),
                category_id: category.id,
                date: date!(2025 - 10 - 24),
                description: String::new(),
            },
            &connection,
        )
        .unwrap();
        let state = DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_expense_endpoint(Path(expense.id), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/expenses?notice=deleted");
        assert_eq!(count_expenses(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn delete_missing_expense_returns_not_found_alert() {
        let state = DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = delete_expense_endpoint(Path(1), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        let message = html
            .select(&Selector::parse("p").unwrap())
            .next()
            .expect("No error message found")
            .text()
            .collect::<String>();
        assert_eq!(message.trim(), "Could not delete expense");
    }
}
