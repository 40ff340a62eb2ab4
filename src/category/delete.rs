//! Category deletion endpoint.

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
    category::{CategoryId, db::delete_category},
    endpoints,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion.
///
/// Categories that are still used by expenses are not deleted and the client
/// gets an alert with status 409.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(_) => {
            tracing::info!("deleted category {category_id}");

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ (Error::DeleteMissingCategory | Error::CategoryInUse(_))) => {
            tracing::debug!("could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rust_decimal_macros::dec;
    use scraper::Html;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category, delete_category_endpoint, get_all_categories},
        endpoints,
        expense::{NewExpense, create_expense},
        test_utils::{
            assert_hx_redirect, assert_valid_html, get_header, get_test_connection,
            parse_html_fragment,
        },
    };

    use super::DeleteCategoryEndpointState;

    fn get_delete_category_state() -> DeleteCategoryEndpointState {
        DeleteCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    #[tokio::test]
    async fn delete_category_endpoint_succeeds() {
        let state = get_delete_category_state();
        let category = create_category(
            CategoryName::new_unchecked("Test Category"),
            None,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");

        let response = delete_category_endpoint(Path(category.id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let remaining = get_all_categories(&state.db_connection.lock().unwrap()).unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn delete_category_endpoint_with_invalid_id_returns_error_html() {
        let state = get_delete_category_state();

        let response = delete_category_endpoint(Path(999999), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete category");
    }

    #[tokio::test]
    async fn delete_category_endpoint_in_use_returns_conflict() {
        let state = get_delete_category_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            let category =
                create_category(CategoryName::new_unchecked("Food"), None, &connection).unwrap();
            create_expense(
                NewExpense {
                    amount: dec!(12.5),
                    category_id: category.id,
                    date: date!(2025 - 10 - 24),
                    description: "Lunch at local cafe".to_owned(),
                },
                &connection,
            )
            .unwrap();
            category
        };

        let response = delete_category_endpoint(Path(category.id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_error_content(&html, "Could not delete category");
        let remaining = get_all_categories(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[track_caller]
    fn assert_error_content(html: &Html, want_error_message: &str) {
        let p = scraper::Selector::parse("p").unwrap();
        let error_message = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect::<Vec<_>>()
            .join("");
        let got_error_message = error_message.trim();

        assert_eq!(want_error_message, got_error_message);
    }
}
