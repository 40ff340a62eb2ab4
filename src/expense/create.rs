//! Expense creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    expense::{
        ExpenseNotice, create_expense,
        form::{
            CATEGORY_MISSING, ExpenseForm, ExpenseFormErrors, ExpenseFormTarget,
            expense_form_view,
        },
    },
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles, link},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the new expense page and the create endpoint.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to fill in today's date.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the new expense page with today's date filled in.
pub async fn get_new_expense_page(
    State(state): State<CreateExpenseState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let form = ExpenseForm {
        date: today.to_string(),
        ..Default::default()
    };
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) {
            h1 class="text-xl font-bold mb-4" { "New Expense" }

            @if categories.is_empty() {
                p class="mb-4 text-gray-500 dark:text-gray-400" {
                    "You need a category before you can record an expense. "
                    (link(endpoints::NEW_CATEGORY_VIEW, "Create a category"))
                }
            }

            (expense_form_view(
                ExpenseFormTarget::Create,
                &form,
                &categories,
                &ExpenseFormErrors::default(),
            ))
        }
    };

    Ok(base("New Expense", &[dollar_input_styles()], &content).into_response())
}

/// Handle expense creation form submission.
///
/// On success the client is redirected to the new expense. Invalid fields are
/// rendered back into the form with status 422.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let categories = match get_all_categories(&connection) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::error!("Failed to retrieve categories: {error}");
            return error.into_alert_response();
        }
    };

    let new_expense = match form.parse(&categories) {
        Ok(new_expense) => new_expense,
        Err(errors) => {
            return invalid_expense_form(ExpenseFormTarget::Create, &form, &categories, errors);
        }
    };

    match create_expense(new_expense, &connection) {
        Ok(expense) => {
            tracing::info!("created expense {}", expense.id);
            let expense_url = endpoints::format_endpoint(endpoints::EXPENSE_VIEW, expense.id);

            (
                HxRedirect(ExpenseNotice::Created.redirect_url(&expense_url)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::InvalidCategory(category_id)) => {
            tracing::debug!("category {category_id} was removed before the expense was saved");

            invalid_expense_form(
                ExpenseFormTarget::Create,
                &form,
                &categories,
                ExpenseFormErrors {
                    category_id: Some(CATEGORY_MISSING),
                    ..Default::default()
                },
            )
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an expense: {error}");

            error.into_alert_response()
        }
    }
}

pub(super) fn invalid_expense_form(
    target: ExpenseFormTarget,
    form: &ExpenseForm,
    categories: &[Category],
    errors: ExpenseFormErrors,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        expense_form_view(target, form, categories, &errors),
    )
        .into_response()
}
