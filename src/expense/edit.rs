//! Expense editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::get_all_categories,
    endpoints,
    expense::{
        ExpenseId, ExpenseNotice,
        create::invalid_expense_form,
        form::{
            CATEGORY_MISSING, ExpenseForm, ExpenseFormErrors, ExpenseFormTarget,
            expense_form_view,
        },
        get_expense, update_expense,
    },
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
};

/// The state needed for the edit expense page and the update endpoint.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the expense editing page.
pub async fn get_edit_expense_page(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(expense_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve expense {expense_id}: {error}")
    })?;
    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense_id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = expense_form_view(
        ExpenseFormTarget::Update(expense_id),
        &ExpenseForm::from(&expense),
        &categories,
        &ExpenseFormErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) {
            h1 class="text-xl font-bold mb-4" { "Edit Expense" }
            (form)
        }
    };

    Ok(base("Edit Expense", &[dollar_input_styles()], &content).into_response())
}

/// Handle expense update form submission.
pub async fn update_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let target = ExpenseFormTarget::Update(expense_id);

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

    let changes = match form.parse(&categories) {
        Ok(changes) => changes,
        Err(errors) => return invalid_expense_form(target, &form, &categories, errors),
    };

    match update_expense(expense_id, changes, &connection) {
        Ok(_) => {
            let expense_url = endpoints::format_endpoint(endpoints::EXPENSE_VIEW, expense_id);

            (
                HxRedirect(ExpenseNotice::Updated.redirect_url(&expense_url)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::InvalidCategory(_)) => invalid_expense_form(
            target,
            &form,
            &categories,
            ExpenseFormErrors {
                category_id: Some(CATEGORY_MISSING),
                ..Default::default()
            },
        ),
        Err(Error::UpdateMissingExpense) => {
            tracing::debug!("tried to update missing expense {expense_id}");
            Error::UpdateMissingExpense.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
