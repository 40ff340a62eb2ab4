//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{CategoryName, create_category, domain::CategoryFormData},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = category_form_view(
        CategoryFormTarget::Create,
        &CategoryFormData::default(),
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) {
            h1 class="text-xl font-bold mb-4" { "New Category" }
            (form)
        }
    };

    base("Create Category", &[], &content).into_response()
}

/// Handle category creation form submission.
///
/// Validation errors are rendered back into the form with status 422.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => {
            return invalid_category_form(CategoryFormTarget::Create, &form_data, error);
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(name, form_data.description(), &connection) {
        Ok(category) => {
            tracing::info!("created category {} ({})", category.name, category.id);

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategoryName(_)) => {
            invalid_category_form(CategoryFormTarget::Create, &form_data, error)
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

/// Where a category form submits to.
#[derive(Debug, Clone, Copy)]
pub(super) enum CategoryFormTarget {
    Create,
    Update(crate::category::CategoryId),
}

pub(super) fn invalid_category_form(
    target: CategoryFormTarget,
    form_data: &CategoryFormData,
    error: Error,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        category_form_view(target, form_data, &format!("Error: {error}")),
    )
        .into_response()
}

pub(super) fn category_form_view(
    target: CategoryFormTarget,
    form_data: &CategoryFormData,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        CategoryFormTarget::Create => (
            Some(endpoints::CATEGORIES_API.to_owned()),
            None,
            "Create Category",
        ),
        CategoryFormTarget::Update(category_id) => (
            None,
            Some(endpoints::format_endpoint(
                endpoints::CATEGORY_API,
                category_id,
            )),
            "Update Category",
        ),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-422="this"
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(form_data.name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label
                    for="description"
                    class=(FORM_LABEL_STYLE)
                {
                    "Description"
                }

                textarea
                    id="description"
                    name="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form_data.description)
                }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
