//! Alert messages that are swapped into the page's alert container.
//!
//! Forms and buttons that talk to the API set `hx-target-error="#alert-container"`
//! so that any error response is rendered as one of these alerts. Pages also
//! render success alerts inline to confirm a change after a redirect.

use axum::response::Html;
use maud::{Markup, html};

/// A dismissable message.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A confirmation that an action succeeded.
    Success { message: String, details: String },
    /// An error message with details on how to fix the problem.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    pub fn into_markup(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, details),
            Alert::Error { message, details } => (ERROR_STYLE, message, details),
        };

        html! {
            div
                role="alert"
                class=(container_style)
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        class="font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 rounded border text-green-800 bg-green-50 \
    border-green-300 dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "p-4 mb-4 rounded border text-red-800 bg-red-50 \
    border-red-300 dark:bg-gray-800 dark:text-red-400 dark:border-red-800";
