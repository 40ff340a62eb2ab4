//! Confirmations shown on the page a client lands on after changing an expense.
//!
//! The create, update and delete endpoints redirect with a `notice` query
//! parameter and the target page renders the matching success alert.

use std::{fmt, str::FromStr};

use maud::{Markup, html};
use serde::Deserialize;

use crate::alert::Alert;

/// The change to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseNotice {
    Created,
    Updated,
    Deleted,
}

impl ExpenseNotice {
    pub fn message(self) -> &'static str {
        match self {
            ExpenseNotice::Created => "Expense was successfully created.",
            ExpenseNotice::Updated => "Expense was successfully updated.",
            ExpenseNotice::Deleted => "Expense was successfully deleted.",
        }
    }

    /// `path` with this notice added to the query string.
    pub fn redirect_url(self, path: &str) -> String {
        format!("{path}?notice={self}")
    }
}

impl fmt::Display for ExpenseNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpenseNotice::Created => "created",
            ExpenseNotice::Updated => "updated",
            ExpenseNotice::Deleted => "deleted",
        };

        f.write_str(name)
    }
}

impl FromStr for ExpenseNotice {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(ExpenseNotice::Created),
            "updated" => Ok(ExpenseNotice::Updated),
            "deleted" => Ok(ExpenseNotice::Deleted),
            _ => Err(()),
        }
    }
}

/// The query string of a page that can confirm a change.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// The success alert for a raw `notice` query value.
///
/// Unknown values render nothing rather than failing the page.
pub fn notice_view(notice: Option<&str>) -> Markup {
    let Some(notice) = notice.and_then(|value| value.parse::<ExpenseNotice>().ok()) else {
        return html!();
    };

    html!(
        div id="notice" class="w-full"
        {
            (Alert::Success {
                message: notice.message().to_owned(),
                details: String::new(),
            }
            .into_markup())
        }
    )
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::{ExpenseNotice, notice_view};

    #[test]
    fn redirect_url_names_the_notice() {
        assert_eq!(
            ExpenseNotice::Created.redirect_url("/expenses/3"),
            "/expenses/3?notice=created"
        );
        assert_eq!(
            ExpenseNotice::Deleted.redirect_url("/expenses"),
            "/expenses?notice=deleted"
        );
    }

    #[test]
    fn known_notice_renders_success_alert() {
        let html = Html::parse_fragment(&notice_view(Some("updated")).into_string());

        let text = html
            .select(&Selector::parse("#notice [role=alert] p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(text, vec!["Expense was successfully updated."]);
    }

    #[test]
    fn unknown_or_missing_notice_renders_nothing() {
        assert_eq!(notice_view(Some("hacked")).into_string(), "");
        assert_eq!(notice_view(None).into_string(), "");
    }
}
