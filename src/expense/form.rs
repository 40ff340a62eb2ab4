//! The expense form: validation of submitted fields and the form markup.

use std::str::FromStr;

use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    category::{Category, CategoryId},
    endpoints,
    expense::{Expense, ExpenseId, NewExpense, filter::parse_iso_date},
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

pub(super) const AMOUNT_BLANK: &str = "Amount can't be blank";
pub(super) const AMOUNT_NOT_A_NUMBER: &str = "Amount is not a number";
pub(super) const CATEGORY_BLANK: &str = "Category can't be blank";
pub(super) const CATEGORY_MISSING: &str = "Category must exist";
pub(super) const DATE_BLANK: &str = "Date can't be blank";
pub(super) const DATE_INVALID: &str = "Date is not a valid date";

/// The raw fields submitted by the expense form.
///
/// Every field is kept as text so that invalid input can be shown back to the
/// user alongside the error message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseForm {
    pub amount: String,
    pub category_id: String,
    pub date: String,
    pub description: String,
}

/// Field level validation messages for an [ExpenseForm].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFormErrors {
    pub amount: Option<&'static str>,
    pub category_id: Option<&'static str>,
    pub date: Option<&'static str>,
}

impl ExpenseForm {
    /// Validate the form against the existing `categories`.
    ///
    /// # Errors
    /// Returns the message for every invalid field.
    pub fn parse(&self, categories: &[Category]) -> Result<NewExpense, ExpenseFormErrors> {
        let amount = parse_amount(&self.amount);
        let category_id = parse_category_id(&self.category_id, categories);
        let date = parse_date(&self.date);

        match (amount, category_id, date) {
            (Ok(amount), Ok(category_id), Ok(date)) => Ok(NewExpense {
                amount,
                category_id,
                date,
                description: self.description.clone(),
            }),
            (amount, category_id, date) => Err(ExpenseFormErrors {
                amount: amount.err(),
                category_id: category_id.err(),
                date: date.err(),
            }),
        }
    }
}

impl From<&Expense> for ExpenseForm {
    fn from(expense: &Expense) -> Self {
        Self {
            amount: expense.amount.to_string(),
            category_id: expense.category_id.to_string(),
            date: expense.date.to_string(),
            description: expense.description.clone(),
        }
    }
}

fn parse_amount(text: &str) -> Result<Decimal, &'static str> {
    let text = text.trim();

    if text.is_empty() {
        return Err(AMOUNT_BLANK);
    }

    Decimal::from_str(text).map_err(|_| AMOUNT_NOT_A_NUMBER)
}

fn parse_category_id(text: &str, categories: &[Category]) -> Result<CategoryId, &'static str> {
    let text = text.trim();

    if text.is_empty() {
        return Err(CATEGORY_BLANK);
    }

    text.parse::<CategoryId>()
        .ok()
        .filter(|id| categories.iter().any(|category| category.id == *id))
        .ok_or(CATEGORY_MISSING)
}

fn parse_date(text: &str) -> Result<time::Date, &'static str> {
    if text.trim().is_empty() {
        return Err(DATE_BLANK);
    }

    parse_iso_date(text).map_err(|_| DATE_INVALID)
}

/// Where an expense form submits to.
#[derive(Debug, Clone, Copy)]
pub(super) enum ExpenseFormTarget {
    Create,
    Update(ExpenseId),
}

pub(super) fn expense_form_view(
    target: ExpenseFormTarget,
    form: &ExpenseForm,
    categories: &[Category],
    errors: &ExpenseFormErrors,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        ExpenseFormTarget::Create => (
            Some(endpoints::EXPENSES_API.to_owned()),
            None,
            "Create Expense",
        ),
        ExpenseFormTarget::Update(expense_id) => (
            None,
            Some(endpoints::format_endpoint(endpoints::EXPENSE_API, expense_id)),
            "Update Expense",
        ),
    };
    let selected_category = form.category_id.trim();

    let field_error = |message: Option<&str>| {
        html! {
            @if let Some(message) = message {
                p class=(FORM_ERROR_STYLE) { (message) }
            }
        }
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
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper"
                {
                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        placeholder="0.00"
                        value=(form.amount)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (field_error(errors.amount))
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="category_id"
                    name="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_category.is_empty()] { "Select a category" }

                    @for category in categories {
                        @let id = category.id.to_string();
                        option value=(id) selected[id == selected_category] { (category.name) }
                    }
                }

                (field_error(errors.category_id))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(form.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors.date))
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    id="description"
                    name="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}

#[cfg(test)]
mod parse_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName},
        expense::NewExpense,
    };

    use super::{
        AMOUNT_BLANK, AMOUNT_NOT_A_NUMBER, CATEGORY_BLANK, CATEGORY_MISSING, DATE_BLANK,
        DATE_INVALID, ExpenseForm, ExpenseFormErrors,
    };

    fn categories() -> Vec<Category> {
        vec![Category {
            id: 3,
            name: CategoryName::new_unchecked("Food & Dining"),
            description: None,
        }]
    }

    #[test]
    fn valid_form_parses() {
        let form = ExpenseForm {
            amount: " 12.50 ".to_owned(),
            category_id: "3".to_owned(),
            date: "2025-10-24".to_owned(),
            description: "Lunch at local cafe".to_owned(),
        };

        assert_eq!(
            form.parse(&categories()),
            Ok(NewExpense {
                amount: dec!(12.50),
                category_id: 3,
                date: date!(2025 - 10 - 24),
                description: "Lunch at local cafe".to_owned(),
            })
        );
    }

    #[test]
    fn blank_form_reports_every_field() {
        let got = ExpenseForm::default().parse(&categories());

        assert_eq!(
            got,
            Err(ExpenseFormErrors {
                amount: Some(AMOUNT_BLANK),
                category_id: Some(CATEGORY_BLANK),
                date: Some(DATE_BLANK),
            })
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        let form = ExpenseForm {
            amount: "twelve".to_owned(),
            category_id: "99".to_owned(),
            date: "2025-02-30".to_owned(),
            description: String::new(),
        };

        assert_eq!(
            form.parse(&categories()),
            Err(ExpenseFormErrors {
                amount: Some(AMOUNT_NOT_A_NUMBER),
                category_id: Some(CATEGORY_MISSING),
                date: Some(DATE_INVALID),
            })
        );
    }

    #[test]
    fn non_numeric_category_must_exist() {
        let form = ExpenseForm {
            amount: "1".to_owned(),
            category_id: "food".to_owned(),
            date: "2025-10-24".to_owned(),
            description: String::new(),
        };

        let errors = form.parse(&categories()).unwrap_err();

        assert_eq!(errors.category_id, Some(CATEGORY_MISSING));
        assert_eq!(errors.amount, None);
        assert_eq!(errors.date, None);
    }
}
