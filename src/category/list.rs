//! Categories listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, get_all_categories},
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct CategoryRow {
    category: Category,
    edit_url: String,
    delete_url: String,
    expense_count: u32,
}

/// Render the categories listing page with expense counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let expenses_per_category = count_expenses_per_category(&connection)
        .inspect_err(|error| tracing::error!("Could not count expenses per category: {error}"))?;

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: endpoints::format_endpoint(endpoints::CATEGORY_API, category.id),
            expense_count: expenses_per_category
                .get(&category.id)
                .copied()
                .unwrap_or_default(),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn count_expenses_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare("SELECT category_id, COUNT(1) FROM expense GROUP BY category_id")?
        .query_map((), |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        let confirm_message = format!(
            "Are you sure you want to delete '{}'?",
            row.category.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (row.category.name) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.category.description.as_deref().unwrap_or_default())
                }

                td class=(TABLE_CELL_STYLE) { (row.expense_count) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &confirm_message,
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "New Category"
                    }
                }

                section class="dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
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
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category, get_categories_page},
        expense::{NewExpense, create_expense},
        test_utils::{assert_valid_html, get_test_connection, parse_html_document},
    };

    use super::{CategoriesPageState, count_expenses_per_category};

    #[test]
    fn counts_expenses_per_category() {
        let connection = get_test_connection();
        let food = create_category(CategoryName::new_unchecked("Food"), None, &connection)
            .expect("Could not create test category");
        let transport = create_category(CategoryName::new_unchecked("Transport"), None, &connection)
            .expect("Could not create test category");
        let unused = create_category(CategoryName::new_unchecked("Unused"), None, &connection)
            .expect("Could not create test category");
        let want_food_count = 3;
        let want_transport_count = 2;
        for (category_id, count) in [(food.id, want_food_count), (transport.id, want_transport_count)]
        {
            for i in 0..count {
                create_expense(
                    NewExpense {
                        amount: dec!(1.5),
                        category_id,
                        date: date!(2025 - 10 - 24),
                        description: i.to_string(),
                    },
                    &connection,
                )
                .unwrap();
            }
        }

        let counts = count_expenses_per_category(&connection).unwrap();

        assert_eq!(want_food_count, counts[&food.id]);
        assert_eq!(want_transport_count, counts[&transport.id]);
        assert_eq!(counts.get(&unused.id), None);
    }

    #[tokio::test]
    async fn page_lists_categories_with_counts() {
        let connection = get_test_connection();
        let food = create_category(
            CategoryName::new_unchecked("Food & Dining"),
            Some("Restaurants and groceries"),
            &connection,
        )
        .unwrap();
        create_category(CategoryName::new_unchecked("Entertainment"), None, &connection).unwrap();
        create_expense(
            NewExpense {
                amount: dec!(12.5),
                category_id: food.id,
                date: date!(2025 - 10 - 24),
                description: "Lunch at local cafe".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let state = CategoriesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows = html
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| {
                row.select(&Selector::parse("td").unwrap())
                    .take(3)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec!["Entertainment", "", "0"],
                vec!["Food & Dining", "Restaurants and groceries", "1"],
            ]
        );
    }
}
