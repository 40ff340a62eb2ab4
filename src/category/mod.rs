//! Categories for grouping expenses.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    UNCATEGORIZED, UNCATEGORIZED_DESCRIPTION, create_category, create_category_table,
    get_all_categories, get_category, get_or_create_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
