//! Expenses: storage, the create/edit/delete pages, and the list page with its
//! date filter, per-category pie charts and CSV export.

mod aggregation;
mod chart;
mod core;
mod create;
mod delete;
mod edit;
mod export;
mod filter;
mod form;
mod list;
mod notice;
mod show;

pub use aggregation::{CategorySummary, summarize_by_category};
pub use core::{
    Expense, ExpenseId, NewExpense, count_expenses, create_expense, create_expense_table,
    delete_expense, get_expense, update_expense,
};
pub use create::{create_expense_endpoint, get_new_expense_page};
pub use delete::delete_expense_endpoint;
pub use edit::{get_edit_expense_page, update_expense_endpoint};
pub use export::{CsvExport, csv_filename, export_csv};
pub use filter::{DateFilter, ExpenseRow, get_filtered_expenses};
pub use form::{ExpenseForm, ExpenseFormErrors};
pub use list::get_expenses_page;
pub use notice::{ExpenseNotice, NoticeQuery, notice_view};
pub use show::get_expense_page;
