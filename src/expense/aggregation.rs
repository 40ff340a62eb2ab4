//! Grouping expenses by category for the pie charts.

use std::collections::HashMap;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Serialize;

use crate::{Error, expense::ExpenseRow};

/// Per-category totals, stored as three parallel series of equal length.
///
/// `labels[i]`, `count_data[i]` and `amount_data[i]` all describe the same
/// category. Categories appear in the order they are first seen in the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySummary {
    /// Category names.
    pub labels: Vec<String>,
    /// Number of expenses per category.
    pub count_data: Vec<i64>,
    /// Total amount spent per category.
    pub amount_data: Vec<f64>,
}

impl CategorySummary {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over `(label, count, amount)` for each category.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64, f64)> {
        self.labels
            .iter()
            .zip(&self.count_data)
            .zip(&self.amount_data)
            .map(|((label, count), amount)| (label.as_str(), *count, *amount))
    }
}

struct CategoryGroup<'a> {
    name: &'a str,
    count: i64,
    total: Decimal,
}

/// Count and sum `rows` per category name.
///
/// # Errors
/// Returns a:
/// - [Error::DanglingCategory] if a row has no category name,
/// - [Error::AmountOverflow] if a category total exceeds the range of [Decimal],
/// - or [Error::AmountConversion] if a total does not fit in an `f64`.
pub fn summarize_by_category(rows: &[ExpenseRow]) -> Result<CategorySummary, Error> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let name = row
            .category_name
            .as_deref()
            .ok_or(Error::DanglingCategory(row.id))?;

        match group_index.get(name) {
            Some(&index) => {
                let group = &mut groups[index];
                group.count += 1;
                group.total = group
                    .total
                    .checked_add(row.amount)
                    .ok_or_else(|| Error::AmountOverflow(name.to_owned()))?;
            }
            None => {
                group_index.insert(name, groups.len());
                groups.push(CategoryGroup {
                    name,
                    count: 1,
                    total: row.amount,
                });
            }
        }
    }

    let mut summary = CategorySummary {
        labels: Vec::with_capacity(groups.len()),
        count_data: Vec::with_capacity(groups.len()),
        amount_data: Vec::with_capacity(groups.len()),
    };

    for group in groups {
        let amount = group
            .total
            .to_f64()
            .ok_or_else(|| Error::AmountConversion(group.total.to_string()))?;

        summary.labels.push(group.name.to_owned());
        summary.count_data.push(group.count);
        summary.amount_data.push(amount);
    }

    Ok(summary)
}
