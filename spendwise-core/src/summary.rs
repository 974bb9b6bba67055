//! Per-category aggregation and overall spending statistics.
//!
//! Everything here is recomputed from the table on each call; nothing is cached.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::category::Category;
use crate::transaction::TransactionTable;

/// Aggregate for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub amount: f64,
    /// Share of the grand total, 0-100, rounded to 2 decimals
    pub percentage: f64,
    pub count: usize,
}

/// Overall picture of a transaction table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendingSummary {
    pub total: f64,
    pub transaction_count: usize,
    /// Mean transaction amount
    pub average: f64,
    /// Highest-spending category and its amount
    pub top: (Category, f64),
    /// Sorted by amount descending
    pub categories: Vec<CategorySummary>,
}

/// Group by category and compute totals, shares and basic statistics.
/// Returns `None` for an empty table.
pub fn summarize(table: &TransactionTable) -> Option<SpendingSummary> {
    if table.is_empty() {
        return None;
    }

    let mut groups: HashMap<Category, (f64, usize)> = HashMap::new();
    for t in &table.rows {
        let entry = groups.entry(t.category).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let total = table.total();
    let mut categories: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (amount, count))| CategorySummary {
            category,
            amount,
            percentage: percentage_of(amount, total),
            count,
        })
        .collect();

    // Ties fall back to category order so output is stable across runs.
    categories.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    let top = (categories[0].category, categories[0].amount);
    let transaction_count = table.len();

    Some(SpendingSummary {
        total,
        transaction_count,
        average: total / transaction_count as f64,
        top,
        categories,
    })
}

fn percentage_of(amount: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round2(amount / total * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
