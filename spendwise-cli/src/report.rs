//! Plain-text rendering of tables and charts for the terminal.

use spendwise_core::{SpendingSummary, TransactionTable};
use std::fmt::Write;

const BAR_WIDTH: usize = 40;
const MAX_DESC: usize = 32;

/// First `limit` rows with their current category.
pub fn render_preview(table: &TransactionTable, limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<w$}  {:>12}  {}", "description", "amount", "category", w = MAX_DESC);
    for t in table.rows.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:<w$}  {:>12.2}  {}",
            truncate(&t.description, MAX_DESC),
            t.amount,
            t.category,
            w = MAX_DESC
        );
    }
    if table.len() > limit {
        let _ = writeln!(out, "... {} more", table.len() - limit);
    }
    out
}

/// Category, amount and percentage columns, largest first.
pub fn render_summary_table(summary: &SpendingSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<14} {:>14} {:>8} {:>6}", "category", "amount", "share", "count");
    for c in &summary.categories {
        let _ = writeln!(
            out,
            "{:<14} {:>14.2} {:>7.2}% {:>6}",
            c.category.as_str(),
            c.amount,
            c.percentage,
            c.count
        );
    }
    out
}

/// Horizontal bar per category, scaled so the largest bar is `BAR_WIDTH` wide.
pub fn render_bar_chart(summary: &SpendingSummary) -> String {
    let max = summary
        .categories
        .iter()
        .map(|c| c.amount)
        .fold(0.0_f64, f64::max);
    let mut out = String::new();
    for c in &summary.categories {
        let len = if max > 0.0 && c.amount > 0.0 {
            ((c.amount / max) * BAR_WIDTH as f64).round().max(1.0) as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:<14} |{:<w$}| {:.2}",
            c.category.as_str(),
            "#".repeat(len),
            c.amount,
            w = BAR_WIDTH
        );
    }
    out
}

/// Total, per-category breakdown, top category and average.
pub fn render_overall(summary: &SpendingSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Spending: {:.2}", summary.total);
    let _ = writeln!(out, "\nSpending Breakdown by Category:");
    for c in &summary.categories {
        let _ = writeln!(out, "  - {}: {:.2} ({:.1}%)", c.category, c.amount, c.percentage);
    }
    let (top, amount) = summary.top;
    let _ = writeln!(out, "\nHighest spending category: {top} ({amount:.2})");
    let _ = writeln!(out, "Average Transaction Amount: {:.2}", summary.average);
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max - 1).collect();
    t.push('~');
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendwise_core::{summarize, Category, Transaction};

    fn table() -> TransactionTable {
        TransactionTable::from_rows(vec![
            Transaction::new("KFC Gulberg", 600.0).with_category(Category::Food),
            Transaction::new("Careem", 400.0).with_category(Category::Transport),
        ])
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let s = summarize(&table()).unwrap();
        let chart = render_bar_chart(&s);
        let lines: Vec<_> = chart.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('#').count(), 27);
        assert!(lines[0].starts_with("Food"));
    }

    #[test]
    fn test_summary_table_shows_percentages() {
        let s = summarize(&table()).unwrap();
        let rendered = render_summary_table(&s);
        assert!(rendered.contains("60.00%"));
        assert!(rendered.contains("40.00%"));
    }

    #[test]
    fn test_overall_mentions_top_and_average() {
        let s = summarize(&table()).unwrap();
        let rendered = render_overall(&s);
        assert!(rendered.contains("Total Spending: 1000.00"));
        assert!(rendered.contains("Highest spending category: Food (600.00)"));
        assert!(rendered.contains("Average Transaction Amount: 500.00"));
    }

    #[test]
    fn test_preview_limits_rows() {
        let rendered = render_preview(&table(), 1);
        assert!(rendered.contains("KFC Gulberg"));
        assert!(!rendered.contains("Careem"));
        assert!(rendered.contains("... 1 more"));
    }

    #[test]
    fn test_truncate_long_descriptions() {
        let long = "X".repeat(50);
        assert_eq!(truncate(&long, 10).chars().count(), 10);
        assert_eq!(truncate("short", 10), "short");
    }
}
