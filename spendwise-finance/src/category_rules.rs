//! Deterministic keyword rules mapping descriptions to categories.
//!
//! Case-insensitive substring match; the first category in table order with a
//! matching keyword wins, so "Shell Mart" is Groceries, not Transport.

use spendwise_core::{Category, TransactionTable};
use tracing::debug;

/// Ordered keyword table. `Other` and `Utilities` have no keywords.
pub const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &["restaurant", "kfc", "pizza", "burger", "cafe", "coffee", "meal", "food", "biryani"],
    ),
    (Category::Groceries, &["supermarket", "mart", "grocery", "store"]),
    (
        Category::Transport,
        &["uber", "careem", "fuel", "shell", "total", "petrol", "bus", "metro"],
    ),
    (
        Category::Bills,
        &["electric", "gas", "water", "internet", "utility", "bill"],
    ),
    (
        Category::Shopping,
        &["daraz", "mall", "clothes", "shoe", "fashion", "shop"],
    ),
    (
        Category::Pharmacy,
        &["pharmacy", "medical", "clinic", "hospital", "med"],
    ),
    (
        Category::Entertainment,
        &["cinema", "movie", "game", "netflix", "spotify"],
    ),
];

/// Categorize a single description.
pub fn categorize(description: &str) -> Category {
    let desc = description.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Assign a rule-based category to every row, replacing whatever was there.
pub fn categorize_all(table: &mut TransactionTable) {
    for txn in &mut table.rows {
        txn.category = categorize(&txn.description);
    }
    debug!(
        "rule pass: {} of {} rows unresolved",
        table.unresolved().count(),
        table.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendwise_core::Transaction;

    #[test]
    fn test_kfc_is_food() {
        assert_eq!(categorize("KFC Gulberg"), Category::Food);
    }

    #[test]
    fn test_no_keyword_is_other() {
        assert_eq!(categorize("Zeta Traders 42"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn test_store_substring_is_groceries() {
        // "store" is a grocery keyword, so any "... Store ..." lands there.
        assert_eq!(categorize("Random Store XYZ"), Category::Groceries);
    }

    #[test]
    fn test_first_match_wins() {
        // Groceries is checked before Transport.
        assert_eq!(categorize("SHELL MART"), Category::Groceries);
        // Food is checked before Bills.
        assert_eq!(categorize("Gas station cafe"), Category::Food);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize("NETFLIX.COM"), Category::Entertainment);
        assert_eq!(categorize("careem"), Category::Transport);
        assert_eq!(categorize("City Hospital"), Category::Pharmacy);
    }

    #[test]
    fn test_deterministic() {
        for d in ["Daraz order", "K-Electric bill", "unknown thing"] {
            assert_eq!(categorize(d), categorize(d));
        }
    }

    #[test]
    fn test_categorize_all_keeps_rows() {
        let mut table = TransactionTable::from_rows(vec![
            Transaction::new("Pizza Hut", 1500.0),
            Transaction::new("Mystery", 10.0).with_category(Category::Food),
            Transaction::new("Uber trip", 400.0),
        ]);
        categorize_all(&mut table);
        let cats: Vec<_> = table.rows.iter().map(|t| t.category).collect();
        assert_eq!(cats, vec![Category::Food, Category::Other, Category::Transport]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_every_keyword_maps_to_its_category() {
        for (category, keywords) in KEYWORD_RULES {
            for k in *keywords {
                let got = categorize(k);
                // A keyword can be shadowed by an earlier category (e.g. "med" in "medical").
                let first = KEYWORD_RULES
                    .iter()
                    .position(|(c, _)| *c == got)
                    .unwrap();
                let own = KEYWORD_RULES.iter().position(|(c, _)| c == category).unwrap();
                assert!(first <= own, "{k} mapped to later category {got}");
            }
        }
    }
}
