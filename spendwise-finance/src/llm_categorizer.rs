//! Refine rows the keyword rules left as `Other` by asking an LLM.
//!
//! All unresolved rows go out in a single prompt. The reply is merged back by
//! exact description match, so every row sharing a description gets the same
//! label and later reply items overwrite earlier ones. Rows with the same
//! description but different amounts cannot be told apart.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spendwise_core::{Category, TransactionTable};
use tracing::{error, info, warn};

use crate::llm::{ChatClient, ChatMessage};

const SYSTEM_PROMPT: &str = "You must return only valid JSON.";

/// What the LLM pass did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmOutcome {
    /// No `Other` rows, client never called
    NothingToDo,
    /// `requested` rows were sent, `updated` rows had their category replaced
    Applied { requested: usize, updated: usize },
    /// Call or parse failed; table left untouched
    Failed,
}

#[derive(Debug, Serialize)]
struct PromptRow<'a> {
    description: &'a str,
    amount: f64,
}

/// One element of the JSON array the model is asked to return.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LlmLabel {
    pub description: Option<String>,
    /// Echoed back by the model; not used for matching
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub rationale: Option<String>,
}

/// Send every `Other` row to the model and merge the answers back.
///
/// Never fails: errors are logged and reported as `LlmOutcome::Failed`.
pub fn categorize_with_llm(table: &mut TransactionTable, client: &dyn ChatClient) -> LlmOutcome {
    let requested = table.unresolved().count();
    if requested == 0 {
        info!("No 'Other' transactions, nothing to send to LLM");
        return LlmOutcome::NothingToDo;
    }

    info!("Sending {requested} uncategorized transactions to LLM");

    let messages = match build_messages(table) {
        Ok(m) => m,
        Err(e) => {
            error!("LLM categorization failed: {e:#}");
            return LlmOutcome::Failed;
        }
    };

    let reply = match client.complete(&messages) {
        Ok(r) => r,
        Err(e) => {
            error!("LLM categorization failed: {e:#}");
            return LlmOutcome::Failed;
        }
    };

    let labels = match extract_labels(&reply) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to parse LLM response as JSON: {e:#}");
            error!("Response content: {reply}");
            return LlmOutcome::Failed;
        }
    };

    let updated = merge_labels(table, &labels);
    info!("LLM categorization complete: {updated} of {requested} rows updated");
    LlmOutcome::Applied { requested, updated }
}

/// Build the system + user messages for the unresolved rows.
pub fn build_messages(table: &TransactionTable) -> Result<Vec<ChatMessage>> {
    let rows: Vec<PromptRow> = table
        .unresolved()
        .map(|t| PromptRow {
            description: &t.description,
            amount: t.amount,
        })
        .collect();
    let listing = serde_json::to_string_pretty(&rows).context("serialize prompt rows")?;
    let allowed: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();

    let prompt = format!(
        "You are a financial transaction categorizer.\n\
         Assign each transaction one of these categories ONLY: {}.\n\
         Return a valid JSON array where each item contains:\n\
         \"description\", \"amount\", \"category\", and a short \"rationale\".\n\
         \n\
         Transactions:\n\
         {listing}\n",
        allowed.join(", ")
    );

    Ok(vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)])
}

/// Pull the labels out of a model reply. Array items that don't fit
/// `LlmLabel` are logged and skipped.
pub fn extract_labels(reply: &str) -> Result<Vec<LlmLabel>> {
    let items = extract_array(reply)?;
    let mut labels = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LlmLabel>(item) {
            Ok(label) => labels.push(label),
            Err(e) => warn!("Skipping malformed LLM item {i}: {e}"),
        }
    }
    Ok(labels)
}

/// Find the JSON array in a reply. Tries the whole reply first, then the
/// contents of a markdown code fence, then the outermost `[...]` span.
fn extract_array(reply: &str) -> Result<Vec<Value>> {
    let reply = reply.trim();
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(reply) {
        return Ok(items);
    }

    let fence_re = Regex::new(r"(?s)```(?:json)?\s*(.*?)```")?;
    let array_re = Regex::new(r"(?s)\[.*\]")?;

    let unfenced = fence_re
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(reply);
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(unfenced) {
        return Ok(items);
    }

    let Some(span) = array_re.find(unfenced) else {
        bail!("no JSON array in response");
    };
    serde_json::from_str(span.as_str()).context("parse JSON array from response")
}

/// Apply labels to every row with a matching description. Returns how many
/// rows were written (a row written twice counts twice).
pub fn merge_labels(table: &mut TransactionTable, labels: &[LlmLabel]) -> usize {
    let mut updated = 0;
    for label in labels {
        let Some(desc) = label.description.as_deref() else {
            continue;
        };
        if !table.rows.iter().any(|t| t.description == desc) {
            continue;
        }

        let category = match label.category.as_deref() {
            None => Category::Other,
            Some(raw) => match raw.parse::<Category>() {
                Ok(c) => c,
                Err(e) => {
                    warn!("Ignoring LLM label for '{desc}': {e}");
                    continue;
                }
            },
        };
        let rationale = label.rationale.clone().unwrap_or_default();

        for txn in table.rows.iter_mut().filter(|t| t.description == desc) {
            txn.category = category;
            txn.rationale = Some(rationale.clone());
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendwise_core::Transaction;
    use std::cell::RefCell;

    struct FakeClient {
        reply: Result<String, String>,
        calls: RefCell<Vec<Vec<ChatMessage>>>,
    }

    impl FakeClient {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatClient for FakeClient {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.borrow_mut().push(messages.to_vec());
            match &self.reply {
                Ok(r) => Ok(r.clone()),
                Err(e) => bail!("{e}"),
            }
        }
    }

    fn sample() -> TransactionTable {
        TransactionTable::from_rows(vec![
            Transaction::new("KFC Gulberg", 1200.0).with_category(Category::Food),
            Transaction::new("PTCL Payment", 2500.0),
            Transaction::new("Zeta Traders", 800.0),
            Transaction::new("PTCL Payment", 900.0),
        ])
    }

    #[test]
    fn test_nothing_to_do_skips_client() {
        let mut table = TransactionTable::from_rows(vec![
            Transaction::new("KFC", 10.0).with_category(Category::Food),
        ]);
        let client = FakeClient::ok("[]");
        assert_eq!(categorize_with_llm(&mut table, &client), LlmOutcome::NothingToDo);
        assert!(client.calls.borrow().is_empty());
    }

    #[test]
    fn test_prompt_lists_only_other_rows() {
        let messages = build_messages(&sample()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        let user = &messages[1].content;
        assert!(user.contains("PTCL Payment"));
        assert!(user.contains("Zeta Traders"));
        assert!(!user.contains("KFC"));
        assert!(user.contains("Utilities"));
    }

    #[test]
    fn test_applies_labels_to_all_matching_rows() {
        let mut table = sample();
        let client = FakeClient::ok(
            r#"[{"description":"PTCL Payment","amount":2500,"category":"Utilities","rationale":"telecom"},
                {"description":"Zeta Traders","amount":800,"category":"shopping"}]"#,
        );
        let outcome = categorize_with_llm(&mut table, &client);
        assert_eq!(outcome, LlmOutcome::Applied { requested: 3, updated: 3 });
        assert_eq!(table.rows[1].category, Category::Utilities);
        assert_eq!(table.rows[3].category, Category::Utilities);
        assert_eq!(table.rows[1].rationale.as_deref(), Some("telecom"));
        assert_eq!(table.rows[2].category, Category::Shopping);
        assert_eq!(table.rows[2].rationale.as_deref(), Some(""));
        // Untouched rule-based row keeps its category and gets no rationale.
        assert_eq!(table.rows[0].category, Category::Food);
        assert!(table.rows[0].rationale.is_none());
        assert_eq!(client.calls.borrow().len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut table = sample();
        let labels = extract_labels(
            r#"[{"description":"Zeta Traders","category":"Bills"},
                {"description":"Zeta Traders","category":"Groceries"}]"#,
        )
        .unwrap();
        merge_labels(&mut table, &labels);
        assert_eq!(table.rows[2].category, Category::Groceries);
    }

    #[test]
    fn test_missing_category_means_other_and_unknown_is_skipped() {
        let mut table = sample();
        let labels = extract_labels(
            r#"[{"description":"Zeta Traders","rationale":"no idea"},
                {"description":"PTCL Payment","category":"Telecom"}]"#,
        )
        .unwrap();
        let updated = merge_labels(&mut table, &labels);
        assert_eq!(updated, 1);
        assert_eq!(table.rows[2].category, Category::Other);
        assert_eq!(table.rows[2].rationale.as_deref(), Some("no idea"));
        assert_eq!(table.rows[1].category, Category::Other);
        assert!(table.rows[1].rationale.is_none());
    }

    #[test]
    fn test_unmatched_descriptions_are_ignored() {
        let mut table = sample();
        let labels =
            extract_labels(r#"[{"description":"Somebody Else","category":"Food"}]"#).unwrap();
        assert_eq!(merge_labels(&mut table, &labels), 0);
        assert_eq!(table, sample());
    }

    #[test]
    fn test_client_failure_leaves_table_untouched() {
        let mut table = sample();
        let client = FakeClient::failing("connection refused");
        assert_eq!(categorize_with_llm(&mut table, &client), LlmOutcome::Failed);
        assert_eq!(table, sample());
    }

    #[test]
    fn test_non_json_reply_leaves_table_untouched() {
        let mut table = sample();
        let client = FakeClient::ok("Sorry, I can't help with that.");
        assert_eq!(categorize_with_llm(&mut table, &client), LlmOutcome::Failed);
        assert_eq!(table.len(), 4);
        assert_eq!(table, sample());
    }

    #[test]
    fn test_extract_from_code_fence() {
        let reply = "Here you go:\n```json\n[{\"description\":\"A\",\"category\":\"Food\"}]\n```\n";
        let labels = extract_labels(reply).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let reply = "Result: [{\"description\":\"A\",\"category\":\"Bills\"}] Thanks!";
        let labels = extract_labels(reply).unwrap();
        assert_eq!(labels[0].description.as_deref(), Some("A"));
    }

    #[test]
    fn test_malformed_item_does_not_sink_the_reply() {
        let mut table = sample();
        let client = FakeClient::ok(
            r#"[{"description":"Zeta Traders","category":"Shopping"},{"description":42,"category":"Food"}]"#,
        );
        let outcome = categorize_with_llm(&mut table, &client);
        assert_eq!(outcome, LlmOutcome::Applied { requested: 3, updated: 1 });
        assert_eq!(table.rows[2].category, Category::Shopping);
        assert!(table.rows[1].category.is_other());
    }

    #[test]
    fn test_extract_keeps_good_items_in_fence() {
        let reply = "```json\n[{\"description\":\"A\",\"category\":\"Food\"},{\"category\":[1]}]\n```";
        let labels = extract_labels(reply).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].description.as_deref(), Some("A"));
    }

    #[test]
    fn test_extract_rejects_object() {
        assert!(extract_labels(r#"{"description":"A"}"#).is_err());
    }
}
