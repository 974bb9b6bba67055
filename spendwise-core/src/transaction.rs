//! Transaction rows and the ordered table the pipeline stages pass along

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// One row of spending data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Free-text description as it appeared in the statement
    pub description: String,
    pub amount: f64,
    /// Rule-based guess, possibly overwritten by the LLM step
    pub category: Category,
    /// Only set when the LLM step explained its choice
    pub rationale: Option<String>,
    /// Values of the input columns we don't interpret, indexed by
    /// `Field::Extra`
    pub extra: Vec<String>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
            category: Category::Other,
            rationale: None,
            extra: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }
}

/// What a column of the input holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Field {
    Description,
    Amount,
    /// Pass-through value at this index of `Transaction::extra`
    Extra(usize),
}

/// One input column, under the header it was read with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub field: Field,
}

impl Column {
    pub fn new(header: impl Into<String>, field: Field) -> Self {
        Self {
            header: header.into(),
            field,
        }
    }
}

/// In-memory ordered collection of transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionTable {
    /// Input column layout, minus the recomputed `category`/`rationale`
    pub columns: Vec<Column>,
    pub rows: Vec<Transaction>,
}

impl Default for TransactionTable {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl TransactionTable {
    pub fn new(columns: Vec<Column>, rows: Vec<Transaction>) -> Self {
        Self { columns, rows }
    }

    /// Table with the plain `description,amount` layout.
    pub fn from_rows(rows: Vec<Transaction>) -> Self {
        Self::new(
            vec![
                Column::new("description", Field::Description),
                Column::new("amount", Field::Amount),
            ],
            rows,
        )
    }

    /// Headers of the pass-through columns, in input order.
    pub fn extra_headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.field, Field::Extra(_)))
            .map(|c| c.header.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|t| t.amount).sum()
    }

    /// Rows still labeled `Other`.
    pub fn unresolved(&self) -> impl Iterator<Item = &Transaction> {
        self.rows.iter().filter(|t| t.category.is_other())
    }

    pub fn has_rationale(&self) -> bool {
        self.rows.iter().any(|t| t.rationale.is_some())
    }
}
