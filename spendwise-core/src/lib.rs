//! spendwise-core: transaction table, categories and spending summaries

pub mod category;
pub mod summary;
pub mod transaction;

pub use category::Category;
pub use summary::{summarize, CategorySummary, SpendingSummary};
pub use transaction::{Column, Field, Transaction, TransactionTable};
