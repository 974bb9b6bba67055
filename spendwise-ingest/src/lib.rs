//! spendwise-ingest: reads transaction CSV exports into the core table type.

pub mod loader;

pub use loader::{load_transactions, read_transactions};
