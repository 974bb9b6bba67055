//! spendwise-finance: keyword category rules, LLM refinement and CSV export

pub mod category_rules;
pub mod exporter;
pub mod llm;
pub mod llm_categorizer;

pub use category_rules::{categorize, categorize_all};
pub use exporter::{export_categorized_csv, DEFAULT_EXPORT_PATH};
pub use llm::{ChatClient, ChatMessage, LlmSettings, OpenAiClient};
pub use llm_categorizer::{categorize_with_llm, LlmOutcome};
