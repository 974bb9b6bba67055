//! Write the categorized table back out as CSV.

use anyhow::{Context, Result};
use spendwise_core::{Field, Transaction, TransactionTable};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where `spendwise run` writes unless told otherwise.
pub const DEFAULT_EXPORT_PATH: &str = "data/categorized_transactions.csv";

/// Export the table. Columns keep the input layout, then `category` is
/// appended, plus `rationale` when any row has one.
///
/// Returns `Ok(None)` without touching the filesystem when the table is empty.
pub fn export_categorized_csv(
    table: &TransactionTable,
    path: impl AsRef<Path>,
) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    if table.is_empty() {
        warn!("No data to export");
        return Ok(None);
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("opening {} for writing", path.display()))?;

    let with_rationale = table.has_rationale();
    let mut header: Vec<&str> = table.columns.iter().map(|c| c.header.as_str()).collect();
    header.push("category");
    if with_rationale {
        header.push("rationale");
    }
    wtr.write_record(&header)?;

    for txn in &table.rows {
        let mut record: Vec<String> = table
            .columns
            .iter()
            .map(|c| cell(txn, c.field))
            .collect();
        record.push(txn.category.to_string());
        if with_rationale {
            record.push(txn.rationale.clone().unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;

    info!("Exported categorized data to: {}", path.display());
    Ok(Some(path.to_path_buf()))
}

fn cell(txn: &Transaction, field: Field) -> String {
    match field {
        Field::Description => txn.description.clone(),
        Field::Amount => txn.amount.to_string(),
        Field::Extra(i) => txn.extra.get(i).cloned().unwrap_or_default(),
    }
}
