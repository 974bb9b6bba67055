//! Load a transaction CSV into a `TransactionTable`.
//!
//! Only `description` and `amount` are required (case-insensitive headers).
//! Any `category`/`rationale` columns in the input are dropped since the
//! pipeline recomputes them; every other column is carried through untouched.

use anyhow::{bail, Context, Result};
use spendwise_core::{Column, Field, Transaction, TransactionTable};
use std::path::Path;
use tracing::{debug, error, info};

const DESCRIPTION: &str = "description";
const AMOUNT: &str = "amount";
const RECOMPUTED: [&str; 2] = ["category", "rationale"];

/// Load transactions, logging and returning an empty table on any failure.
pub fn load_transactions(path: impl AsRef<Path>) -> TransactionTable {
    let path = path.as_ref();
    match read_transactions(path) {
        Ok(table) => {
            info!("Loaded {} transactions from {}", table.len(), path.display());
            table
        }
        Err(e) => {
            error!("Error loading data: {e:#}");
            TransactionTable::default()
        }
    }
}

/// Read a transaction CSV, failing on a missing file, missing required
/// columns, malformed rows or non-numeric amounts.
pub fn read_transactions(path: impl AsRef<Path>) -> Result<TransactionTable> {
    let path = path.as_ref();
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_from(rdr).with_context(|| format!("reading {}", path.display()))
}

fn read_from<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<TransactionTable> {
    let headers = rdr.headers().context("reading header row")?.clone();

    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let Some(desc_idx) = find(DESCRIPTION) else {
        bail!("missing required column '{DESCRIPTION}'");
    };
    let Some(amount_idx) = find(AMOUNT) else {
        bail!("missing required column '{AMOUNT}'");
    };

    // Input order is kept so the export matches the file it came from.
    let mut columns = Vec::new();
    let mut extra_idx = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        let field = if i == desc_idx {
            Field::Description
        } else if i == amount_idx {
            Field::Amount
        } else if RECOMPUTED.iter().any(|r| h.eq_ignore_ascii_case(r)) {
            continue;
        } else {
            extra_idx.push(i);
            Field::Extra(extra_idx.len() - 1)
        };
        columns.push(Column::new(h, field));
    }
    debug!("column layout: {columns:?}");

    let mut rows = Vec::new();
    for (n, result) in rdr.records().enumerate() {
        let line = n + 1;
        let record = result.with_context(|| format!("malformed row {line}"))?;

        let description = record.get(desc_idx).unwrap_or("").to_string();
        let raw_amount = record.get(amount_idx).unwrap_or("");
        let amount = parse_amount(raw_amount)
            .with_context(|| format!("row {line}: bad amount '{raw_amount}'"))?;
        let extra = extra_idx
            .iter()
            .map(|&i| record.get(i).unwrap_or("").to_string())
            .collect();

        rows.push(Transaction::new(description, amount).with_extra(extra));
    }

    Ok(TransactionTable::new(columns, rows))
}

/// Parse an amount, tolerating thousands separators. `NaN` and infinities
/// are rejected.
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        bail!("empty amount");
    }
    let v = cleaned.parse::<f64>()?;
    if !v.is_finite() {
        bail!("amount is not a finite number");
    }
    Ok(v)
}
