//! Outcome → table conversion.
//!
//! Only one level of nesting is expanded: `{"name": {"full": "A B"}}` becomes
//! the column `name_full`, while anything nested deeper stays a single cell
//! rendered as compact JSON. This keeps the column count bounded by the
//! width of the response's first two levels.

use crate::domain::model::{EnrichmentOutcome, FlattenedRow, OutputTable};
use crate::utils::error::{EnrichError, Result};
use serde_json::Value;
use std::collections::HashSet;

pub const STATUS_COLUMN: &str = "status";
pub const SUCCESS_STATUS: &str = "Success";

pub fn flatten_outcome(outcome: &EnrichmentOutcome) -> FlattenedRow {
    let mut row = FlattenedRow::new();
    for (key, value) in outcome.envelope() {
        row.set(key, value);
    }

    match outcome {
        EnrichmentOutcome::Success { payload, .. } => {
            for (key, value) in payload {
                match value {
                    Value::Object(children) => {
                        for (child_key, child_value) in children {
                            row.set(format!("{}_{}", key, child_key), child_value.clone());
                        }
                    }
                    other => row.set(key.clone(), other.clone()),
                }
            }
            row.set(STATUS_COLUMN, Value::String(SUCCESS_STATUS.to_string()));
        }
        EnrichmentOutcome::Failure { reason, .. } => {
            row.set(STATUS_COLUMN, Value::String(format!("Failed: {}", reason)));
        }
    }

    row
}

/// 每個結果對應一列；欄位集合是所有列欄位的聯集 (依第一次出現的順序)
pub fn flatten(outcomes: &[EnrichmentOutcome]) -> OutputTable {
    let rows: Vec<FlattenedRow> = outcomes.iter().map(flatten_outcome).collect();

    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in &rows {
        for column in row.columns() {
            if seen.insert(column.to_string()) {
                columns.push(column.to_string());
            }
        }
    }

    OutputTable { columns, rows }
}

pub fn to_csv(table: &OutputTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    // 沒有任何列時輸出空檔
    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
    }
    for row in &table.rows {
        writer.write_record(table.columns.iter().map(|column| row.cell(column)))?;
    }

    writer
        .into_inner()
        .map_err(|e| EnrichError::IoError(e.into_error()))
}
