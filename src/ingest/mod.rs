use crate::error::{AppError, Result};
use crate::models::StatementRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Parse a raw statement CSV into typed rows.
///
/// The first three columns are read as date, description, amount. Rows
/// whose date or amount do not parse are dropped, which also absorbs
/// bank-statement preambles and header lines. Only I/O or CSV-level
/// failures are errors; an empty statement is a valid (empty) result.
#[instrument(name = "Parsing statement", skip_all)]
pub fn parse_statement<R: Read>(reader: R) -> Result<Vec<StatementRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (idx, record) in csv_reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::Ingest(format!("Failed to read row {}: {}", idx + 1, e)))?;

        match parse_row(&record) {
            Some(row) => rows.push(row),
            None => {
                dropped += 1;
                debug!(row = idx + 1, "Dropped row without a parseable date and amount");
            }
        }
    }

    debug!(rows = rows.len(), dropped, "Statement parsed");

    Ok(rows)
}

fn parse_row(record: &csv::StringRecord) -> Option<StatementRow> {
    let timestamp = parse_date(record.get(0)?.trim())?;
    let description = record.get(1)?.trim().to_string();
    let amount = parse_amount(record.get(2)?.trim())?;

    Some(StatementRow {
        timestamp,
        description,
        amount,
    })
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }

    // Date-only rows land at midnight UTC
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

fn parse_amount(value: &str) -> Option<Decimal> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}
