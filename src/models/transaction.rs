use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One statement line as parsed from the raw CSV, before classification
/// or tagging has run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementRow {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub amount: Decimal,
}

/// One statement line after classification and tagging.
///
/// Amounts are signed: negative is a debit (money out), positive is a
/// credit (money in). The matching engine relies on this convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub confidence: f64,
    pub is_group: bool,
    pub is_reimbursement: bool,
}

impl Transaction {
    pub fn from_row(id: String, row: StatementRow) -> Self {
        Transaction {
            id,
            timestamp: row.timestamp,
            description: row.description,
            amount: row.amount,
            category: String::new(),
            confidence: 0.0,
            is_group: false,
            is_reimbursement: false,
        }
    }
}
