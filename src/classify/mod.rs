mod client;
mod types;

pub use client::HfClassifier;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The category set the classifier chooses from.
pub const CATEGORIES: [&str; 9] = [
    "Groceries",
    "Dining",
    "Transport",
    "Reimbursement",
    "Salary",
    "Entertainment",
    "Shopping",
    "Bills",
    "Other",
];

pub const REIMBURSEMENT_CATEGORY: &str = "Reimbursement";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub category: String,
    pub confidence: f64,
}

impl Classification {
    /// Safe default when no usable answer can be produced.
    pub fn fallback() -> Self {
        Classification {
            category: "Other".to_string(),
            confidence: 0.5,
        }
    }
}

#[async_trait]
pub trait ClassifyOperations {
    /// Classify one transaction by description and signed amount.
    ///
    /// Never fails: any error (network, bad status, unparseable
    /// completion) collapses to [`Classification::fallback`].
    async fn classify(&self, description: &str, amount: Decimal) -> Classification;
}
