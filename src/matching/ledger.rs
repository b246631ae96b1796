use crate::error::{AppError, Result};
use crate::models::Transaction;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// One group expense with its outstanding balance.
///
/// `remaining` starts at the expense's absolute amount and only ever
/// decreases, through [`ExpenseLedger::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub original_amount: Decimal,
    remaining: Decimal,
}

impl ExpenseEntry {
    pub fn remaining(&self) -> Decimal {
        self.remaining
    }
}

/// Tracks how much of each group expense is still owed during one
/// matching pass.
///
/// Entries live in an arena sorted chronologically (input order breaks
/// ties) with a stable id index, so commits from earlier reimbursements
/// are visible to every later candidate query in the same pass.
#[derive(Debug)]
pub struct ExpenseLedger {
    entries: Vec<ExpenseEntry>,
    index: HashMap<String, usize>,
}

impl ExpenseLedger {
    /// Build a ledger from every transaction flagged as a group expense
    /// with a debit amount.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut entries: Vec<ExpenseEntry> = transactions
            .iter()
            .filter(|t| t.is_group && t.amount < Decimal::ZERO)
            .map(|t| ExpenseEntry {
                id: t.id.clone(),
                timestamp: t.timestamp,
                description: t.description.clone(),
                original_amount: -t.amount,
                remaining: -t.amount,
            })
            .collect();

        entries.sort_by_key(|e| e.timestamp);

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        Self { entries, index }
    }

    /// Expenses eligible to absorb a reimbursement of `amount` at
    /// `timestamp`: the expense occurred no later than the reimbursement,
    /// no more than `window` before it (inclusive at the boundary), and
    /// still has at least `amount` outstanding.
    ///
    /// Pure query; returned in the ledger's chronological order.
    pub fn candidates(
        &self,
        timestamp: DateTime<Utc>,
        amount: Decimal,
        window: Duration,
    ) -> Vec<&ExpenseEntry> {
        self.entries
            .iter()
            .filter(|e| {
                let elapsed = timestamp.signed_duration_since(e.timestamp);
                elapsed >= Duration::zero() && elapsed <= window && e.remaining >= amount
            })
            .collect()
    }

    /// Commit a repayment against an expense, returning the balance left
    /// afterwards.
    ///
    /// Preconditions: `amount` is positive, the id is known, and the
    /// expense has at least `amount` remaining. These always hold for
    /// commits driven by the candidate query; a violation means a caller
    /// bug and fails the whole pass.
    pub fn apply(&mut self, expense_id: &str, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Ledger(format!(
                "cannot apply non-positive amount {} to expense {}",
                amount, expense_id
            )));
        }

        let idx = *self.index.get(expense_id).ok_or_else(|| {
            AppError::Ledger(format!("unknown expense id: {}", expense_id))
        })?;

        let entry = &mut self.entries[idx];
        if amount > entry.remaining {
            return Err(AppError::Ledger(format!(
                "applying {} would overdraw expense {} (remaining {})",
                amount, expense_id, entry.remaining
            )));
        }

        entry.remaining -= amount;
        Ok(entry.remaining)
    }

    /// All entries in chronological order.
    pub fn entries(&self) -> impl Iterator<Item = &ExpenseEntry> {
        self.entries.iter()
    }
}
