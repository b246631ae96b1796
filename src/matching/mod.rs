mod engine;
mod ledger;

pub use engine::{AmbiguousCase, MatchOutcome, MatchRecord, match_reimbursements};
pub use ledger::{ExpenseEntry, ExpenseLedger};
