pub mod transaction;

pub use transaction::{StatementRow, Transaction};
