use super::ledger::{ExpenseEntry, ExpenseLedger};
use crate::error::Result;
use crate::models::Transaction;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A reimbursement applied in full against a single group expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    pub reimbursement_id: String,
    pub description: String,
    pub amount: Decimal,
    pub reimbursement_date: DateTime<Utc>,
    pub expense_id: String,
    pub expense_date: DateTime<Utc>,
    pub expense_description: String,
    pub original_amount: Decimal,
    pub applied_amount: Decimal,
    /// The expense's balance after this application.
    pub remaining_amount: Decimal,
}

/// A reimbursement the engine refuses to resolve on its own: either no
/// expense qualified or more than one did. Carries the candidate expense
/// descriptions for manual review (empty when none qualified).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbiguousCase {
    pub transaction: Transaction,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchOutcome {
    pub matches: Vec<MatchRecord>,
    pub ambiguous: Vec<AmbiguousCase>,
}

/// Reconcile reimbursement credits against the group-expense debits they
/// repay.
///
/// Reimbursements are processed in ascending timestamp order (stable, so
/// equal timestamps keep input order), each one querying the ledger as
/// left by all earlier commits: earlier reimbursements get first claim on
/// an expense's remaining balance. A reimbursement is committed only when
/// exactly one expense qualifies; anything else is surfaced untouched for
/// manual review rather than resolved by heuristic.
#[instrument(name = "Matching reimbursements", skip_all, fields(window_hours))]
pub fn match_reimbursements(
    transactions: &[Transaction],
    window_hours: i64,
) -> Result<MatchOutcome> {
    let window = Duration::hours(window_hours);
    let mut ledger = ExpenseLedger::from_transactions(transactions);

    let mut reimbursements: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_reimbursement && t.amount > Decimal::ZERO)
        .collect();
    reimbursements.sort_by_key(|t| t.timestamp);

    let mut outcome = MatchOutcome::default();

    for r in reimbursements {
        let candidates: Vec<ExpenseEntry> = ledger
            .candidates(r.timestamp, r.amount, window)
            .into_iter()
            .cloned()
            .collect();

        if let [expense] = candidates.as_slice() {
            let remaining_amount = ledger.apply(&expense.id, r.amount)?;
            outcome.matches.push(MatchRecord {
                reimbursement_id: r.id.clone(),
                description: r.description.clone(),
                amount: r.amount,
                reimbursement_date: r.timestamp,
                expense_id: expense.id.clone(),
                expense_date: expense.timestamp,
                expense_description: expense.description.clone(),
                original_amount: expense.original_amount,
                applied_amount: r.amount,
                remaining_amount,
            });
        } else {
            outcome.ambiguous.push(AmbiguousCase {
                transaction: r.clone(),
                candidates: candidates.into_iter().map(|e| e.description).collect(),
            });
        }
    }

    let outstanding: Decimal = ledger.entries().map(|e| e.remaining()).sum();
    debug!(%outstanding, "Unrepaid group expense balance after pass");

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::test_helpers::{
        mock_datetime, mock_group_expense, mock_reimbursement, mock_transaction,
    };
    use rust_decimal::prelude::dec;

    const TEST_WINDOW_HOURS: i64 = 48;

    #[test]
    fn test_match_partial_then_full_consumption() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-90.00), base),
            mock_reimbursement("r1", dec!(30.00), base + Duration::hours(23)),
            mock_reimbursement("r2", dec!(60.00), base + Duration::hours(46)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert!(outcome.ambiguous.is_empty());
        assert_eq!(outcome.matches.len(), 2);

        let first = &outcome.matches[0];
        assert_eq!(first.reimbursement_id, "r1");
        assert_eq!(first.expense_id, "e1");
        assert_eq!(first.original_amount, dec!(90.00));
        assert_eq!(first.applied_amount, dec!(30.00));
        assert_eq!(first.remaining_amount, dec!(60.00));

        let second = &outcome.matches[1];
        assert_eq!(second.reimbursement_id, "r2");
        assert_eq!(second.expense_id, "e1");
        assert_eq!(second.applied_amount, dec!(60.00));
        assert_eq!(second.remaining_amount, dec!(0.00));
    }

    #[test]
    fn test_multiple_candidates_are_ambiguous() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-50.00), base),
            mock_group_expense("e2", dec!(-50.00), base + Duration::hours(1)),
            mock_reimbursement("r1", dec!(20.00), base + Duration::hours(2)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.ambiguous.len(), 1);
        let case = &outcome.ambiguous[0];
        assert_eq!(case.transaction.id, "r1");
        assert_eq!(
            case.candidates,
            vec![
                "mock transaction: e1".to_string(),
                "mock transaction: e2".to_string(),
            ]
        );
    }

    #[test]
    fn test_ambiguity_leaves_ledger_untouched() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-50.00), base),
            mock_group_expense("e2", dec!(-50.00), base + Duration::hours(1)),
            // Contested between e1 and e2: must not consume either
            mock_reimbursement("r1", dec!(20.00), base + Duration::hours(2)),
            // Past e1's window, still inside e2's; e2's full balance must be intact
            mock_reimbursement("r2", dec!(50.00), base + Duration::hours(49)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].reimbursement_id, "r2");
        assert_eq!(outcome.matches[0].expense_id, "e2");
        assert_eq!(outcome.matches[0].remaining_amount, dec!(0.00));
    }

    #[test]
    fn test_no_candidate_outside_window() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-20.00), base),
            mock_reimbursement("r1", dec!(20.00), base + Duration::hours(49)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.ambiguous.len(), 1);
        assert!(outcome.ambiguous[0].candidates.is_empty());
    }

    #[test]
    fn test_window_boundary_exactly_48_hours() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-20.00), base),
            mock_reimbursement("r1", dec!(20.00), base + Duration::hours(48)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();
        assert_eq!(outcome.matches.len(), 1);

        let transactions = vec![
            mock_group_expense("e1", dec!(-20.00), base),
            mock_reimbursement(
                "r1",
                dec!(20.00),
                base + Duration::hours(48) + Duration::seconds(1),
            ),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.ambiguous.len(), 1);
    }

    #[test]
    fn test_exhausted_expense_is_not_a_candidate() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-10.00), base),
            mock_reimbursement("r1", dec!(10.00), base + Duration::minutes(30)),
            // e1 is fully consumed by r1; remaining 0 < 5.00
            mock_reimbursement("r2", dec!(5.00), base + Duration::hours(1)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].reimbursement_id, "r1");
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].transaction.id, "r2");
        assert!(outcome.ambiguous[0].candidates.is_empty());
    }

    #[test]
    fn test_earlier_reimbursement_wins_contested_balance() {
        let base = mock_datetime(2024, 1, 1);
        // Both reimbursements fit e1's balance individually, not together.
        // Input lists the later one first; chronological order must decide.
        let transactions = vec![
            mock_group_expense("e1", dec!(-60.00), base),
            mock_reimbursement("r_late", dec!(50.00), base + Duration::hours(5)),
            mock_reimbursement("r_early", dec!(40.00), base + Duration::hours(2)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].reimbursement_id, "r_early");
        assert_eq!(outcome.matches[0].remaining_amount, dec!(20.00));
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].transaction.id, "r_late");
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let base = mock_datetime(2024, 1, 1);
        let when = base + Duration::hours(1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-30.00), base),
            mock_reimbursement("r_first", dec!(30.00), when),
            mock_reimbursement("r_second", dec!(30.00), when),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].reimbursement_id, "r_first");
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].transaction.id, "r_second");
    }

    #[test]
    fn test_every_reimbursement_lands_in_exactly_one_bucket() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-90.00), base),
            mock_group_expense("e2", dec!(-25.00), base + Duration::hours(3)),
            mock_reimbursement("r1", dec!(30.00), base + Duration::hours(1)),
            mock_reimbursement("r2", dec!(25.00), base + Duration::hours(4)),
            mock_reimbursement("r3", dec!(100.00), base + Duration::hours(5)),
            mock_reimbursement("r4", dec!(10.00), base + Duration::hours(60)),
            mock_transaction("salary", dec!(2000.00), base + Duration::hours(6)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        let reimbursement_count = transactions
            .iter()
            .filter(|t| t.is_reimbursement && t.amount > dec!(0))
            .count();
        assert_eq!(
            outcome.matches.len() + outcome.ambiguous.len(),
            reimbursement_count
        );

        let mut seen: Vec<&str> = outcome
            .matches
            .iter()
            .map(|m| m.reimbursement_id.as_str())
            .chain(outcome.ambiguous.iter().map(|a| a.transaction.id.as_str()))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), reimbursement_count);
    }

    #[test]
    fn test_conservation_of_applied_amounts() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-90.00), base),
            mock_reimbursement("r1", dec!(30.00), base + Duration::hours(1)),
            mock_reimbursement("r2", dec!(40.00), base + Duration::hours(2)),
            mock_reimbursement("r3", dec!(20.00), base + Duration::hours(3)),
        ];

        let outcome = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();

        let applied: Decimal = outcome
            .matches
            .iter()
            .filter(|m| m.expense_id == "e1")
            .map(|m| m.applied_amount)
            .sum();
        assert!(applied <= dec!(90.00));
        assert_eq!(
            outcome.matches.last().unwrap().remaining_amount,
            dec!(90.00) - applied
        );
        // Each application equals its reimbursement amount exactly
        for m in &outcome.matches {
            assert_eq!(m.applied_amount, m.amount);
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let base = mock_datetime(2024, 1, 1);
        let transactions = vec![
            mock_group_expense("e1", dec!(-90.00), base),
            mock_group_expense("e2", dec!(-50.00), base + Duration::hours(1)),
            mock_reimbursement("r1", dec!(30.00), base + Duration::hours(2)),
            mock_reimbursement("r2", dec!(50.00), base + Duration::hours(40)),
        ];

        let first = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();
        let second = match_reimbursements(&transactions, TEST_WINDOW_HOURS).unwrap();
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn test_empty_input_yields_empty_outcome() {
        let outcome = match_reimbursements(&[], TEST_WINDOW_HOURS).unwrap();
        assert!(outcome.matches.is_empty());
        assert!(outcome.ambiguous.is_empty());
    }
}
