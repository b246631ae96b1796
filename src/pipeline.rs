use crate::classify::{Classification, ClassifyOperations, REIMBURSEMENT_CATEGORY};
use crate::config::{MatchingConfig, TaggingConfig};
use crate::error::Result;
use crate::matching::{self, AmbiguousCase, MatchRecord};
use crate::models::{StatementRow, Transaction};
use indicatif::ProgressStyle;
use serde::{Deserialize, Serialize};
use tracing::{Span, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutput {
    pub categorized: Vec<Transaction>,
    pub matches: Vec<MatchRecord>,
    pub ambiguous: Vec<AmbiguousCase>,
}

/// Drives one processing pass over a parsed statement: classify every
/// row, derive the group and reimbursement flags, then reconcile
/// reimbursements against group expenses.
pub struct RunEngine<C> {
    matching: MatchingConfig,
    tagging: TaggingConfig,
    classifier: C,
}

impl<C> RunEngine<C>
where
    C: ClassifyOperations + Sync,
{
    pub fn new(matching: MatchingConfig, tagging: TaggingConfig, classifier: C) -> Self {
        Self {
            matching,
            tagging,
            classifier,
        }
    }

    #[instrument(name = "Processing statement", skip_all)]
    pub async fn run(&self, rows: Vec<StatementRow>) -> Result<RunOutput> {
        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| crate::error::AppError::Other(e.into()))?,
        );
        span.pb_set_message("Classifying transactions");
        span.pb_set_length(rows.len() as u64);

        let mut categorized = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            categorized.push(self.classify_row(idx.to_string(), row).await);
            span.pb_inc(1);
        }

        let outcome = matching::match_reimbursements(&categorized, self.matching.window_hours)?;

        info!(
            transactions = categorized.len(),
            matches = outcome.matches.len(),
            ambiguous = outcome.ambiguous.len(),
            "Statement processed"
        );

        Ok(RunOutput {
            categorized,
            matches: outcome.matches,
            ambiguous: outcome.ambiguous,
        })
    }

    async fn classify_row(&self, id: String, row: StatementRow) -> Transaction {
        let Classification {
            category,
            confidence,
        } = self.classifier.classify(&row.description, row.amount).await;

        let mut transaction = Transaction::from_row(id, row);
        transaction.is_reimbursement = category.eq_ignore_ascii_case(REIMBURSEMENT_CATEGORY);
        transaction.is_group = self.is_group(&transaction.description);
        transaction.category = category;
        transaction.confidence = confidence;
        transaction
    }

    fn is_group(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        self.tagging
            .group_keywords
            .iter()
            .any(|keyword| description.contains(&keyword.to_lowercase()))
    }
}
