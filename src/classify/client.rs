use super::types::{Generation, InferenceParameters, InferenceRequest};
use super::{CATEGORIES, Classification, ClassifyOperations};
use crate::config::ClassifierConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{instrument, warn};

pub struct HfClassifier {
    client: Client,
    api_token: String,
    api_url: String,
}

impl HfClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            client: Client::new(),
            api_token: config.api_token.clone(),
            api_url: config.api_url(),
        }
    }

    async fn request_classification(
        &self,
        description: &str,
        amount: Decimal,
    ) -> Result<Classification> {
        let payload = InferenceRequest {
            inputs: build_prompt(description, amount),
            parameters: InferenceParameters {
                max_new_tokens: 32,
                temperature: 0.2,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Classifier(format!(
                "Inference request failed: {} - {}",
                status, body
            )));
        }

        let generations: Vec<Generation> = response.json().await?;
        let completion = generations
            .first()
            .map(|g| g.generated_text.as_str())
            .unwrap_or_default();

        parse_completion(completion).ok_or_else(|| {
            AppError::Classifier(format!("Unparseable completion: {}", completion))
        })
    }
}

#[async_trait]
impl ClassifyOperations for HfClassifier {
    #[instrument(name = "Classifying transaction", skip_all)]
    async fn classify(&self, description: &str, amount: Decimal) -> Classification {
        match self.request_classification(description, amount).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(error = %e, description, "Classification failed, using fallback");
                Classification::fallback()
            }
        }
    }
}

fn build_prompt(description: &str, amount: Decimal) -> String {
    format!(
        "Classify the following bank transaction into one of the categories below. \
         Use both the description and amount to make your decision. \
         Note: Positive amounts are credits (e.g. income, reimbursements), \
         negative amounts are debits (e.g. purchases, bills).\n\n\
         Categories: {}\n\n\
         Respond ONLY in this format:\n\
         Category: <category>, Confidence: <0-1>\n\n\
         Examples:\n\
         STOP & SHOP 06, Amount: -35.23 -> Category: Groceries, Confidence: 0.95\n\
         WALMART SUPERCENTER, Amount: -52.87 -> Category: Groceries, Confidence: 0.95\n\
         PAYPAL *LYFT TEMP AUTH, Amount: -12.84 -> Category: Transport, Confidence: 0.90\n\
         VENMO FROM JOHN, Amount: +18.00 -> Category: Reimbursement, Confidence: 0.90\n\
         PAYCHECK ACME CORP, Amount: +2000.00 -> Category: Salary, Confidence: 0.98\n\
         NETFLIX.COM BILLING, Amount: -15.99 -> Category: Entertainment, Confidence: 0.95\n\
         E-ZPASS REPLENISHMENT, Amount: -50.00 -> Category: Bills, Confidence: 0.88\n\n\
         Transaction: \"{}\", Amount: {:.2}\n\
         Response:",
        CATEGORIES.join(", "),
        description,
        amount
    )
}

/// Extract the last `Category: <word>, Confidence: <number>` pair from a
/// model completion. The prompt echoes its own examples back in some
/// completions, so only the final pair counts.
fn parse_completion(text: &str) -> Option<Classification> {
    let mut last = None;

    for (idx, _) in text.match_indices("Category:") {
        let rest = text[idx + "Category:".len()..].trim_start();
        let Some((category, after)) = rest.split_once(',') else {
            continue;
        };
        let category = category.trim();
        if category.is_empty() || !category.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        let Some(confidence) = after.trim_start().strip_prefix("Confidence:") else {
            continue;
        };
        let confidence: String = confidence
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let Ok(confidence) = confidence.parse::<f64>() else {
            continue;
        };

        last = Some(Classification {
            category: category.to_string(),
            confidence,
        });
    }

    last
}
