use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Classifier API error: {0}")]
    Classifier(String),

    #[error("Statement ingestion error: {0}")]
    Ingest(String),

    #[error("Expense ledger error: {0}")]
    Ledger(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
