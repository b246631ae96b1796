use crate::classify::HfClassifier;
use crate::config::Config;
use crate::error::Result;
use crate::ingest;
use crate::pipeline::RunEngine;
use std::fs::File;
use std::path::Path;
use tracing::info;

pub async fn execute(file: &Path) -> Result<()> {
    let config = Config::load()?;

    let rows = ingest::parse_statement(File::open(file)?)?;
    info!(rows = rows.len(), "Statement loaded");

    let classifier = HfClassifier::new(&config.classifier);
    let engine = RunEngine::new(config.matching, config.tagging, classifier);
    let output = engine.run(rows).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
