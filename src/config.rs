use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "group-expense-tracker";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub tagging: TaggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClassifierConfig {
    pub api_token: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "meta-llama/Llama-3.1-8B-Instruct".to_string()
}

impl ClassifierConfig {
    pub fn api_url(&self) -> String {
        format!(
            "https://api-inference.huggingface.co/models/{}",
            self.model
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Maximum hours between a group expense and a reimbursement for them
    /// to be eligible to match.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

fn default_window_hours() -> i64 {
    48
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaggingConfig {
    /// Case-insensitive description keywords marking group expenses.
    #[serde(default = "default_group_keywords")]
    pub group_keywords: Vec<String>,
}

fn default_group_keywords() -> Vec<String> {
    vec![
        "split".to_string(),
        "shared".to_string(),
        "group".to_string(),
    ]
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            group_keywords: default_group_keywords(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        if config.classifier.api_token.is_empty() {
            return Err(AppError::Config(
                "Classifier api_token must be set in config file".to_string(),
            ));
        }

        if config.matching.window_hours <= 0 {
            return Err(AppError::Config(
                "matching.window_hours must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }
}
