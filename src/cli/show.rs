use crate::classify::CATEGORIES;
use crate::config::Config;
use crate::error::Result;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration file path
    Paths,
    /// Show the classifier's category set
    Categories,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Categories => show_categories(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;

    info!(path = ?config_path, "Config path");

    Ok(())
}

fn show_categories() -> Result<()> {
    for category in CATEGORIES {
        println!("{}", category);
    }

    Ok(())
}
