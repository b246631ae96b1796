mod run;
mod show;

use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "group-expense-tracker")]
#[command(about = "Categorize bank statement transactions and reconcile group expense reimbursements", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run { file } => run::execute(file).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a statement CSV and match reimbursements to group expenses
    Run {
        /// Path to the statement CSV file
        #[arg(long)]
        file: PathBuf,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
