//! Fresh Cart CLI - database migrations and operator checks.
//!
//! # Usage
//!
//! ```bash
//! # Run order database migrations
//! fc-cli migrate
//!
//! # Validate the service-credential bundle the API will load
//! fc-cli credentials check
//! fc-cli credentials check --file ./service-account.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `credentials check` - Load and validate the identity provider credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(author, version, about = "Fresh Cart operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect identity provider credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Subcommand)]
enum CredentialsAction {
    /// Load and validate the service-credential bundle
    Check {
        /// Bundle path (defaults to `FIREBASE_SERVICE_ACCOUNT_FILE`)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Credentials { action } => match action {
            CredentialsAction::Check { file } => {
                commands::credentials::check(file)?;
            }
        },
    }
    Ok(())
}
