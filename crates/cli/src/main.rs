//! Stall Market CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sm-cli migrate
//!
//! # Seed a sample vendor, buyer, stall and items
//! sm-cli seed
//! sm-cli seed --password "a-better-password"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed database with sample data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sm-cli")]
#[command(author, version, about = "Stall Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with a sample vendor, buyer, stall and items
    Seed {
        /// Password for both sample accounts
        #[arg(short, long, default_value = "password123")]
        password: String,
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
        Commands::Seed { password } => commands::seed::run(&password).await?,
    }
    Ok(())
}
