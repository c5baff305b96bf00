use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use admission_cli::commands;
use admission_cli::config::Config;
use admission_db::{connect, FormRepository};

#[derive(Parser)]
#[command(name = "admission")]
#[command(about = "Operator tools for the admission backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the database schema from embedded assets
    Rebuild(commands::rebuild::RebuildArgs),

    /// Print a stored application or enrollment
    Show(commands::show::ShowArgs),

    /// List contact form messages
    Contacts(commands::contacts::ContactsArgs),

    /// Check a JSON draft against the step rules, offline
    Validate(commands::validate::ValidateArgs),

    /// Resume a user's wizard against the API and save the remaining steps
    Resume(commands::resume::ResumeArgs),

    /// Compute a checkout signature for an order and payment
    Sign(commands::sign::SignArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rebuild(args) => {
            let pool = connect(config.database_url()?, 2).await?;
            commands::rebuild::execute(pool, args).await?;
        }
        Commands::Show(args) => {
            let pool = connect(config.database_url()?, 2).await?;
            commands::show::execute(FormRepository::new(pool), args).await?;
        }
        Commands::Contacts(args) => {
            let pool = connect(config.database_url()?, 2).await?;
            commands::contacts::execute(FormRepository::new(pool), args).await?;
        }
        Commands::Validate(args) => {
            // Pure logic; no database.
            commands::validate::run(args)?;
        }
        Commands::Resume(args) => {
            commands::resume::execute(&config, args).await?;
        }
        Commands::Sign(args) => {
            commands::sign::run(&config, args)?;
        }
    }

    Ok(())
}
