//! Kinniku CLI - database migrations and console maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! kinniku-cli migrate
//!
//! # Create missing email templates / reset one
//! kinniku-cli templates seed
//! kinniku-cli templates seed --only payment_confirmed
//!
//! # List email templates
//! kinniku-cli templates list
//!
//! # Grant or revoke console access
//! kinniku-cli users set-role --id <uid> --role admin
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kinniku-cli")]
#[command(author, version, about = "Kinniku Admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage email templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Manage identity records
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Create missing templates from their defaults
    Seed {
        /// Overwrite only this template type with its default
        #[arg(long)]
        only: Option<String>,
    },
    /// List stored templates
    List,
}

#[derive(Subcommand)]
enum UserAction {
    /// Set the role of an identity record
    SetRole {
        /// Identity provider uid
        #[arg(long)]
        id: String,

        /// Role (`viewer`, `trainer`, `admin`)
        #[arg(short, long)]
        role: String,
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
        Commands::Templates { action } => match action {
            TemplateAction::Seed { only } => commands::templates::seed(only.as_deref()).await?,
            TemplateAction::List => commands::templates::list().await?,
        },
        Commands::Users { action } => match action {
            UserAction::SetRole { id, role } => commands::users::set_role(&id, &role).await?,
        },
    }
    Ok(())
}
