//! Bazaar CLI - Database migrations and development tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar migrate
//!
//! # Load the demo catalog into an empty database
//! bazaar seed
//!
//! # Mint a bearer token for local testing
//! bazaar token --subject dev-admin --email admin@example.com --admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert the demo catalog
//! - `token` - Sign a development token with `AUTH_JWT_SECRET`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the demo catalog
    Seed {
        /// Insert even if the catalog already has products
        #[arg(long)]
        force: bool,
    },
    /// Print a development bearer token
    Token {
        /// Identity reference (`sub` claim)
        #[arg(short, long)]
        subject: String,

        /// Email claim
        #[arg(short, long)]
        email: String,

        /// Display name claim
        #[arg(short, long)]
        name: Option<String>,

        /// Grant the configured admin role
        #[arg(long)]
        admin: bool,

        /// Lifetime in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { force } => {
            commands::seed::products(force).await?;
        }
        Commands::Token {
            subject,
            email,
            name,
            admin,
            hours,
        } => {
            let token = commands::token::issue(&subject, &email, name, admin, hours)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{token}");
            }
        }
    }
    Ok(())
}
