//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod token;

use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] bazaar_api::db::RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] bazaar_api::config::ConfigError),

    #[error("Invalid seed data: {0}")]
    Seed(String),

    #[error("Token error: {0}")]
    Token(String),
}

/// Read the database URL the server uses.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))
}
