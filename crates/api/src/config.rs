//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - One of:
//!   - `AUTH_JWT_PUBLIC_KEY` - RS256 public key (PEM) of the identity provider
//!   - `AUTH_JWT_SECRET` - HS256 shared secret (high entropy, not a placeholder)
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 5000)
//! - `AUTH_JWT_ISSUER` - Expected `iss` claim
//! - `AUTH_JWT_AUDIENCE` - Expected `aud` claim
//! - `AUTH_ADMIN_ROLE` - Role that grants admin access (default: admin)
//! - `ORDER_STRICT_TRANSITIONS` - Enforce the order status transition table (default: false)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (default: any)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::services::orders::TransitionPolicy;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token verification
    pub auth: AuthConfig,
    /// Whether single-order status updates follow the transition table
    pub transitions: TransitionPolicy,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Key used to check token signatures.
#[derive(Clone)]
pub enum JwtKey {
    /// Identity provider's RS256 public key, PEM encoded.
    RsaPem(String),
    /// HS256 shared secret.
    Secret(SecretString),
}

/// Bearer token verification settings.
///
/// Implements `Debug` manually to redact the shared secret.
#[derive(Clone)]
pub struct AuthConfig {
    pub key: JwtKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Role claim value that grants admin access.
    pub admin_role: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self.key {
            JwtKey::RsaPem(_) => "RS256 public key",
            JwtKey::Secret(_) => "[REDACTED]",
        };
        f.debug_struct("AuthConfig")
            .field("key", &key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("admin_role", &self.admin_role)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BAZAAR_DATABASE_URL")?;
        let host = get_env_or_default("BAZAAR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BAZAAR_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_PORT".to_string(), e.to_string()))?;

        let transitions = if parse_bool("ORDER_STRICT_TRANSITIONS")? {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        };

        let log_format = match get_optional_env("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            host,
            port,
            auth: AuthConfig::from_env()?,
            transitions,
            cors_origins: parse_origins(get_optional_env("CORS_ALLOWED_ORIGINS").as_deref())?,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    /// Load the token verification settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when neither key variable is set or the shared
    /// secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = if let Some(pem) = get_optional_env("AUTH_JWT_PUBLIC_KEY") {
            // Single-line deployments store the PEM with literal "\n"
            JwtKey::RsaPem(pem.replace("\\n", "\n"))
        } else {
            let secret = get_validated_secret("AUTH_JWT_SECRET").map_err(|e| match e {
                ConfigError::MissingEnvVar(_) => ConfigError::MissingEnvVar(
                    "AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET".to_string(),
                ),
                other => other,
            })?;
            validate_secret_length(&secret, "AUTH_JWT_SECRET")?;
            JwtKey::Secret(secret)
        };

        Ok(Self {
            key,
            issuer: get_optional_env("AUTH_JWT_ISSUER"),
            audience: get_optional_env("AUTH_JWT_AUDIENCE"),
            admin_role: get_env_or_default("AUTH_ADMIN_ROLE", "admin"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_bool(key: &str) -> Result<bool, ConfigError> {
    match get_optional_env(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("false" | "0" | "no") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}

fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `CORS_ALLOWED_ORIGINS`, rejecting entries that are not absolute URLs.
fn parse_origins(value: Option<&str>) -> Result<Vec<String>, ConfigError> {
    parse_list(value)
        .into_iter()
        .map(|origin| {
            url::Url::parse(&origin)
                .map(|_| origin.trim_end_matches('/').to_owned())
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "CORS_ALLOWED_ORIGINS".to_string(),
                        format!("'{origin}': {e}"),
                    )
                })
        })
        .collect()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for candidate in ["your-jwt-key-here", "changeme123", "my-jwt-secret-value"] {
            let err = validate_secret_strength(candidate, "AUTH_JWT_SECRET").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "AUTH_JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "AUTH_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "AUTH_JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("k".repeat(32)), "AUTH_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(Some("https://admin.bazaar.test, ,http://localhost:5173")),
            vec!["https://admin.bazaar.test", "http://localhost:5173"]
        );
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(Some("https://admin.bazaar.test/")).unwrap(),
            vec!["https://admin.bazaar.test"]
        );
        assert!(matches!(
            parse_origins(Some("admin.bazaar.test")),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/bazaar"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            auth: AuthConfig {
                key: JwtKey::Secret(SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6")),
                issuer: None,
                audience: None,
                admin_role: "admin".to_string(),
            },
            transitions: TransitionPolicy::Permissive,
            cors_origins: Vec::new(),
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        let config = AuthConfig {
            key: JwtKey::Secret(SecretString::from("super_secret_signing_value")),
            issuer: Some("https://id.bazaar.test".to_string()),
            audience: None,
            admin_role: "admin".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://id.bazaar.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_signing_value"));
    }
}
