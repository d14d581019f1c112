//! Development token minting.
//!
//! Only works with an HS256 `AUTH_JWT_SECRET`; tokens for an RS256 setup
//! must come from the identity provider.

use bazaar_api::config::{AuthConfig, JwtKey};
use bazaar_api::services::auth::{Claims, issue_development_token};
use chrono::Duration;

use super::CommandError;

/// Sign a token the running server will accept.
///
/// # Errors
///
/// Returns an error if the auth configuration is missing or uses a public key.
pub fn issue(
    subject: &str,
    email: &str,
    name: Option<String>,
    admin: bool,
    hours: i64,
) -> Result<String, CommandError> {
    dotenvy::dotenv().ok();
    let auth = AuthConfig::from_env()?;

    let JwtKey::Secret(secret) = &auth.key else {
        return Err(CommandError::Token(
            "AUTH_JWT_SECRET is required to sign development tokens".to_owned(),
        ));
    };

    let claims = Claims {
        sub: subject.to_owned(),
        exp: 0,
        iat: None,
        iss: auth.issuer.clone(),
        aud: auth.audience.clone().map(serde_json::Value::String),
        email: Some(email.to_owned()),
        name,
        picture: None,
        roles: if admin {
            vec![auth.admin_role.clone()]
        } else {
            Vec::new()
        },
    };

    issue_development_token(secret, claims, Duration::hours(hours))
        .map_err(|e| CommandError::Token(e.to_string()))
}
