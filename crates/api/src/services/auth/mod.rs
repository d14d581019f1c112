//! Bearer token verification.
//!
//! Customers and admins sign in with the external identity provider, which
//! issues JWTs. This service checks the signature, expiry and (when
//! configured) issuer and audience, then turns the claims into an
//! [`Identity`]. Admin access comes from the `roles` claim, so any number of
//! accounts can hold the admin role.

mod error;

pub use error::AuthError;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use bazaar_core::Email;

use crate::config::{AuthConfig, JwtKey};
use crate::models::CustomerIdentity;

/// Claims read from an identity-provider token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable identity reference at the provider.
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// A string or a list of strings, as issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Email,
    pub name: String,
    pub picture: Option<String>,
    pub is_admin: bool,
}

impl From<Identity> for CustomerIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            external_id: identity.subject,
            email: identity.email,
            name: identity.name,
            image_url: identity.picture,
            is_admin: identity.is_admin,
        }
    }
}

/// Verifies bearer tokens against the configured key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    admin_role: String,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("admin_role", &self.admin_role)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the RSA public key is not valid PEM.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let (key, algorithm) = match &config.key {
            JwtKey::RsaPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
            JwtKey::Secret(secret) => (
                DecodingKey::from_secret(secret.expose_secret().as_bytes()),
                Algorithm::HS256,
            ),
        };

        let mut required = vec!["exp", "sub"];
        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &config.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        // Without this a token that simply omits iss/aud skips those checks.
        validation.set_required_spec_claims(&required);

        Ok(Self {
            key,
            validation,
            admin_role: config.admin_role.clone(),
        })
    }

    /// Verify a token and extract the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns `ExpiredToken`, `InvalidToken` or `MissingClaim`.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        let email = claims
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .ok_or(AuthError::MissingClaim("email"))?;
        let name = claims
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.as_str().split('@').next().unwrap_or_default().to_owned());
        let is_admin = claims.roles.iter().any(|role| *role == self.admin_role);

        Ok(Identity {
            subject: claims.sub,
            email,
            name,
            picture: claims.picture.filter(|p| !p.is_empty()),
            is_admin,
        })
    }
}

/// Sign an HS256 token for local development and tests.
///
/// Production tokens come from the identity provider; this exists so the
/// CLI can hand out a working bearer token against a shared-secret setup.
///
/// # Errors
///
/// Returns `AuthError::Signing` if encoding fails.
pub fn issue_development_token(
    secret: &SecretString,
    mut claims: Claims,
    valid_for: Duration,
) -> Result<String, AuthError> {
    let now = Utc::now();
    claims.iat = Some(now.timestamp());
    claims.exp = (now + valid_for).timestamp();

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Pull the token out of an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_SECRET: &str = "kP9#vX2$mQ7!rT4&wZ8*nB3^hJ6@cF1%";

    pub(crate) fn config() -> AuthConfig {
        AuthConfig {
            key: JwtKey::Secret(SecretString::from(TEST_SECRET)),
            issuer: None,
            audience: None,
            admin_role: "admin".to_owned(),
        }
    }

    pub(crate) fn claims(sub: &str, roles: &[&str]) -> Claims {
        Claims {
            sub: sub.to_owned(),
            exp: 0,
            iat: None,
            iss: None,
            aud: None,
            email: Some(format!("{sub}@example.test")),
            name: Some(sub.to_owned()),
            picture: None,
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
        }
    }

    pub(crate) fn token(sub: &str, roles: &[&str]) -> String {
        issue_development_token(
            &SecretString::from(TEST_SECRET),
            claims(sub, roles),
            Duration::minutes(5),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_customer_and_admin() {
        let verifier = TokenVerifier::new(&config()).unwrap();

        let customer = verifier.verify(&token("alice", &[])).unwrap();
        assert_eq!(customer.subject, "alice");
        assert_eq!(customer.email.as_str(), "alice@example.test");
        assert!(!customer.is_admin);

        let admin = verifier.verify(&token("root", &["staff", "admin"])).unwrap();
        assert!(admin.is_admin);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let forged = issue_development_token(
            &SecretString::from("Zq8&Lm3!Tx5#Wv1@Hy7$Kd2^Rb9*Pn4%"),
            claims("mallory", &["admin"]),
            Duration::minutes(5),
        )
        .unwrap();

        assert!(matches!(
            verifier.verify(&forged),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_expired() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let stale = issue_development_token(
            &SecretString::from(TEST_SECRET),
            claims("alice", &[]),
            Duration::hours(-2),
        )
        .unwrap();

        assert!(matches!(verifier.verify(&stale), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_requires_email_claim() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let mut no_email = claims("ghost", &[]);
        no_email.email = None;
        let token =
            issue_development_token(&SecretString::from(TEST_SECRET), no_email, Duration::minutes(5))
                .unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::MissingClaim("email"))
        ));
    }

    #[test]
    fn test_issuer_is_checked_when_configured() {
        let mut config = config();
        config.issuer = Some("https://id.bazaar.test".to_owned());
        let verifier = TokenVerifier::new(&config).unwrap();

        assert!(verifier.verify(&token("alice", &[])).is_err());

        let mut issued = claims("alice", &[]);
        issued.iss = Some("https://id.bazaar.test".to_owned());
        let token =
            issue_development_token(&SecretString::from(TEST_SECRET), issued, Duration::minutes(5))
                .unwrap();
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_audience_is_required_when_configured() {
        let mut config = config();
        config.audience = Some("bazaar-api".to_owned());
        let verifier = TokenVerifier::new(&config).unwrap();

        assert!(matches!(
            verifier.verify(&token("alice", &[])),
            Err(AuthError::InvalidToken(_))
        ));

        let mut wrong = claims("alice", &[]);
        wrong.aud = Some(serde_json::json!("someone-else"));
        let wrong =
            issue_development_token(&SecretString::from(TEST_SECRET), wrong, Duration::minutes(5))
                .unwrap();
        assert!(verifier.verify(&wrong).is_err());

        let mut issued = claims("alice", &[]);
        issued.aud = Some(serde_json::json!(["other", "bazaar-api"]));
        let issued =
            issue_development_token(&SecretString::from(TEST_SECRET), issued, Duration::minutes(5))
                .unwrap();
        assert!(verifier.verify(&issued).is_ok());
    }

    #[test]
    fn test_invalid_rsa_key() {
        let mut config = config();
        config.key = JwtKey::RsaPem("not a pem".to_owned());
        assert!(matches!(
            TokenVerifier::new(&config),
            Err(AuthError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
    }
}
