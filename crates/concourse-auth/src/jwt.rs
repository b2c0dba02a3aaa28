//! Local access-token verification.
//!
//! Verification never touches the network: the signature and expiry are
//! checked against a key loaded once at startup.

use std::str::FromStr;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// Claims carried by a verified access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    /// Subject, the user id as issued by the authorization service.
    pub sub: String,
}

/// Trait for verifying access tokens.
#[async_trait]
pub trait JwtValidator: Send + Sync {
    /// Verify a token and extract its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::Expired` if the token is past its expiry
    /// - `AuthError::Invalid` if the signature does not verify
    /// - `AuthError::Undecodable` for any other decode failure, malformed
    ///   tokens included
    async fn validate(&self, token: &str) -> Result<TokenClaims>;
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
}

/// Verifies tokens with a configured public key (or shared secret for HMAC).
pub struct PublicKeyValidator {
    key: DecodingKey,
    validation: Validation,
}

impl PublicKeyValidator {
    /// Load the verification key for the configured algorithm.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the algorithm name is unknown or the key
    /// cannot be parsed for that algorithm family.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| AuthError::Config(format!("unknown algorithm: {}", config.algorithm)))?;

        let pem = config.public_key_pem.as_bytes();
        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(DecodingKey::from_secret(pem)),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        }
        .map_err(|e| AuthError::Config(format!("invalid verification key: {e}")))?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self { key, validation })
    }
}

#[async_trait]
impl JwtValidator for PublicKeyValidator {
    async fn validate(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<RawClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::Invalid(e.to_string()),
                _ => AuthError::Undecodable(e.to_string()),
            }
        })?;

        Ok(TokenClaims {
            sub: data.claims.sub,
        })
    }
}

/// A mock JWT validator for testing.
///
/// Accepts tokens of the form `test-token:<sub>`. The token `expired` fails
/// with `AuthError::Expired`; anything else is `AuthError::Invalid`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockJwtValidator;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl JwtValidator for MockJwtValidator {
    async fn validate(&self, token: &str) -> Result<TokenClaims> {
        if token == "expired" {
            return Err(AuthError::Expired);
        }
        let sub = token
            .strip_prefix("test-token:")
            .ok_or_else(|| AuthError::Invalid("expected test-token:<sub>".to_string()))?;

        Ok(TokenClaims {
            sub: sub.to_string(),
        })
    }
}
