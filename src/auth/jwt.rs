/// JWT Token Issuance and Validation
///
/// Access and refresh tokens are both HS256 JWTs minted from the same
/// payload, signed with independent secrets and lifetimes. Verification
/// covers signature, issuer and expiry only; whether a refresh token has been
/// revoked is decided against the credential store.
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::RoleKind;
use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Freshly minted token pair, serialized the way clients expect it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtSettings,
}

impl TokenIssuer {
    pub fn new(config: JwtSettings) -> Self {
        Self { config }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.config
    }

    /// Sign an access and a refresh token for the same subject and flags
    ///
    /// # Errors
    /// Returns error if token encoding fails
    pub fn issue<F: Serialize + Clone>(
        &self,
        account_id: Uuid,
        role: RoleKind,
        flags: &F,
    ) -> Result<TokenPair, AppError> {
        let access = Claims::new(
            account_id,
            role,
            flags.clone(),
            self.config.access_token_expiry,
            self.config.issuer.clone(),
        );
        let refresh = Claims::new(
            account_id,
            role,
            flags.clone(),
            self.config.refresh_token_expiry_secs(),
            self.config.issuer.clone(),
        );

        Ok(TokenPair {
            access_token: sign(&access, &self.config.access_secret)?,
            refresh_token: sign(&refresh, &self.config.refresh_secret)?,
        })
    }

    /// Validate an access token and extract its claims
    pub fn verify_access<F: DeserializeOwned>(&self, token: &str) -> Result<Claims<F>, AuthError> {
        self.verify(token, &self.config.access_secret)
    }

    /// Validate a refresh token and extract its claims
    pub fn verify_refresh<F: DeserializeOwned>(&self, token: &str) -> Result<Claims<F>, AuthError> {
        self.verify(token, &self.config.refresh_secret)
    }

    fn verify<F: DeserializeOwned>(&self, token: &str, secret: &str) -> Result<Claims<F>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<Claims<F>>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })
    }
}

fn sign<F: Serialize>(claims: &Claims<F>, secret: &str) -> Result<String, AppError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}
