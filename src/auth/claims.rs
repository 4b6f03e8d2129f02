/// JWT Claims structure
///
/// Standard registered claims (RFC 7519) plus the account role and the
/// role-specific flags, flattened into the payload.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::RoleKind;
use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims<F> {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Role the account belongs to
    pub role: RoleKind,
    /// Unique token ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    #[serde(flatten)]
    pub flags: F,
}

impl<F> Claims<F> {
    pub fn new(account_id: Uuid, role: RoleKind, flags: F, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
            flags,
        }
    }

    /// Extract account ID from claims
    ///
    /// # Errors
    /// A subject that is not a UUID means the token was not minted here.
    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
    struct Flags {
        is_creator: bool,
    }

    #[test]
    fn test_claims_creation() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, RoleKind::Admin, Flags { is_creator: true }, 3600, "test".to_string());

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.account_id().unwrap(), id);
    }

    #[test]
    fn test_each_claims_has_its_own_jti() {
        let id = Uuid::new_v4();
        let a = Claims::new(id, RoleKind::Author, Flags { is_creator: true }, 60, "t".to_string());
        let b = Claims::new(id, RoleKind::Author, Flags { is_creator: true }, 60, "t".to_string());
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_flags_are_flattened() {
        let claims = Claims::new(
            Uuid::new_v4(),
            RoleKind::Admin,
            Flags { is_creator: false },
            60,
            "t".to_string(),
        );
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["is_creator"], false);
        assert_eq!(json["role"], "admin");
        let back: Claims<Flags> = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_invalid_account_id() {
        let mut claims = Claims::new(Uuid::new_v4(), RoleKind::Admin, Flags { is_creator: true }, 60, "t".to_string());
        claims.sub = "invalid-uuid".to_string();
        assert!(claims.account_id().is_err());
    }
}
