use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::accounts::role::{Role, RoleKind};
use crate::error::{AppError, DatabaseError};

/// Single-field lookup against accounts of one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Email(String),
    Phone(String),
    Nickname(String),
    ActivationToken(String),
    /// SHA-256 digest of the refresh token, see `auth::refresh_token_digest`
    RefreshTokenDigest(String),
}

impl Lookup {
    pub fn value(&self) -> &str {
        match self {
            Lookup::Email(v)
            | Lookup::Phone(v)
            | Lookup::Nickname(v)
            | Lookup::ActivationToken(v)
            | Lookup::RefreshTokenDigest(v) => v,
        }
    }
}

/// Role-agnostic persisted form of an account. The role profile is kept as
/// JSON so both roles share one table and one store.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: Uuid,
    pub role: RoleKind,
    pub email: String,
    pub phone: Option<String>,
    pub nick_name: Option<String>,
    pub password_hash: String,
    pub activation_token: String,
    pub is_active: bool,
    pub refresh_token_digest: Option<String>,
    pub profile: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    pub fn matches(&self, lookup: &Lookup) -> bool {
        match lookup {
            Lookup::Email(email) => &self.email == email,
            Lookup::Phone(phone) => self.phone.as_ref() == Some(phone),
            Lookup::Nickname(nick) => self.nick_name.as_ref() == Some(nick),
            Lookup::ActivationToken(token) => &self.activation_token == token,
            Lookup::RefreshTokenDigest(digest) => self.refresh_token_digest.as_ref() == Some(digest),
        }
    }
}

/// Typed account of one role.
///
/// Serializes without any credential material: password hash, activation
/// token and refresh token digest never leave the service.
#[derive(Debug, Clone, Serialize)]
pub struct Account<R: Role> {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub nick_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: R::Profile,
    #[serde(skip)]
    pub(crate) password_hash: String,
    #[serde(skip)]
    pub(crate) activation_token: String,
    #[serde(skip)]
    pub(crate) refresh_token_digest: Option<String>,
}

impl<R: Role> Account<R> {
    pub fn activation_token(&self) -> &str {
        &self.activation_token
    }

    pub fn has_session(&self) -> bool {
        self.refresh_token_digest.is_some()
    }

    pub fn from_record(record: AccountRecord) -> Result<Self, AppError> {
        if record.role != R::KIND {
            return Err(AppError::Database(DatabaseError::CorruptedRecord(format!(
                "account {} is a {}, expected {}",
                record.id,
                record.role,
                R::KIND
            ))));
        }

        Ok(Self {
            id: record.id,
            email: record.email,
            phone: record.phone,
            nick_name: record.nick_name,
            is_active: record.is_active,
            created_at: record.created_at,
            profile: serde_json::from_value(record.profile)?,
            password_hash: record.password_hash,
            activation_token: record.activation_token,
            refresh_token_digest: record.refresh_token_digest,
        })
    }

    pub fn to_record(&self) -> Result<AccountRecord, AppError> {
        Ok(AccountRecord {
            id: self.id,
            role: R::KIND,
            email: self.email.clone(),
            phone: self.phone.clone(),
            nick_name: self.nick_name.clone(),
            password_hash: self.password_hash.clone(),
            activation_token: self.activation_token.clone(),
            is_active: self.is_active,
            refresh_token_digest: self.refresh_token_digest.clone(),
            profile: serde_json::to_value(&self.profile)?,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::role::{Admin, AdminProfile, Author};

    fn record(role: RoleKind) -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            role,
            email: "root@example.com".to_string(),
            phone: None,
            nick_name: None,
            password_hash: "$2b$07$hash".to_string(),
            activation_token: "link".to_string(),
            is_active: false,
            refresh_token_digest: Some("digest".to_string()),
            profile: serde_json::json!({"name": "Root", "is_creator": true}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_conversion_round_trip() {
        let original = record(RoleKind::Admin);
        let account = Account::<Admin>::from_record(original.clone()).unwrap();

        assert_eq!(
            account.profile,
            AdminProfile {
                name: "Root".to_string(),
                is_creator: true
            }
        );
        assert_eq!(account.to_record().unwrap(), original);
    }

    #[test]
    fn test_role_mismatch_is_rejected() {
        assert!(Account::<Author>::from_record(record(RoleKind::Admin)).is_err());
    }

    #[test]
    fn test_serialization_hides_credentials() {
        let account = Account::<Admin>::from_record(record(RoleKind::Admin)).unwrap();
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["email"], "root@example.com");
        assert_eq!(json["is_creator"], true);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("activation_token").is_none());
        assert!(json.get("refresh_token_digest").is_none());
    }

    #[test]
    fn test_lookup_matching() {
        let record = record(RoleKind::Admin);
        assert!(record.matches(&Lookup::Email("root@example.com".to_string())));
        assert!(record.matches(&Lookup::ActivationToken("link".to_string())));
        assert!(record.matches(&Lookup::RefreshTokenDigest("digest".to_string())));
        assert!(!record.matches(&Lookup::Nickname("root".to_string())));
        assert!(!record.matches(&Lookup::Phone("90-123-45-67".to_string())));
    }
}
