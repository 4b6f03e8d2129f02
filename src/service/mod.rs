//! Account service
//!
//! One generic component drives the whole account lifecycle for every role:
//! registration and activation live in [`activation`], login/logout/refresh
//! and password reset in [`session`], plain maintenance below.
mod activation;
mod session;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{Account, AccountStore, Role};
use crate::auth::{hash_password_blocking, refresh_token_digest, TokenIssuer, TokenPair};
use crate::email_client::Mailer;
use crate::error::{AppError, AuthError, ValidationError};
use crate::validators::{is_valid_email, is_valid_nickname, is_valid_password};

/// Registration input. Accepts both plain and role-prefixed field names.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount<P> {
    #[serde(alias = "admin_email", alias = "author_email")]
    pub email: String,
    #[serde(alias = "admin_password", alias = "author_password")]
    pub password: String,
    #[serde(alias = "admin_phone", alias = "author_phone", default)]
    pub phone: Option<String>,
    #[serde(alias = "author_nick_name", default)]
    pub nick_name: Option<String>,
    #[serde(flatten)]
    pub profile: P,
}

/// Partial update; absent fields are left untouched. Profile fields sit at
/// the top level next to the common ones, as in registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges<C> {
    #[serde(alias = "admin_email", alias = "author_email", default)]
    pub email: Option<String>,
    #[serde(alias = "admin_password", alias = "author_password", default)]
    pub password: Option<String>,
    #[serde(alias = "admin_phone", alias = "author_phone", default)]
    pub phone: Option<String>,
    #[serde(alias = "author_nick_name", default)]
    pub nick_name: Option<String>,
    #[serde(flatten)]
    pub profile: C,
}

/// Result of a registration: the new account and its first token pair
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct Registration<R: Role> {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub account: Account<R>,
}

pub struct AccountService<R: Role> {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
    api_url: String,
    role: PhantomData<R>,
}

impl<R: Role> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mailer: Arc::clone(&self.mailer),
            tokens: self.tokens.clone(),
            api_url: self.api_url.clone(),
            role: PhantomData,
        }
    }
}

impl<R: Role> AccountService<R> {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenIssuer,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            api_url: api_url.into(),
            role: PhantomData,
        }
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn list(&self) -> Result<Vec<Account<R>>, AppError> {
        self.store
            .list(R::KIND)
            .await?
            .into_iter()
            .map(Account::from_record)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<Account<R>, AppError> {
        let id = parse_id(id)?;
        self.load(id).await
    }

    pub async fn update(
        &self,
        id: &str,
        changes: AccountChanges<R::ProfileChanges>,
    ) -> Result<Account<R>, AppError> {
        let id = parse_id(id)?;
        let mut account = self.load(id).await?;

        if let Some(email) = changes.email {
            account.email = is_valid_email(&email)?;
        }
        if let Some(phone) = changes.phone {
            account.phone = normalize_optional(Some(phone));
        }
        if let Some(nick_name) = changes.nick_name {
            account.nick_name = Some(is_valid_nickname(&nick_name)?);
        }
        R::apply_profile_changes(&mut account.profile, changes.profile);
        if let Some(password) = changes.password {
            is_valid_password(&password)?;
            account.password_hash = hash_password_blocking(password).await?;
        }

        self.ensure_natural_key_free(&account).await?;
        self.store.save(&account.to_record()?).await?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Account updated");
        Ok(account)
    }

    /// Delete an account on behalf of `actor` (the authenticated account id)
    pub async fn delete(&self, id: &str, actor: Uuid) -> Result<(), AppError> {
        let id = parse_id(id)?;

        if R::OWNER_ONLY_DELETE && actor != id {
            tracing::warn!(role = %R::KIND, account_id = %id, actor = %actor, "Delete of foreign account refused");
            return Err(AuthError::Forbidden.into());
        }

        if !self.store.delete(R::KIND, id).await? {
            return Err(AppError::not_found(format!("{} {}", R::KIND, id)));
        }

        tracing::info!(role = %R::KIND, account_id = %id, "Account deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Account<R>, AppError> {
        let record = self
            .store
            .find_by_id(R::KIND, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} {}", R::KIND, id)))?;
        Account::from_record(record)
    }

    /// Rejects the account when another account of the role already holds
    /// its natural key
    async fn ensure_natural_key_free(&self, account: &Account<R>) -> Result<(), AppError> {
        let Some(key) = R::natural_key(account) else {
            return Ok(());
        };

        match self.store.find_one(R::KIND, &key).await? {
            Some(existing) if existing.id != account.id => {
                Err(AppError::conflict(format!("{} is already taken", key.value())))
            }
            _ => Ok(()),
        }
    }

    /// Mint a token pair and make its refresh token the only valid one
    async fn start_session(&self, account: &mut Account<R>) -> Result<TokenPair, AppError> {
        let tokens = self.tokens.issue(account.id, R::KIND, &R::flags(account))?;
        account.refresh_token_digest = Some(refresh_token_digest(&tokens.refresh_token));
        self.store.save(&account.to_record()?).await?;
        Ok(tokens)
    }
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat("id".to_string()).into())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use crate::configuration::JwtSettings;
    use crate::error::EmailError;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SentMail {
        Activation { to: String, url: String },
        Password { to: String, password: String },
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
        pub fail: AtomicBool,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last_password(&self) -> Option<String> {
            self.sent().into_iter().rev().find_map(|m| match m {
                SentMail::Password { password, .. } => Some(password),
                _ => None,
            })
        }

        fn record(&self, mail: SentMail) -> Result<(), EmailError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EmailError::SendFailed("mail service down".to_string()));
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_activation_mail(&self, recipient: &str, activation_url: &str) -> Result<(), EmailError> {
            self.record(SentMail::Activation {
                to: recipient.to_string(),
                url: activation_url.to_string(),
            })
        }

        async fn send_password_mail(&self, recipient: &str, password: &str) -> Result<(), EmailError> {
            self.record(SentMail::Password {
                to: recipient.to_string(),
                password: password.to_string(),
            })
        }
    }

    pub fn jwt_settings() -> JwtSettings {
        JwtSettings {
            access_secret: "unit-test-access-secret-0123456789".to_string(),
            refresh_secret: "unit-test-refresh-secret-0123456789".to_string(),
            access_token_expiry: 900,
            refresh_ms: 86_400_000,
            issuer: "author-hub-test".to_string(),
        }
    }

    pub struct Harness<R: Role> {
        pub service: AccountService<R>,
        pub store: Arc<InMemoryAccountStore>,
        pub mailer: Arc<RecordingMailer>,
    }

    pub fn harness<R: Role>() -> Harness<R> {
        let store = Arc::new(InMemoryAccountStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let service = AccountService::new(
            store.clone(),
            mailer.clone(),
            TokenIssuer::new(jwt_settings()),
            "http://localhost:8080",
        );
        Harness { service, store, mailer }
    }
}
