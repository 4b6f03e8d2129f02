use chrono::Utc;
use uuid::Uuid;

use super::{normalize_optional, AccountService, NewAccount, Registration};
use crate::accounts::{Account, Lookup, Role};
use crate::activation_link::ActivationLink;
use crate::auth::hash_password_blocking;
use crate::error::{AppError, AuthError, ValidationError};
use crate::validators::{is_valid_email, is_valid_nickname, is_valid_password};

impl<R: Role> AccountService<R> {
    /// Create a pending account, mail its activation link and open its
    /// first session. The account is usable before it is activated.
    pub async fn register(&self, input: NewAccount<R::Profile>) -> Result<Registration<R>, AppError> {
        let email = is_valid_email(&input.email)?;
        is_valid_password(&input.password)?;

        let nick_name = match normalize_optional(input.nick_name) {
            Some(nick) => Some(is_valid_nickname(&nick)?),
            None if R::REQUIRES_NICKNAME => {
                return Err(ValidationError::EmptyField("nick_name".to_string()).into());
            }
            None => None,
        };

        let link = ActivationLink::new();
        let mut account = Account::<R> {
            id: Uuid::new_v4(),
            email,
            phone: normalize_optional(input.phone),
            nick_name,
            is_active: false,
            created_at: Utc::now(),
            profile: input.profile,
            password_hash: String::new(),
            activation_token: link.token().to_string(),
            refresh_token_digest: None,
        };

        self.ensure_natural_key_free(&account).await?;
        account.password_hash = hash_password_blocking(input.password).await?;
        self.store.insert(account.to_record()?).await?;

        self.mailer
            .send_activation_mail(&account.email, &link.url(&self.api_url, R::KIND))
            .await?;

        let tokens = self.start_session(&mut account).await?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Account registered");
        Ok(Registration { tokens, account })
    }

    /// Flip a pending account to active. Each link works exactly once.
    pub async fn activate(&self, token: &str) -> Result<Account<R>, AppError> {
        let record = self
            .store
            .find_one(R::KIND, &Lookup::ActivationToken(token.to_string()))
            .await?
            .ok_or_else(|| AppError::not_found("activation link"))?;
        let mut account = Account::<R>::from_record(record)?;

        if account.is_active {
            return Err(AuthError::AlreadyActivated.into());
        }

        account.is_active = true;
        self.store.save(&account.to_record()?).await?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Account activated");
        Ok(account)
    }
}
