use super::AccountService;
use crate::accounts::{Account, Lookup, Role};
use crate::auth::{
    generate_password, hash_password_blocking, refresh_token_digest, verify_password_blocking, Claims,
    TokenPair,
};
use crate::error::{AppError, AuthError};

impl<R: Role> AccountService<R> {
    /// Authenticate and open a session.
    ///
    /// Any previously stored refresh token is overwritten, which ends every
    /// other session of the account. Inactive accounts may log in.
    pub async fn login(&self, login: &str, password: &str) -> Result<TokenPair, AppError> {
        let lookup = R::login_lookup(login.trim()).ok_or(AuthError::InvalidCredentials)?;

        let record = self
            .store
            .find_one(R::KIND, &lookup)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let mut account = Account::<R>::from_record(record)?;

        let valid = verify_password_blocking(password.to_string(), account.password_hash.clone()).await?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.start_session(&mut account).await?;
        tracing::info!(role = %R::KIND, account_id = %account.id, "Account logged in");
        Ok(tokens)
    }

    /// End the session that owns `refresh_token`
    pub async fn logout(&self, refresh_token: &str) -> Result<Account<R>, AppError> {
        let record = self
            .store
            .take_refresh_token(R::KIND, &refresh_token_digest(refresh_token))
            .await?
            .ok_or_else(|| AppError::not_found("session"))?;
        let account = Account::<R>::from_record(record)?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Account logged out");
        Ok(account)
    }

    /// Rotate a refresh token into a fresh token pair.
    ///
    /// The token must verify, its subject must exist, and it must be the
    /// token currently stored for that subject.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims: Claims<R::Flags> = self.tokens.verify_refresh(refresh_token)?;
        if claims.role != R::KIND {
            return Err(AuthError::TokenInvalid.into());
        }
        let id = claims.account_id()?;

        let by_id = self
            .store
            .find_by_id(R::KIND, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} {}", R::KIND, id)))?;
        let by_token = self
            .store
            .find_one(
                R::KIND,
                &Lookup::RefreshTokenDigest(refresh_token_digest(refresh_token)),
            )
            .await?
            .ok_or_else(|| AppError::not_found("session"))?;

        if by_token.id != by_id.id {
            tracing::warn!(role = %R::KIND, account_id = %id, "Refresh token stored on a different account");
            return Err(AuthError::TokenInvalid.into());
        }

        let mut account = Account::<R>::from_record(by_id)?;
        let tokens = self.start_session(&mut account).await?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Session refreshed");
        Ok(tokens)
    }

    /// Replace the password with a generated one and mail it in plaintext.
    /// The stored hash only changes once the mail went out.
    pub async fn forget_password(&self, email: &str) -> Result<(), AppError> {
        let record = self
            .store
            .find_one(R::KIND, &Lookup::Email(email.trim().to_string()))
            .await?
            .ok_or_else(|| AppError::not_found("account"))?;
        let mut account = Account::<R>::from_record(record)?;

        let password = generate_password();
        self.mailer.send_password_mail(&account.email, &password).await?;

        account.password_hash = hash_password_blocking(password).await?;
        self.store.save(&account.to_record()?).await?;

        tracing::info!(role = %R::KIND, account_id = %account.id, "Password reset mailed");
        Ok(())
    }
}
