use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::model::{AccountRecord, Lookup};
use crate::accounts::role::RoleKind;
use crate::accounts::store::AccountStore;
use crate::error::{AppError, DatabaseError};

const ACCOUNT_COLUMNS: &str = "id, role, email, phone, nick_name, password_hash, activation_token, \
     is_active, refresh_token_digest, profile, created_at";

/// Postgres-backed credential store over the `accounts` table
#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::UnexpectedError(e.to_string())))
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    role: String,
    email: String,
    phone: Option<String>,
    nick_name: Option<String>,
    password_hash: String,
    activation_token: String,
    is_active: bool,
    refresh_token_digest: Option<String>,
    profile: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<RoleKind>()
            .map_err(|e| AppError::Database(DatabaseError::CorruptedRecord(e)))?;

        Ok(AccountRecord {
            id: row.id,
            role,
            email: row.email,
            phone: row.phone,
            nick_name: row.nick_name,
            password_hash: row.password_hash,
            activation_token: row.activation_token,
            is_active: row.is_active,
            refresh_token_digest: row.refresh_token_digest,
            profile: row.profile.0,
            created_at: row.created_at,
        })
    }
}

fn lookup_column(lookup: &Lookup) -> &'static str {
    match lookup {
        Lookup::Email(_) => "email",
        Lookup::Phone(_) => "phone",
        Lookup::Nickname(_) => "nick_name",
        Lookup::ActivationToken(_) => "activation_token",
        Lookup::RefreshTokenDigest(_) => "refresh_token_digest",
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn insert(&self, record: AccountRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, role, email, phone, nick_name, password_hash,
                activation_token, is_active, refresh_token_digest, profile, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.role.as_str())
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.nick_name)
        .bind(&record.password_hash)
        .bind(&record.activation_token)
        .bind(record.is_active)
        .bind(&record.refresh_token_digest)
        .bind(Json(&record.profile))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, role: RoleKind) -> Result<Vec<AccountRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM accounts WHERE role = $1 ORDER BY created_at",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AccountRecord::try_from)
            .collect()
    }

    async fn find_by_id(&self, role: RoleKind, id: Uuid) -> Result<Option<AccountRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM accounts WHERE role = $1 AND id = $2",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AccountRecord::try_from)
            .transpose()
    }

    async fn find_one(&self, role: RoleKind, lookup: &Lookup) -> Result<Option<AccountRecord>, AppError> {
        // column names come from a closed set, values are always bound
        let query = format!(
            "SELECT {} FROM accounts WHERE role = $1 AND {} = $2 ORDER BY created_at LIMIT 1",
            ACCOUNT_COLUMNS,
            lookup_column(lookup)
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(role.as_str())
            .bind(lookup.value())
            .fetch_optional(&self.pool)
            .await?
            .map(AccountRecord::try_from)
            .transpose()
    }

    async fn save(&self, record: &AccountRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $3, phone = $4, nick_name = $5, password_hash = $6,
                is_active = $7, refresh_token_digest = $8, profile = $9
            WHERE role = $1 AND id = $2
            "#,
        )
        .bind(record.role.as_str())
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.nick_name)
        .bind(&record.password_hash)
        .bind(record.is_active)
        .bind(&record.refresh_token_digest)
        .bind(Json(&record.profile))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("{} {}", record.role, record.id)));
        }
        Ok(())
    }

    async fn take_refresh_token(
        &self,
        role: RoleKind,
        digest: &str,
    ) -> Result<Option<AccountRecord>, AppError> {
        let query = format!(
            "UPDATE accounts SET refresh_token_digest = NULL \
             WHERE role = $1 AND refresh_token_digest = $2 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(role.as_str())
            .bind(digest)
            .fetch_optional(&self.pool)
            .await?
            .map(AccountRecord::try_from)
            .transpose()
    }

    async fn delete(&self, role: RoleKind, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE role = $1 AND id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
