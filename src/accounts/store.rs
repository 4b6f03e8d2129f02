//! Credential store
//!
//! Persistence seam for accounts of every role. Records are read, modified
//! and written back whole; there is no optimistic concurrency control, so
//! the last writer wins. The only compound operation is
//! [`AccountStore::take_refresh_token`], which finds and clears in one step.
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::accounts::model::{AccountRecord, Lookup};
use crate::accounts::role::RoleKind;
use crate::error::AppError;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, record: AccountRecord) -> Result<(), AppError>;

    async fn list(&self, role: RoleKind) -> Result<Vec<AccountRecord>, AppError>;

    async fn find_by_id(&self, role: RoleKind, id: Uuid) -> Result<Option<AccountRecord>, AppError>;

    /// First account of `role` matching `lookup`, oldest first
    async fn find_one(&self, role: RoleKind, lookup: &Lookup) -> Result<Option<AccountRecord>, AppError>;

    /// Overwrite a stored record. Fails with NotFound when the id is unknown.
    async fn save(&self, record: &AccountRecord) -> Result<(), AppError>;

    /// Clear the refresh token slot of the account holding `digest` and
    /// return the updated record
    async fn take_refresh_token(
        &self,
        role: RoleKind,
        digest: &str,
    ) -> Result<Option<AccountRecord>, AppError>;

    async fn delete(&self, role: RoleKind, id: Uuid) -> Result<bool, AppError>;
}

/// Process-local store. Mirrors the unique indexes of the Postgres schema.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<Vec<AccountRecord>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<AccountRecord>>, AppError> {
        self.accounts
            .read()
            .map_err(|_| AppError::Internal("account store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<AccountRecord>>, AppError> {
        self.accounts
            .write()
            .map_err(|_| AppError::Internal("account store lock poisoned".to_string()))
    }
}

fn violates_unique_index(existing: &AccountRecord, candidate: &AccountRecord) -> Option<&'static str> {
    if existing.role != candidate.role || existing.id == candidate.id {
        return None;
    }
    if existing.activation_token == candidate.activation_token {
        return Some("activation_token");
    }
    // nick names are only unique among authors
    match (&existing.nick_name, &candidate.nick_name) {
        (Some(a), Some(b)) if a == b && candidate.role == RoleKind::Author => Some("nick_name"),
        _ => None,
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, record: AccountRecord) -> Result<(), AppError> {
        let mut accounts = self.write()?;
        if accounts.iter().any(|a| a.id == record.id) {
            return Err(AppError::conflict("id"));
        }
        if let Some(field) = accounts.iter().find_map(|a| violates_unique_index(a, &record)) {
            return Err(AppError::conflict(field));
        }
        accounts.push(record);
        Ok(())
    }

    async fn list(&self, role: RoleKind) -> Result<Vec<AccountRecord>, AppError> {
        Ok(self.read()?.iter().filter(|a| a.role == role).cloned().collect())
    }

    async fn find_by_id(&self, role: RoleKind, id: Uuid) -> Result<Option<AccountRecord>, AppError> {
        Ok(self
            .read()?
            .iter()
            .find(|a| a.role == role && a.id == id)
            .cloned())
    }

    async fn find_one(&self, role: RoleKind, lookup: &Lookup) -> Result<Option<AccountRecord>, AppError> {
        Ok(self
            .read()?
            .iter()
            .find(|a| a.role == role && a.matches(lookup))
            .cloned())
    }

    async fn save(&self, record: &AccountRecord) -> Result<(), AppError> {
        let mut accounts = self.write()?;
        if let Some(field) = accounts.iter().find_map(|a| violates_unique_index(a, record)) {
            return Err(AppError::conflict(field));
        }
        let slot = accounts
            .iter_mut()
            .find(|a| a.role == record.role && a.id == record.id)
            .ok_or_else(|| AppError::not_found(format!("{} {}", record.role, record.id)))?;
        *slot = record.clone();
        Ok(())
    }

    async fn take_refresh_token(
        &self,
        role: RoleKind,
        digest: &str,
    ) -> Result<Option<AccountRecord>, AppError> {
        let mut accounts = self.write()?;
        let found = accounts
            .iter_mut()
            .find(|a| a.role == role && a.refresh_token_digest.as_deref() == Some(digest));

        Ok(found.map(|account| {
            account.refresh_token_digest = None;
            account.clone()
        }))
    }

    async fn delete(&self, role: RoleKind, id: Uuid) -> Result<bool, AppError> {
        let mut accounts = self.write()?;
        let before = accounts.len();
        accounts.retain(|a| !(a.role == role && a.id == id));
        Ok(accounts.len() != before)
    }
}
