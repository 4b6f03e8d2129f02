//! Roles
//!
//! Admins and authors share one account lifecycle. What differs between them
//! (profile fields, token flags, how a login identifier is resolved, which
//! field must be unique) is described by the [`Role`] trait.
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::accounts::model::{Account, Lookup};
use crate::validators::{is_valid_email, looks_like_phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Admin,
    Author,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Admin => "admin",
            RoleKind::Author => "author",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleKind::Admin),
            "author" => Ok(RoleKind::Author),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

pub trait Role: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: RoleKind;

    /// Authors may only delete their own account.
    const OWNER_ONLY_DELETE: bool;

    /// Registration must carry a nick name.
    const REQUIRES_NICKNAME: bool;

    /// Role-specific account fields
    type Profile: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;

    /// Partial profile update; every field is optional
    type ProfileChanges: DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static;

    /// Role-specific flags carried in token payloads
    type Flags: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;

    fn flags(account: &Account<Self>) -> Self::Flags;

    /// Merge the fields present in `changes` into `profile`
    fn apply_profile_changes(profile: &mut Self::Profile, changes: Self::ProfileChanges);

    /// Maps a login identifier onto the single lookup strategy to try.
    /// `None` means the identifier can never match an account of this role.
    fn login_lookup(login: &str) -> Option<Lookup>;

    /// Field that must be unique among accounts of this role, if any.
    fn natural_key(account: &Account<Self>) -> Option<Lookup>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AdminProfile {
    #[serde(alias = "admin_name", default)]
    pub name: String,
    #[serde(alias = "admin_is_creator", default)]
    pub is_creator: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct AdminProfileChanges {
    #[serde(alias = "admin_name", default)]
    pub name: Option<String>,
    #[serde(alias = "admin_is_creator", default)]
    pub is_creator: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminFlags {
    pub is_active: bool,
    pub is_creator: bool,
}

impl Role for Admin {
    const KIND: RoleKind = RoleKind::Admin;
    const OWNER_ONLY_DELETE: bool = false;
    const REQUIRES_NICKNAME: bool = false;

    type Profile = AdminProfile;
    type ProfileChanges = AdminProfileChanges;
    type Flags = AdminFlags;

    fn flags(account: &Account<Self>) -> AdminFlags {
        AdminFlags {
            is_active: account.is_active,
            is_creator: account.profile.is_creator,
        }
    }

    fn apply_profile_changes(profile: &mut AdminProfile, changes: AdminProfileChanges) {
        if let Some(name) = changes.name {
            profile.name = name;
        }
        if let Some(is_creator) = changes.is_creator {
            profile.is_creator = is_creator;
        }
    }

    fn login_lookup(login: &str) -> Option<Lookup> {
        is_valid_email(login).ok().map(Lookup::Email)
    }

    // Admins have never enforced a unique natural key.
    fn natural_key(_account: &Account<Self>) -> Option<Lookup> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Author;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AuthorProfile {
    #[serde(alias = "author_first_name", default)]
    pub first_name: String,
    #[serde(alias = "author_last_name", default)]
    pub last_name: String,
    #[serde(alias = "author_info", default)]
    pub info: Option<String>,
    #[serde(alias = "author_position", default)]
    pub position: Option<String>,
    #[serde(alias = "author_photo", default)]
    pub photo: Option<String>,
    #[serde(alias = "author_is_expert", default)]
    pub is_expert: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct AuthorProfileChanges {
    #[serde(alias = "author_first_name", default)]
    pub first_name: Option<String>,
    #[serde(alias = "author_last_name", default)]
    pub last_name: Option<String>,
    #[serde(alias = "author_info", default)]
    pub info: Option<String>,
    #[serde(alias = "author_position", default)]
    pub position: Option<String>,
    #[serde(alias = "author_photo", default)]
    pub photo: Option<String>,
    #[serde(alias = "author_is_expert", default)]
    pub is_expert: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorFlags {
    pub is_active: bool,
    pub is_expert: bool,
}

impl Role for Author {
    const KIND: RoleKind = RoleKind::Author;
    const OWNER_ONLY_DELETE: bool = true;
    const REQUIRES_NICKNAME: bool = true;

    type Profile = AuthorProfile;
    type ProfileChanges = AuthorProfileChanges;
    type Flags = AuthorFlags;

    fn flags(account: &Account<Self>) -> AuthorFlags {
        AuthorFlags {
            is_active: account.is_active,
            is_expert: account.profile.is_expert,
        }
    }

    fn apply_profile_changes(profile: &mut AuthorProfile, changes: AuthorProfileChanges) {
        if let Some(first_name) = changes.first_name {
            profile.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            profile.last_name = last_name;
        }
        if changes.info.is_some() {
            profile.info = changes.info;
        }
        if changes.position.is_some() {
            profile.position = changes.position;
        }
        if changes.photo.is_some() {
            profile.photo = changes.photo;
        }
        if let Some(is_expert) = changes.is_expert {
            profile.is_expert = is_expert;
        }
    }

    // Phone first, then email, then nick name. The first strategy that
    // matches the input shape is the only one tried.
    fn login_lookup(login: &str) -> Option<Lookup> {
        if looks_like_phone(login) {
            Some(Lookup::Phone(login.to_string()))
        } else if let Ok(email) = is_valid_email(login) {
            Some(Lookup::Email(email))
        } else {
            Some(Lookup::Nickname(login.to_string()))
        }
    }

    fn natural_key(account: &Account<Self>) -> Option<Lookup> {
        account.nick_name.clone().map(Lookup::Nickname)
    }
}
