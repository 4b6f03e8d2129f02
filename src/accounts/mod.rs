/// Accounts module
///
/// Role definitions, the account data model and the credential stores.
mod model;
mod postgres;
mod role;
mod store;

pub use model::{Account, AccountRecord, Lookup};
pub use postgres::PostgresAccountStore;
pub use role::{
    Admin, AdminFlags, AdminProfile, AdminProfileChanges, Author, AuthorFlags, AuthorProfile,
    AuthorProfileChanges, Role, RoleKind,
};
pub use store::{AccountStore, InMemoryAccountStore};
