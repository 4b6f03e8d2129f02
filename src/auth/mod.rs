/// Authentication module
///
/// Password hashing, JWT issuance/validation and the storage form of
/// refresh tokens.
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use claims::Claims;
pub use jwt::{TokenIssuer, TokenPair};
pub use password::{
    generate_password, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking, GENERATED_PASSWORD_LENGTH, HASH_COST,
};
pub use refresh_token::refresh_token_digest;
