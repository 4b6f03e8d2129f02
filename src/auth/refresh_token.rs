/// Refresh token storage form
///
/// The store keeps only a SHA-256 digest of the current refresh token; the
/// plaintext JWT lives in the client's cookie. Lookups hash the presented
/// token first.
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a refresh token
pub fn refresh_token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
