/// Password Hashing and Verification
///
/// bcrypt with a fixed work factor. Verification never errors: a hash that
/// cannot be parsed simply does not match.
use bcrypt::{hash, verify};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::error::AppError;

/// bcrypt work factor for stored credentials
pub const HASH_COST: u32 = 7;

/// Length of passwords generated by the forget-password flow
pub const GENERATED_PASSWORD_LENGTH: usize = 10;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}

/// Hash on the blocking pool so the request worker stays responsive
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Verify on the blocking pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

/// Generate a random alphanumeric password that contains at least one digit
pub fn generate_password() -> String {
    let mut rng = thread_rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect();

        if candidate.chars().any(|c| c.is_ascii_digit()) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "pw1";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
        // cost is embedded in the hash
        assert!(hash.contains("$07$"));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_round_trip() {
        for password in ["pw1", "ValidPassword123", "пароль", " spaced out "] {
            let hash = hash_password(password).expect("Failed to hash password");
            assert!(verify_password(password, &hash), "round trip failed for {:?}", password);
        }
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("pw1").expect("Failed to hash password");
        assert!(!verify_password("pw2", &hash));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("pw1", "not-a-bcrypt-hash"));
        assert!(!verify_password("pw1", ""));
    }

    #[test]
    fn test_generated_password_shape() {
        for _ in 0..50 {
            let password = generate_password();
            assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let hash = hash_password_blocking("pw1".to_string()).await.unwrap();
        assert!(verify_password_blocking("pw1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("nope".to_string(), hash).await.unwrap());
    }
}
