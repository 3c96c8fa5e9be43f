use bcrypt::{hash, verify};

use crate::utils::errors::AppError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::internal(anyhow::anyhow!(
        "Failed to hash password: {}",
        e
    )))
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    verify(password, hashed).map_err(|e| AppError::internal(anyhow::anyhow!(
        "Failed to verify password: {}",
        e
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast; production cost comes from AppConfig.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hashed = hash_password("pass1", TEST_COST).unwrap();
        assert_ne!(hashed, "pass1");
        assert!(verify_password("pass1", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        let a = hash_password("pass1", TEST_COST).unwrap();
        let b = hash_password("pass1", TEST_COST).unwrap();
        assert_ne!(a, b);
    }
}
