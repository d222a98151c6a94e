//! 비밀번호 해시 생성.

use anyhow::{Context, Result};
use freelance_core::crypto::hash_password;

/// 평문 비밀번호의 Argon2 PHC 해시를 만듭니다.
pub fn run(password: &str) -> Result<String> {
    if password.len() < 6 {
        anyhow::bail!("Password must be at least 6 characters");
    }
    hash_password(password).context("failed to hash password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use freelance_core::crypto::verify_password;

    #[test]
    fn test_hash_verifies() {
        let hash = run("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).is_ok());
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(run("abc").is_err());
    }
}
