//! 개발용 액세스 토큰 발급.

use anyhow::{Context, Result};
use freelance_api::{IssuedToken, TokenIssuer};
use freelance_core::{AccountId, AuthConfig, Role};

/// 설정된 서명 시크릿으로 토큰을 발급합니다.
///
/// 계정 존재 여부는 확인하지 않습니다. 없는 계정의 토큰은 서버에서 401로 거부됩니다.
pub fn run(auth: &AuthConfig, id: &str, role: &str) -> Result<IssuedToken> {
    let role = Role::parse(role)
        .ok_or_else(|| anyhow::anyhow!("Invalid role: {role}. Supported: freelancer, client, admin"))?;

    let issuer = TokenIssuer::new(&auth.signing_secret(), auth.token_ttl_minutes);
    issuer
        .issue_for(&AccountId::new(id), role)
        .context("failed to sign token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use freelance_api::TokenVerifier;
    use secrecy::SecretString;

    #[test]
    fn test_issued_token_verifies_with_same_secret() {
        let auth = AuthConfig {
            jwt_secret: Some(SecretString::from("cli-test-secret-0123456789".to_string())),
            ..Default::default()
        };

        let issued = run(&auth, "u1", "client").unwrap();
        let verifier = TokenVerifier::new(&auth.signing_secret(), auth.leeway_secs);
        let claims = verifier.verify(&issued.access_token).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Client);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(run(&AuthConfig::default(), "u1", "superuser").is_err());
    }
}
