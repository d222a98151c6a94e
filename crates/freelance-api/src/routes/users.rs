//! 계정 관리 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/users` - 회원 가입 (공개)
//! - `POST /api/v1/users/login` - 로그인 (공개)
//! - `GET /api/v1/users` - 계정 목록 (admin)
//! - `GET|PUT|DELETE /api/v1/users/{id}` - 계정 조회/수정/삭제 (admin)
//! - `GET /api/v1/users/{id}/profile` - 공개 프로필 (client, freelancer)
//! - `GET /api/v1/users/me` - 내 계정
//! - `POST /api/v1/users/me/2fa/enable` - 2단계 인증 활성화
//! - `POST /api/v1/users/me/2fa/verify` - 2단계 인증 코드 검증

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use freelance_core::crypto::{
    generate_totp_secret, hash_password, totp_uri, verify_password, verify_totp, PasswordError,
};
use freelance_core::{
    normalize_email, Account, AccountChange, AccountId, AccountUpdate, NewAccount, PublicProfile,
    Role, StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidateEmail};

use crate::auth::{gated, CurrentAccount, IssuedToken, ADMINS, ANY_ROLE, MEMBERS};
use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, QueryParams, ValidatedJson};
use crate::metrics::record_login;
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 회원 가입 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters long"))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(flatten)]
    pub token: IssuedToken,
}

/// 계정 변경 응답.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub message: String,
    pub user: Account,
}

/// 계정 목록 필터.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<Role>,
}

/// 2FA 활성화 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TwoFactorSetup {
    /// TOTP 시크릿 (hex)
    pub secret: String,
    /// 인증 앱 등록용 URI
    pub otpauth_url: String,
}

/// 2FA 검증 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyTwoFactorRequest {
    #[serde(alias = "token")]
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

/// 2FA 검증 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct TwoFactorResult {
    pub valid: bool,
}

// ==================== 핸들러 ====================

/// 회원 가입.
///
/// 관리자 계정은 가입으로 만들 수 없습니다.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.role == Role::Admin {
        return Err(ApiError::forbidden(
            "Administrator accounts cannot be self-registered",
        ));
    }

    let email = normalize_email(&req.email);
    if state.store.find_account_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let account = Account::new(NewAccount {
        email,
        password_hash,
        role: req.role,
        name: req.name,
        business_name: req.business_name,
        business_type: req.business_type,
        skills: req.skills,
    });

    let account = state
        .store
        .insert_account(account)
        .await
        .map_err(email_conflict)?;

    info!(account_id = %account.id, role = %account.role, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            message: "User created successfully".to_string(),
            user: account,
        }),
    ))
}

/// 로그인.
///
/// 계정이 없거나 비밀번호가 틀리면 같은 응답을 반환합니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let Some(account) = state
        .store
        .find_account_by_email(&normalize_email(&req.email))
        .await?
    else {
        record_login("failure");
        return Err(invalid());
    };

    match verify_password(&req.password, &account.password_hash) {
        Ok(()) => {}
        Err(PasswordError::VerificationFailed) => {
            record_login("failure");
            return Err(invalid());
        }
        Err(e) => {
            warn!(account_id = %account.id, error = %e, "Stored password hash is unusable");
            record_login("failure");
            return Err(invalid());
        }
    }

    let token = state.issuer.issue(&account)?;
    record_login("success");
    info!(account_id = %account.id, role = %account.role, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// 계정 목록 (admin).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.store.list_accounts(query.role).await?))
}

/// 계정 조회 (admin).
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    Ok(Json(find_user(&state, &AccountId::new(id)).await?))
}

/// 계정 수정 (admin). 역할 변경은 기존 토큰을 무효화합니다.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentAccount(admin): CurrentAccount,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<AccountUpdate>,
) -> ApiResult<Json<AccountResponse>> {
    if let Some(ref email) = update.email {
        if !email.trim().validate_email() {
            return Err(ApiError::Validation(vec![
                "Please provide a valid email address".to_string(),
            ]));
        }
    }

    let id = AccountId::new(id);
    let previous_role = find_user(&state, &id).await?.role;

    let account = state
        .store
        .modify_account(&id, AccountChange::Admin(update))
        .await
        .map_err(email_conflict)?;

    if account.role != previous_role {
        info!(
            admin_id = %admin.id,
            account_id = %account.id,
            from = %previous_role,
            to = %account.role,
            "Account role changed"
        );
    }

    Ok(Json(AccountResponse {
        message: "User updated successfully".to_string(),
        user: account,
    }))
}

/// 계정 삭제 (admin).
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentAccount(admin): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = AccountId::new(id);
    if id == admin.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    if !state.store.delete_account(&id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!(admin_id = %admin.id, account_id = %id, "Account deleted");
    Ok(Json(serde_json::json!({ "message": "User deleted successfully" })))
}

/// 공개 프로필 조회.
///
/// 비공개 프로필은 본인에게만 보입니다.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentAccount(me): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let account = find_user(&state, &AccountId::new(id)).await?;
    if !account.privacy.show_profile_publicly && account.id != me.id {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(PublicProfile::from(&account)))
}

/// 내 계정.
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<Account> {
    Json(account)
}

/// 2단계 인증 활성화. 새 시크릿을 생성하여 저장합니다.
pub async fn enable_two_factor(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<TwoFactorSetup>> {
    let secret = generate_totp_secret();
    let otpauth_url = totp_uri(&secret, &account.email, &state.totp);

    let account = state
        .store
        .modify_account(&account.id, AccountChange::TwoFactorSecret(secret.clone()))
        .await?;

    info!(account_id = %account.id, "Two-factor authentication enabled");
    Ok(Json(TwoFactorSetup {
        secret,
        otpauth_url,
    }))
}

/// 2단계 인증 코드 검증.
///
/// 일치하면 200 `{valid: true}`, 아니면 401 `{valid: false}`.
pub async fn verify_two_factor(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    ValidatedJson(req): ValidatedJson<VerifyTwoFactorRequest>,
) -> ApiResult<impl IntoResponse> {
    let Some(ref secret) = account.two_factor_secret else {
        return Err(ApiError::bad_request(
            "Two-factor authentication is not enabled",
        ));
    };

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let valid = verify_totp(secret, &req.code, now, &state.totp)?;
    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(TwoFactorResult { valid })))
}

// ==================== 헬퍼 ====================

async fn find_user(state: &AppState, id: &AccountId) -> ApiResult<Account> {
    state
        .store
        .find_account(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

fn email_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::Conflict("Email already in use".to_string()),
        other => other.into(),
    }
}

/// 계정 라우터 생성.
pub fn users_router(state: &AppState) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/", post(register))
        .route("/login", post(login));

    let admin = gated(
        Router::new().route("/", get(list_users)).route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        ),
        state,
        ADMINS,
    );

    let members = gated(
        Router::new().route("/{id}/profile", get(get_profile)),
        state,
        MEMBERS,
    );

    let any = gated(
        Router::new()
            .route("/me", get(me))
            .route("/me/2fa/enable", post(enable_two_factor))
            .route("/me/2fa/verify", post(verify_two_factor)),
        state,
        ANY_ROLE,
    );

    public.merge(admin).merge(members).merge(any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use freelance_core::AccountStore;

    async fn seed_admin(state: &AppState) -> Account {
        let account = Account::new(NewAccount {
            email: "root@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            name: "Root".to_string(),
            business_name: None,
            business_type: None,
            skills: None,
        });
        state.store.insert_account(account).await.unwrap()
    }

    #[tokio::test]
    async fn test_enable_two_factor_keeps_role_revoked_mid_request() {
        let state = Arc::new(create_test_state());
        // 게이트를 통과한 시점의 사본
        let snapshot = seed_admin(&state).await;

        let demote = AccountChange::Admin(AccountUpdate {
            role: Some(Role::Client),
            ..Default::default()
        });
        state
            .store
            .modify_account(&snapshot.id, demote)
            .await
            .unwrap();

        enable_two_factor(State(state.clone()), CurrentAccount(snapshot.clone()))
            .await
            .unwrap();

        let stored = state.store.find_account(&snapshot.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Client);
        assert!(stored.two_factor_enabled());
    }

    #[tokio::test]
    async fn test_admin_update_rejects_taken_email() {
        let state = Arc::new(create_test_state());
        let admin = seed_admin(&state).await;
        let other = state
            .store
            .insert_account(Account::new(NewAccount {
                email: "lara@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Client,
                name: "Lara".to_string(),
                business_name: None,
                business_type: None,
                skills: None,
            }))
            .await
            .unwrap();

        let update = AccountUpdate {
            email: Some("ROOT@example.com".to_string()),
            ..Default::default()
        };
        let err = update_user(
            State(state.clone()),
            CurrentAccount(admin),
            Path(other.id.to_string()),
            JsonBody(update),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "Email already in use"));
    }
}
