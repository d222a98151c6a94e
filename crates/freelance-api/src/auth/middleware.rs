//! Role Gate와 Identity Loader 미들웨어.
//!
//! 보호된 요청은 다음 단계를 차례로 통과합니다:
//!
//! ```text
//! Received -> Authenticated -> Authorized -> Identified -> Handled
//!          \-> Rejected (어느 단계에서든 종료)
//! ```
//!
//! - [`role_gate`]: 헤더 추출, 토큰 검증, 역할 확인 후 [`Claims`]를 요청에 첨부
//! - [`load_identity`]: Claims를 저장된 계정으로 교체하고 현재 역할과 비교
//!
//! 두 미들웨어 중 하나라도 거부하면 도메인 핸들러는 호출되지 않습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::Response,
    Router,
};
use freelance_core::{Account, Store, StoreError};
use tracing::{debug, error, warn};

use super::error::AuthError;
use super::jwt::{Claims, TokenVerifier};
use super::roles::RoleSet;
use crate::metrics::record_auth_rejection;
use crate::state::AppState;

/// 요청이 도달한 게이트 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Received,
    Authenticated,
    Authorized,
    Identified,
    Handled,
}

impl GateStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GateStage::Received => "received",
            GateStage::Authenticated => "authenticated",
            GateStage::Authorized => "authorized",
            GateStage::Identified => "identified",
            GateStage::Handled => "handled",
        }
    }
}

impl std::fmt::Display for GateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 거부 기록 후 에러 반환.
fn reject(stage: GateStage, err: AuthError) -> AuthError {
    warn!(stage = %stage, reason = err.reason(), "Request rejected by auth gate");
    record_auth_rejection(err.reason(), stage.as_str());
    err
}

/// `Authorization` 헤더에서 bearer 토큰 추출.
///
/// 헤더가 없으면 `MissingToken`, 형식이 `Bearer <token>`이 아니면 `InvalidToken`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::InvalidToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

// ==================== Role Gate ====================

/// Role Gate 상태. 라우트 그룹마다 허용 역할 집합을 가집니다.
#[derive(Clone)]
pub struct RoleGate {
    verifier: Arc<TokenVerifier>,
    allowed: RoleSet,
}

impl RoleGate {
    pub fn new(verifier: Arc<TokenVerifier>, allowed: RoleSet) -> Self {
        Self { verifier, allowed }
    }

    pub fn allowed(&self) -> RoleSet {
        self.allowed
    }

    /// 헤더 검사부터 역할 확인까지 수행하고 검증된 Claims 반환.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let raw = bearer_token(headers).map_err(|e| reject(GateStage::Received, e))?;
        let claims = self
            .verifier
            .verify(raw)
            .map_err(|e| reject(GateStage::Received, e.into()))?;

        if !self.allowed.contains(claims.role) {
            debug!(
                account_id = %claims.sub,
                role = %claims.role,
                allowed = %self.allowed,
                "Role not permitted for route"
            );
            return Err(reject(GateStage::Authenticated, AuthError::Forbidden));
        }
        Ok(claims)
    }
}

/// Role Gate 미들웨어.
///
/// `from_fn_with_state`로 장착합니다. 통과하면 [`Claims`]가 요청 확장에 첨부됩니다.
pub async fn role_gate(
    State(gate): State<RoleGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = gate.authorize(request.headers())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// ==================== Identity Loader ====================

/// 인증된 요청의 현재 계정.
///
/// Identity Loader를 통과한 라우트에서만 추출할 수 있습니다.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

impl CurrentAccount {
    pub fn into_inner(self) -> Account {
        self.0
    }
}

impl std::ops::Deref for CurrentAccount {
    type Target = Account;

    fn deref(&self) -> &Account {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Identity Loader 상태.
#[derive(Clone)]
pub struct IdentityLoader {
    store: Arc<dyn Store>,
}

impl IdentityLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Claims의 주체를 저장소에서 조회하여 계정 반환.
    ///
    /// 저장된 현재 역할이 토큰의 역할과 다르면 `RoleMismatch`입니다.
    /// 저장소 장애는 재시도하지 않습니다.
    pub async fn load(&self, claims: &Claims) -> Result<Account, AuthError> {
        let account = match self.store.find_account(&claims.account_id()).await {
            Ok(Some(account)) => account,
            Ok(None) | Err(StoreError::NotFound(_)) => {
                return Err(reject(GateStage::Authorized, AuthError::AccountNotFound));
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(error = %e, "Account store unavailable");
                } else {
                    error!(error = %e, "Account lookup failed");
                }
                return Err(reject(GateStage::Authorized, AuthError::StoreUnavailable));
            }
        };

        if account.role != claims.role {
            debug!(
                account_id = %account.id,
                token_role = %claims.role,
                stored_role = %account.role,
                "Stored role differs from token"
            );
            return Err(reject(GateStage::Authorized, AuthError::RoleMismatch));
        }
        Ok(account)
    }
}

/// Identity Loader 미들웨어.
///
/// 요청의 [`Claims`]를 제거하고 [`CurrentAccount`]로 교체합니다.
/// 반드시 [`role_gate`] 뒤에서 실행되어야 합니다.
pub async fn load_identity(
    State(loader): State<IdentityLoader>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(claims) = request.extensions_mut().remove::<Claims>() else {
        error!("Identity loader reached without verified claims");
        return Err(reject(GateStage::Received, AuthError::MissingToken));
    };

    let account = loader.load(&claims).await?;
    let account_id = account.id.clone();
    let role = account.role;
    debug!(account_id = %account_id, role = %role, stage = %GateStage::Identified, "Identity loaded");

    request.extensions_mut().insert(CurrentAccount(account));
    let response = next.run(request).await;

    debug!(
        account_id = %account_id,
        stage = %GateStage::Handled,
        status = response.status().as_u16(),
        "Request handled"
    );
    Ok(response)
}

// ==================== Router composition ====================

/// 라우터의 모든 라우트 앞에 Role Gate와 Identity Loader를 장착.
///
/// `route_layer`는 나중에 추가한 레이어가 바깥에 위치하므로
/// Identity Loader를 먼저, Role Gate를 나중에 추가합니다.
pub fn gated<S>(router: Router<S>, state: &AppState, roles: RoleSet) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let gate = RoleGate::new(state.verifier.clone(), roles);
    let loader = IdentityLoader::new(state.store.clone());

    router
        .route_layer(middleware::from_fn_with_state(loader, load_identity))
        .route_layer(middleware::from_fn_with_state(gate, role_gate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::{ADMINS, CLIENTS, MEMBERS};
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use freelance_core::{AccountId, NewAccount, Role};
    use tower::ServiceExt;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn seed(state: &AppState, id: &str, role: Role) -> String {
        let mut account = Account::new(NewAccount {
            email: format!("{}@example.com", id),
            password_hash: "hash".to_string(),
            role,
            name: id.to_string(),
            business_name: None,
            business_type: None,
            skills: None,
        });
        account.id = AccountId::new(id);
        state.store.insert_account(account).await.unwrap();
        state
            .issuer
            .issue_for(&AccountId::new(id), role)
            .unwrap()
            .access_token
    }

    async fn whoami(CurrentAccount(account): CurrentAccount) -> String {
        account.id.into_inner()
    }

    fn app(state: &AppState, roles: RoleSet) -> Router {
        gated(Router::new().route("/me", get(whoami)), state, roles)
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthError::InvalidToken));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::InvalidToken));
        assert_eq!(bearer_token(&headers("Bearer   ")), Err(AuthError::InvalidToken));
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
    }

    #[tokio::test]
    async fn test_gate_passes_identity_to_handler() {
        let state = create_test_state();
        let token = seed(&state, "u1", Role::Client).await;

        let response = app(&state, MEMBERS)
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"u1");
    }

    #[tokio::test]
    async fn test_forbidden_before_store_lookup() {
        let state = create_test_state();
        // 저장소에 없는 계정이어도 역할 검사에서 먼저 거부됨
        let token = state
            .issuer
            .issue_for(&AccountId::new("ghost"), Role::Freelancer)
            .unwrap()
            .access_token;

        let gate = RoleGate::new(state.verifier.clone(), CLIENTS);
        let result = gate.authorize(&headers(&format!("Bearer {}", token)));
        assert_eq!(result.unwrap_err(), AuthError::Forbidden);
    }

    #[tokio::test]
    async fn test_loader_detects_missing_account() {
        let state = create_test_state();
        let token = state
            .issuer
            .issue_for(&AccountId::new("ghost"), Role::Admin)
            .unwrap()
            .access_token;

        let response = app(&state, ADMINS)
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_account_requires_loader() {
        let (mut parts, _) = Request::builder()
            .uri("/me")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let result = CurrentAccount::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), AuthError::MissingToken);
    }
}
