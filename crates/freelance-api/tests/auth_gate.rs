//! 역할 게이트와 계정 로더 통합 테스트.
//!
//! 각 테스트는 호출 횟수를 세는 핸들러를 게이트 뒤에 두고,
//! 거부된 요청이 핸들러에 도달하지 않는지 확인합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use freelance_api::{gated, AppState, CurrentAccount, RoleSet, ADMINS, CLIENTS, MEMBERS};
use freelance_core::{Account, AccountId, AccountStore, AuthConfig, MemoryStore, NewAccount, Role};
use proptest::prelude::*;
use secrecy::SecretString;
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-with-enough-length";

struct Harness {
    store: Arc<MemoryStore>,
    state: AppState,
    calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthConfig {
            jwt_secret: Some(SecretString::from(SECRET.to_string())),
            ..Default::default()
        };
        let state = AppState::new(store.clone(), &auth);
        Self {
            store,
            state,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `/guarded`에 호출 횟수를 세는 핸들러를 단 라우터.
    fn app(&self, roles: RoleSet) -> Router {
        let calls = self.calls.clone();
        let handler = move |CurrentAccount(account): CurrentAccount| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                account.id.to_string()
            }
        };
        gated(Router::new().route("/guarded", get(handler)), &self.state, roles)
    }

    async fn seed(&self, id: &str, role: Role) {
        let mut account = Account::new(NewAccount {
            email: format!("{id}@example.com"),
            password_hash: "unused".to_string(),
            role,
            name: id.to_string(),
            business_name: None,
            business_type: None,
            skills: None,
        });
        account.id = AccountId::new(id);
        self.store.insert_account(account).await.unwrap();
    }

    fn token(&self, id: &str, role: Role) -> String {
        self.state
            .issuer
            .issue_for(&AccountId::new(id), role)
            .unwrap()
            .access_token
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn call(app: Router, authorization: Option<&str>) -> Response {
    let mut builder = Request::builder().uri("/guarded");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn message(response: Response) -> String {
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    json["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_missing_header_is_401_not_500() {
    let h = Harness::new();

    let response = call(h.app(CLIENTS), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(message(response).await, "Authorization token is required");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_malformed_header_is_invalid_token() {
    let h = Harness::new();

    for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "Bearer not.a.jwt"] {
        let response = call(h.app(CLIENTS), Some(value)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(message(response).await, "Invalid token");
    }
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_distinguished() {
    let h = Harness::new();
    h.seed("u1", Role::Client).await;

    let (token, _) = h
        .state
        .issuer
        .issue_at(&AccountId::new("u1"), Role::Client, Utc::now() - Duration::days(2))
        .unwrap();
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Token has expired");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let h = Harness::new();
    h.seed("u1", Role::Client).await;

    let other = freelance_api::TokenIssuer::new(
        &SecretString::from("some-other-secret-of-sufficient-length".to_string()),
        60,
    );
    let token = other
        .issue_for(&AccountId::new("u1"), Role::Client)
        .unwrap()
        .access_token;
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Invalid token");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_freelancer_on_client_route_is_forbidden() {
    let h = Harness::new();
    h.seed("f1", Role::Freelancer).await;

    let token = h.token("f1", Role::Freelancer);
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    assert_eq!(message(response).await, "Access denied");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_revoked_role_is_rejected_with_role_mismatch() {
    let h = Harness::new();
    // 토큰 발급 후 역할이 client에서 freelancer로 바뀐 계정
    h.seed("u1", Role::Freelancer).await;

    let token = h.token("u1", Role::Client);
    let response = call(h.app(MEMBERS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        message(response).await,
        "Account role has changed, please sign in again"
    );
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_deleted_account_is_401() {
    let h = Harness::new();

    let token = h.token("ghost", Role::Client);
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Account not found");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn test_client_reaches_handler_once_and_admin_route_stays_closed() {
    let h = Harness::new();
    h.seed("u1", Role::Client).await;
    let bearer = format!("Bearer {}", h.token("u1", Role::Client));

    let response = call(h.app(CLIENTS), Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "u1");
    assert_eq!(h.calls(), 1);

    let response = call(h.app(ADMINS), Some(&bearer)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.calls(), 1);
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let h = Harness::new();
    h.seed("u1", Role::Client).await;

    let token = h.token("u1", Role::Client);
    let response = call(h.app(CLIENTS), Some(&format!("bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.calls(), 1);
}

#[tokio::test]
async fn test_store_outage_is_retryable_503() {
    let h = Harness::new();
    h.seed("u1", Role::Client).await;
    let token = h.token("u1", Role::Client);

    h.store.set_available(false);
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    assert_eq!(h.calls(), 0);

    h.store.set_available(true);
    let response = call(h.app(CLIENTS), Some(&format!("Bearer {token}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejections_do_not_leak_secret_or_token() {
    let h = Harness::new();
    h.seed("f1", Role::Freelancer).await;
    let token = h.token("f1", Role::Freelancer);

    let (expired, _) = h
        .state
        .issuer
        .issue_at(&AccountId::new("f1"), Role::Freelancer, Utc::now() - Duration::days(3))
        .unwrap();

    for raw in [token.as_str(), expired.as_str(), "tampered.token.value"] {
        let response = call(h.app(CLIENTS), Some(&format!("Bearer {raw}"))).await;
        let body = body_text(response).await;
        assert!(!body.contains(SECRET));
        assert!(!body.contains(raw));
    }
}

proptest! {
    #[test]
    fn prop_verify_round_trips_and_is_idempotent(
        id in "[a-zA-Z0-9-]{1,36}",
        role in prop_oneof![Just(Role::Client), Just(Role::Freelancer), Just(Role::Admin)],
    ) {
        let h = Harness::new();
        let token = h.token(&id, role);

        let first = h.state.verifier.verify(&token).unwrap();
        let second = h.state.verifier.verify(&token).unwrap();

        prop_assert_eq!(&first.sub, &id);
        prop_assert_eq!(first.role, role);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_garbage_never_verifies(raw in "\\PC{0,64}") {
        let h = Harness::new();
        prop_assert!(h.state.verifier.verify(&raw).is_err());
    }
}
