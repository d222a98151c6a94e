//! 프리랜서 마켓플레이스 API 서버 진입점.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use freelance_core::{init_logging, AppConfig, MemoryStore, ServerConfig, Store};
use freelance_api::metrics::setup_metrics_recorder;
use freelance_api::middleware::metrics_layer;
use freelance_api::routes::create_api_router;
use freelance_api::state::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// CORS 레이어 설정.
///
/// `CORS_ORIGINS` 환경변수에 쉼표로 구분된 origin 목록을 지정하면 해당 origin만 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
}

/// Prometheus 메트릭 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
    server: &ServerConfig,
) -> Router {
    let api_router = create_api_router(&state).with_state(state);

    let router = match metrics_handle {
        Some(handle) => Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle)
            .merge(api_router),
        None => api_router,
    };

    router
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer())
}

/// 설정에 따라 저장소 생성.
///
/// `postgres` feature가 켜져 있고 `database.url`이 설정되어 있으면 PostgreSQL을,
/// 그렇지 않으면 인메모리 저장소를 사용합니다.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    #[cfg(feature = "postgres")]
    if config.database.url.is_some() {
        let store = freelance_core::PgStore::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        info!("Using PostgreSQL store");
        return Ok(Arc::new(store));
    }

    if config.database.url.is_some() {
        warn!("database.url is set but the server was built without the `postgres` feature");
    }
    warn!("Using in-memory store; data is lost on restart");
    Ok(Arc::new(MemoryStore::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("Starting freelance marketplace API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            Some(handle)
        }
        Err(e) => {
            error!(error = %e, "Failed to install metrics recorder, /metrics disabled");
            None
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다. FREELANCE__SERVER__HOST, FREELANCE__SERVER__PORT 환경변수를 확인하세요."
            );
            e
        })?;

    if config.auth.jwt_secret.is_none() {
        warn!("auth.jwt_secret not set, using development secret (INSECURE for development only)");
    }

    let store = build_store(&config).await?;
    let state = Arc::new(AppState::new(store, &config.auth));

    let app = create_router(state, metrics_handle, &config.server);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let shutdown_token = CancellationToken::new();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
