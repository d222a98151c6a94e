//! 청구 기록 endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use freelance_core::{BillingRecord, NewBillingRecord, StoreError};
use tracing::info;

use super::notifications::notify;
use crate::auth::{gated, CurrentAccount, ADMINS, ANY_ROLE};
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::state::AppState;

/// 내 청구 기록 (최신 순).
pub async fn list_billing(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<Vec<BillingRecord>>> {
    Ok(Json(state.store.billing_for_account(&account.id).await?))
}

/// 청구서 등록 (admin). 청구서 번호는 유일해야 합니다.
pub async fn create_billing(
    State(state): State<Arc<AppState>>,
    CurrentAccount(admin): CurrentAccount,
    JsonBody(input): JsonBody<NewBillingRecord>,
) -> ApiResult<impl IntoResponse> {
    if state.store.find_account(&input.account_id).await?.is_none() {
        return Err(ApiError::not_found("Account not found"));
    }
    if state.store.find_project(input.project_id).await?.is_none() {
        return Err(ApiError::not_found("Project not found"));
    }

    let record = BillingRecord::new(input)?;
    let record = state
        .store
        .insert_billing(record)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict("Invoice number already exists".to_string()),
            other => other.into(),
        })?;

    notify(
        state.store.as_ref(),
        "invoice",
        &record.account_id,
        &format!(
            "New invoice {} for {} ({})",
            record.invoice_number,
            record.amount,
            record.method.as_str()
        ),
    )
    .await;

    info!(
        billing_id = %record.id,
        invoice = %record.invoice_number,
        account_id = %record.account_id,
        admin_id = %admin.id,
        "Invoice recorded"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// 청구 라우터 생성.
pub fn billing_router(state: &AppState) -> Router<Arc<AppState>> {
    let own = gated(Router::new().route("/", get(list_billing)), state, ANY_ROLE);
    let admin = gated(
        Router::new().route("/", post(create_billing)),
        state,
        ADMINS,
    );
    own.merge(admin)
}
