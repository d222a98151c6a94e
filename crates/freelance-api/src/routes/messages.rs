//! 메시지 endpoint (client, freelancer).
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/messages` - 메시지 전송
//! - `GET /api/v1/messages?project_id=` - 내가 주고받은 메시지 (보낸 시각 순)
//! - `GET /api/v1/messages/{id}` - 메시지 조회 (수신자가 열면 읽음 처리)
//! - `DELETE /api/v1/messages/{id}` - 메시지 삭제 (송신자만)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use freelance_core::{AccountId, Message, MessageFilter, ProjectStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{gated, CurrentAccount, MEMBERS};
use crate::error::{ApiError, ApiResult};
use crate::extract::{parse_uuid, QueryParams, ValidatedJson};
use crate::state::AppState;

const MESSAGE_NOT_FOUND: &str = "Message not found";

/// 메시지 전송 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default, alias = "projectId")]
    pub project_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Receiver is required"))]
    pub receiver: String,
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
}

/// 메시지 목록 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default, alias = "projectId")]
    pub project_id: Option<Uuid>,
}

/// 메시지 전송 응답.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: String,
    pub data: Message,
}

/// 메시지 전송.
///
/// 완료된 프로젝트에 대한 메시지는 거부됩니다. 프로젝트 없는 직접 메시지는
/// 수신자가 허용한 경우에만 보낼 수 있습니다.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentAccount(sender): CurrentAccount,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let receiver_id = AccountId::new(req.receiver.trim());
    let Some(receiver) = state.store.find_account(&receiver_id).await? else {
        return Err(ApiError::bad_request("Invalid receiver"));
    };

    match req.project_id {
        Some(project_id) => {
            let project = state
                .store
                .find_project(project_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Project not found"))?;
            if project.status == ProjectStatus::Completed {
                return Err(ApiError::forbidden(
                    "Messaging for this project is now closed.",
                ));
            }
        }
        None if !receiver.privacy.allow_direct_messages => {
            return Err(ApiError::forbidden(
                "This user does not accept direct messages",
            ));
        }
        None => {}
    }

    let message = Message::new(sender.id.clone(), receiver.id, req.project_id, &req.content)?;
    let message = state.store.insert_message(message).await?;

    debug!(message_id = %message.id, sender_id = %sender.id, "Message sent");
    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: "Message sent successfully".to_string(),
            data: message,
        }),
    ))
}

/// 내가 주고받은 메시지.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    QueryParams(query): QueryParams<MessageQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let filter = MessageFilter {
        project_id: query.project_id,
        participant: Some(account.id),
        ..Default::default()
    };
    Ok(Json(state.store.list_messages(&filter).await?))
}

/// 메시지 조회. 참여자가 아니면 존재하지 않는 것으로 응답합니다.
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    let mut message = find_message(&state, &id).await?;
    if !message.is_participant(&account.id) {
        return Err(ApiError::not_found(MESSAGE_NOT_FOUND));
    }

    if message.receiver == account.id && !message.read {
        message.read = true;
        message = state.store.update_message(message).await?;
    }
    Ok(Json(message))
}

/// 메시지 삭제 (송신자만).
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let message = find_message(&state, &id).await?;
    if message.sender != account.id {
        return Err(ApiError::forbidden("You can only delete messages you sent"));
    }
    if !state.store.delete_message(message.id).await? {
        return Err(ApiError::not_found(MESSAGE_NOT_FOUND));
    }

    info!(message_id = %message.id, sender_id = %account.id, "Message deleted");
    Ok(Json(serde_json::json!({ "message": "Message deleted successfully" })))
}

async fn find_message(state: &AppState, raw_id: &str) -> ApiResult<Message> {
    let id = parse_uuid(raw_id, MESSAGE_NOT_FOUND)?;
    state
        .store
        .find_message(id)
        .await?
        .ok_or_else(|| ApiError::not_found(MESSAGE_NOT_FOUND))
}

/// 메시지 라우터 생성.
pub fn messages_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(
        Router::new()
            .route("/", get(list_messages).post(send_message))
            .route("/{id}", get(get_message).delete(delete_message)),
        state,
        MEMBERS,
    )
}
