//! 프리랜서 리뷰 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/reviews` - 리뷰 작성 (client)
//! - `GET /api/v1/reviews/freelancer/{id}` - 프리랜서가 받은 리뷰 (공개)
//! - `GET /api/v1/reviews/{id}` - 리뷰 조회 (공개)
//! - `PUT /api/v1/reviews/{id}` - 리뷰 수정 (작성자)
//! - `DELETE /api/v1/reviews/{id}` - 리뷰 삭제 (작성자 또는 admin)
//!
//! 리뷰가 생성/수정/삭제될 때마다 프리랜서의 평균 평점을 다시 계산합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use freelance_core::{
    average_rating, AccountChange, AccountId, ProjectFilter, Review, Role, StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::freelancers::find_freelancer;
use crate::auth::{gated, CurrentAccount, ADMINS, CLIENTS};
use crate::error::{ApiError, ApiResult};
use crate::extract::{parse_uuid, JsonBody};
use crate::state::AppState;

const REVIEW_NOT_FOUND: &str = "Review not found";

/// 리뷰 작성 요청. 누락 필드는 하나의 메시지로 보고합니다.
#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, alias = "freelancerId")]
    pub freelancer_id: Option<String>,
}

/// 리뷰 수정 요청.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// 리뷰 변경 응답.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub message: String,
    pub review: Review,
}

/// 리뷰 작성.
///
/// 작성자가 해당 프리랜서에게 배정한 프로젝트가 있어야 합니다.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    JsonBody(req): JsonBody<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(rating), Some(comment), Some(freelancer_id)) =
        (req.rating, req.comment, req.freelancer_id)
    else {
        return Err(ApiError::bad_request("Missing review details"));
    };

    let freelancer = find_freelancer(&state, &AccountId::new(freelancer_id.trim())).await?;

    let worked_together = ProjectFilter {
        client_id: Some(client.id.clone()),
        assigned_to: Some(freelancer.id.clone()),
        ..Default::default()
    };
    if state.store.count_projects(&worked_together).await? == 0 {
        return Err(ApiError::forbidden(
            "You must work with the freelancer before submitting a review",
        ));
    }

    let review = Review::new(client.id.clone(), freelancer.id.clone(), rating, &comment)?;
    let review = state.store.insert_review(review).await?;
    refresh_rating(&state, &review.freelancer_id).await?;

    info!(
        review_id = %review.id,
        reviewer_id = %client.id,
        freelancer_id = %review.freelancer_id,
        rating = review.rating,
        "Review created"
    );
    Ok((StatusCode::CREATED, Json(review)))
}

/// 프리랜서가 받은 리뷰 (최신 순).
pub async fn list_freelancer_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(
        state
            .store
            .reviews_for_freelancer(&AccountId::new(id))
            .await?,
    ))
}

/// 리뷰 조회.
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    Ok(Json(find_review(&state, &id).await?))
}

/// 리뷰 수정 (작성자만).
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    let mut review = find_review(&state, &id).await?;
    if review.reviewer_id != client.id {
        return Err(ApiError::forbidden("You can only edit your own reviews"));
    }

    review.revise(req.rating, req.comment.as_deref())?;
    let review = state.store.update_review(review).await?;
    refresh_rating(&state, &review.freelancer_id).await?;

    Ok(Json(ReviewResponse {
        message: "Review updated successfully".to_string(),
        review,
    }))
}

/// 리뷰 삭제 (작성자 또는 관리자).
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let review = find_review(&state, &id).await?;
    if account.role != Role::Admin && review.reviewer_id != account.id {
        return Err(ApiError::forbidden("You can only delete your own reviews"));
    }

    if !state.store.delete_review(review.id).await? {
        return Err(ApiError::not_found(REVIEW_NOT_FOUND));
    }
    refresh_rating(&state, &review.freelancer_id).await?;

    info!(review_id = %review.id, deleted_by = %account.id, "Review deleted");
    Ok(Json(serde_json::json!({ "message": "Review deleted successfully" })))
}

async fn find_review(state: &AppState, raw_id: &str) -> ApiResult<Review> {
    let id = parse_uuid(raw_id, REVIEW_NOT_FOUND)?;
    state
        .store
        .find_review(id)
        .await?
        .ok_or_else(|| ApiError::not_found(REVIEW_NOT_FOUND))
}

/// 프리랜서의 평균 평점 재계산.
async fn refresh_rating(state: &AppState, freelancer_id: &AccountId) -> ApiResult<()> {
    let reviews = state.store.reviews_for_freelancer(freelancer_id).await?;
    let change = AccountChange::AverageRating(average_rating(&reviews));
    match state.store.modify_account(freelancer_id, change).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound(_)) => {
            warn!(freelancer_id = %freelancer_id, "Reviewed account no longer exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// 리뷰 라우터 생성.
pub fn reviews_router(state: &AppState) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/freelancer/{id}", get(list_freelancer_reviews))
        .route("/{id}", get(get_review));

    let authors = gated(
        Router::new()
            .route("/", post(create_review))
            .route("/{id}", put(update_review)),
        state,
        CLIENTS,
    );

    let moderators = gated(
        Router::new().route("/{id}", delete(delete_review)),
        state,
        CLIENTS.union(ADMINS),
    );

    public.merge(authors).merge(moderators)
}
