//! 요청 본문과 쿼리 추출기.
//!
//! axum 기본 추출기의 거부 응답을 [`ApiError`]로 변환하여
//! 모든 에러가 `{"message": ...}` 형식을 따르도록 합니다.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// JSON 본문 추출기.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// JSON 본문을 추출하고 `validator` 규칙으로 검증.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// 쿼리 문자열 추출기.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// 경로의 UUID 파싱. 형식이 맞지 않으면 해당 리소스가 없는 것으로 응답합니다.
pub fn parse_uuid(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(not_found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[validate(email(message = "Please provide a valid email address"))]
        email: String,
    }

    async fn signup(ValidatedJson(body): ValidatedJson<Signup>) -> impl IntoResponse {
        body.email
    }

    async fn call(body: &str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/", post(signup));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, json) = call("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_validation_failure_lists_errors() {
        let (status, json) = call(r#"{"email":"nope"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0], "Please provide a valid email address");
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let (status, _) = call(r#"{"email":"lara@example.com"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_parse_uuid() {
        assert!(parse_uuid("not-a-uuid", "Project not found").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "x").unwrap(), id);
    }
}
