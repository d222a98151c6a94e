//! 프리랜서 리뷰.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;
use crate::error::{CoreError, CoreResult};

/// 최저 평점
pub const MIN_RATING: u8 = 1;
/// 최고 평점
pub const MAX_RATING: u8 = 5;

/// 리뷰 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    /// 1~5
    pub rating: u8,
    pub comment: String,
    /// 작성한 클라이언트
    pub reviewer_id: AccountId,
    /// 리뷰 대상 프리랜서
    pub freelancer_id: AccountId,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        reviewer_id: AccountId,
        freelancer_id: AccountId,
        rating: u8,
        comment: &str,
    ) -> CoreResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            rating: validate_rating(rating)?,
            comment: validate_comment(comment)?,
            reviewer_id,
            freelancer_id,
            created_at: Utc::now(),
        })
    }

    /// 평점/코멘트 수정.
    pub fn revise(&mut self, rating: Option<u8>, comment: Option<&str>) -> CoreResult<()> {
        if let Some(rating) = rating {
            self.rating = validate_rating(rating)?;
        }
        if let Some(comment) = comment {
            self.comment = validate_comment(comment)?;
        }
        Ok(())
    }
}

fn validate_rating(rating: u8) -> CoreResult<u8> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(rating)
}

fn validate_comment(comment: &str) -> CoreResult<String> {
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(CoreError::Validation("Comment is required".to_string()));
    }
    Ok(comment.to_string())
}

/// 평균 평점 계산. 리뷰가 없으면 0.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / reviews.len() as f64
}
