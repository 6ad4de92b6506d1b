use crate::error::TrainingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A trainee's rating of the training experience. Validated on creation and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub rating: u8,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Validates the rating and builds the record. `None` models a submission
    /// that omitted the rating entirely.
    pub fn new(
        user_id: impl Into<String>,
        rating: Option<i64>,
        comment: impl Into<String>,
        session_id: Option<Uuid>,
    ) -> Result<Self, TrainingError> {
        let rating = rating.ok_or(TrainingError::MissingRating)?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(TrainingError::InvalidRating(rating));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            session_id,
            rating: rating as u8,
            comment: comment.into(),
            timestamp: Utc::now(),
        })
    }
}
