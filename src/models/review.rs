use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub place_id: ObjectId,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "The rating must be between 1 and 5."))]
    pub rating: u8,
    #[validate(length(max = 2000, message = "The comment may not be greater than 2000 characters."))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: String,
    pub user_id: String,
    pub place_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: review.user_id.to_hex(),
            place_id: review.place_id.to_hex(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}
