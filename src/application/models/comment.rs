use crate::application::models::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment together with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub owner_id: Uuid,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentCreate {
    pub content: String,
}

impl CommentCreate {
    /// Trimmed comment body, or `None` when there is nothing to post.
    pub fn new(content: &str) -> Option<Self> {
        let content = content.trim();
        (!content.is_empty()).then(|| Self {
            content: content.to_string(),
        })
    }
}
