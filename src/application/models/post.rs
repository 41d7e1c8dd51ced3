use crate::application::models::comment::Comment;
use crate::application::models::user::User;
use crate::constants::DEFAULT_PAGE_SIZE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A post as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub user_has_liked: bool,
}

impl Post {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner_id == user.id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"id\":{},\"title\":{},\"likes_count\":{},\"user_has_liked\":{}}}",
            self.id,
            serde_json::Value::String(self.title.clone()),
            self.likes_count,
            self.user_has_liked
        )
    }
}

/// A single post with its author and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithDetails {
    #[serde(flatten)]
    pub post: Post,
    pub owner: User,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedPosts {
    pub total: u64,
    pub posts: Vec<Post>,
}

impl PaginatedPosts {
    /// Whether another page follows the one starting at `skip`.
    pub fn has_more(&self, skip: u32) -> bool {
        u64::from(skip) + (self.posts.len() as u64) < self.total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Partial update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Paging and search parameters for the feed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub skip: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

impl PostQuery {
    pub fn page(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Query for the page after this one.
    pub fn next(&self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            ..self.clone()
        }
    }

    pub fn to_path(&self) -> String {
        let mut path = format!("posts/?skip={}&limit={}", self.skip, self.limit);
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                path.push_str("&search=");
                path.push_str(&urlencoding::encode(search));
            }
        }
        path
    }
}
