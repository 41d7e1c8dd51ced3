use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side like state of a post for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

impl LikeStatus {
    pub fn is_liked(self) -> bool {
        matches!(self, LikeStatus::Liked)
    }
}

impl From<bool> for LikeStatus {
    fn from(liked: bool) -> Self {
        if liked {
            LikeStatus::Liked
        } else {
            LikeStatus::Unliked
        }
    }
}

impl fmt::Display for LikeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeStatus::Liked => f.write_str("liked"),
            LikeStatus::Unliked => f.write_str("unliked"),
        }
    }
}

/// Body of `POST /posts/{id}/like`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(alias = "state")]
    pub status: LikeStatus,
}
