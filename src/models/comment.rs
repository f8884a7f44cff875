use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub poem_id: RecordId,
    #[serde(default)]
    pub user_id: Option<RecordId>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<RecordId>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "users", skip_serializing_if = "Option::is_none")]
    pub user: Option<CommentAuthor>,
}

/// The slice of the commenter's profile embedded in comment listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub poem_id: RecordId,
    pub user_id: RecordId,
    pub content: String,
    pub parent_id: Option<RecordId>,
}
