use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;
use super::poem::Poem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub user_id: RecordId,
    pub poem_id: RecordId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded poem (with its author) when selected
    #[serde(default, rename = "poems", skip_serializing_if = "Option::is_none")]
    pub poem: Option<Poem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFavorite {
    pub user_id: RecordId,
    pub poem_id: RecordId,
}
