use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::author::Author;
use super::comment::Comment;
use super::id::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poem {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: Option<RecordId>,
    #[serde(default)]
    pub dynasty: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded author when the query selected `authors (*)`
    #[serde(default, rename = "authors", skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    // Columns this client does not model (annotation, translation, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Poem {
    pub fn new(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            author_id: None,
            dynasty: None,
            kind: None,
            created_at: None,
            updated_at: None,
            author: None,
            comments: None,
            extra: Map::new(),
        }
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.name.as_str())
    }
}

/// Optional listing filters; absent entries are not applied, present ones are ANDed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoemFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynasty: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<RecordId>,
}

impl PoemFilters {
    pub fn is_empty(&self) -> bool {
        self.dynasty.is_none() && self.kind.is_none() && self.author.is_none()
    }
}
