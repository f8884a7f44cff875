//! Remote data access.
//!
//! [`DataGateway`] is the one capability the session store depends on. Two
//! backends implement it: [`SupabaseGateway`] for the hosted
//! backend-as-a-service, and [`RestGateway`] for the older self-hosted REST
//! API. A deployment picks one (see [`crate::config::BackendKind`]).

pub mod rest;
pub mod supabase;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::{
    AuthResponse, Author, AuthorFilters, Comment, Favorite, Poem, PoemFilters, ProfileFields, RecordId, Session, User,
};

pub use rest::RestGateway;
pub use supabase::SupabaseGateway;

/// Auth-state transitions broadcast by gateways that track a session
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn { user: Option<User>, session: Session },
    SignedOut,
}

#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    // Authentication
    async fn sign_up(&self, email: &str, password: &str, profile: &ProfileFields) -> Result<AuthResponse, GatewayError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError>;
    async fn sign_out(&self) -> Result<(), GatewayError>;
    async fn current_user(&self) -> Result<Option<User>, GatewayError>;

    // Poems
    async fn get_poems(&self, filters: &PoemFilters) -> Result<Vec<Poem>, GatewayError>;
    async fn get_poem(&self, id: &RecordId) -> Result<Poem, GatewayError>;
    async fn search_poems(&self, query: &str) -> Result<Vec<Poem>, GatewayError>;

    // Favorites
    async fn favorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError>;
    async fn unfavorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError>;
    async fn get_user_favorites(&self) -> Result<Vec<Favorite>, GatewayError>;

    // Authors
    async fn get_authors(&self, filters: &AuthorFilters) -> Result<Vec<Author>, GatewayError>;
    async fn get_author(&self, id: &RecordId) -> Result<Author, GatewayError>;
    async fn get_author_works(&self, author_id: &RecordId) -> Result<Vec<Poem>, GatewayError>;

    // Comments
    async fn get_poem_comments(&self, poem_id: &RecordId) -> Result<Vec<Comment>, GatewayError>;
    async fn create_comment(
        &self,
        poem_id: &RecordId,
        content: &str,
        parent_id: Option<&RecordId>,
    ) -> Result<Vec<Comment>, GatewayError>;
    async fn like_comment(&self, comment_id: &RecordId) -> Result<(), GatewayError>;
}

/// Check the status and decode a JSON body; empty bodies decode as `null`
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let text = response.text().await?;
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    Ok(serde_json::from_value(value)?)
}

/// Turn a non-success response into a [`GatewayError`], passing successes through
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::from_body(status.as_u16(), &body))
}
