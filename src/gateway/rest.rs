use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::{read_json, DataGateway};
use crate::config::RestConfig;
use crate::error::GatewayError;
use crate::models::{
    AuthResponse, Author, AuthorFilters, Comment, Favorite, Poem, PoemFilters, ProfileFields, RecordId, Session, User,
};
use crate::storage::{usable_token, TokenStore};

/// Gateway for the self-hosted REST API.
///
/// The bearer token is read from persistent storage on every request. A 401
/// evicts it and comes back as [`GatewayError::Unauthorized`]; deciding where
/// to send the user is left to the caller.
pub struct RestGateway {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    token_key: String,
}

/// Body of `/auth/login` and `/auth/register`
#[derive(Debug, Deserialize)]
struct RestAuthBody {
    #[serde(default)]
    user: Option<User>,
    #[serde(default, alias = "access_token")]
    token: Option<String>,
}

impl RestGateway {
    pub fn new(config: &RestConfig, tokens: Arc<dyn TokenStore>, token_key: impl Into<String>) -> Result<Self, GatewayError> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            token_key: token_key.into(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.tokens.get(&self.token_key).filter(|t| !t.is_empty()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.tokens.remove(&self.token_key) {
                tracing::error!("Failed to evict rejected token: {}", e);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::unauthorized(GatewayError::from_body(401, &body).to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_body(status.as_u16(), &body));
        }

        let body: Value = read_json(response).await?;
        Ok(serde_json::from_value(unwrap_envelope(body))?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, GatewayError> {
        let url = self.url(path, query)?;
        tracing::debug!("GET {}", url);
        self.send(self.request(Method::GET, url)).await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>, GatewayError> {
        let rows: Option<Vec<T>> = self.get(path, query).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn call<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value, GatewayError> {
        let url = self.url(path, &[])?;
        tracing::debug!("{} {}", method, url);
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    async fn authenticate(&self, path: &str, body: Value) -> Result<AuthResponse, GatewayError> {
        let body: RestAuthBody = serde_json::from_value(self.call(Method::POST, path, Some(&body)).await?)?;

        if let Some(token) = &body.token {
            self.tokens.set(&self.token_key, token)?;
        }
        let session = body.token.map(|token| Session {
            user: body.user.clone(),
            ..Session::bearer(token)
        });
        Ok(AuthResponse { user: body.user, session })
    }

    /// `PUT /user/profile`
    pub async fn update_profile(&self, profile: &ProfileFields) -> Result<User, GatewayError> {
        let body = self.call(Method::PUT, "/user/profile", Some(profile)).await?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Accept both bare payloads and `{"success": true, "data": ...}` envelopes
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("success").map_or(false, Value::is_boolean) && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn poem_query(filters: &PoemFilters) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(dynasty) = &filters.dynasty {
        query.push(("dynasty", dynasty.clone()));
    }
    if let Some(kind) = &filters.kind {
        query.push(("type", kind.clone()));
    }
    if let Some(author) = &filters.author {
        query.push(("author", author.to_string()));
    }
    query
}

#[async_trait]
impl DataGateway for RestGateway {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn sign_up(&self, email: &str, password: &str, profile: &ProfileFields) -> Result<AuthResponse, GatewayError> {
        let mut body = json!({ "email": email, "password": password });
        if let (Value::Object(map), Value::Object(extra)) = (&mut body, serde_json::to_value(profile)?) {
            map.extend(extra);
        }
        self.authenticate("/auth/register", body).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        self.authenticate("/auth/login", json!({ "email": email, "password": password })).await
    }

    // The API keeps no server-side session; forgetting the token is the whole sign-out
    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.tokens.remove(&self.token_key)?;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        if usable_token(self.tokens.as_ref(), &self.token_key).is_none() {
            return Ok(None);
        }
        self.get("/user/profile", &[]).await
    }

    async fn get_poems(&self, filters: &PoemFilters) -> Result<Vec<Poem>, GatewayError> {
        self.list("/poems", &poem_query(filters)).await
    }

    async fn get_poem(&self, id: &RecordId) -> Result<Poem, GatewayError> {
        self.get(&format!("/poems/{}", id), &[]).await
    }

    async fn search_poems(&self, query: &str) -> Result<Vec<Poem>, GatewayError> {
        self.list("/poems/search", &[("q", query.to_string())]).await
    }

    async fn favorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError> {
        self.call::<Value>(Method::POST, &format!("/poems/{}/favorite", poem_id), None).await?;
        Ok(())
    }

    async fn unfavorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError> {
        self.call::<Value>(Method::DELETE, &format!("/poems/{}/favorite", poem_id), None).await?;
        Ok(())
    }

    async fn get_user_favorites(&self) -> Result<Vec<Favorite>, GatewayError> {
        self.list("/user/favorites", &[]).await
    }

    async fn get_authors(&self, filters: &AuthorFilters) -> Result<Vec<Author>, GatewayError> {
        let query: Vec<(&str, String)> = filters.dynasty.iter().map(|d| ("dynasty", d.clone())).collect();
        self.list("/authors", &query).await
    }

    async fn get_author(&self, id: &RecordId) -> Result<Author, GatewayError> {
        self.get(&format!("/authors/{}", id), &[]).await
    }

    async fn get_author_works(&self, author_id: &RecordId) -> Result<Vec<Poem>, GatewayError> {
        self.list(&format!("/authors/{}/works", author_id), &[]).await
    }

    async fn get_poem_comments(&self, _poem_id: &RecordId) -> Result<Vec<Comment>, GatewayError> {
        Err(GatewayError::Unsupported("comments"))
    }

    async fn create_comment(
        &self,
        _poem_id: &RecordId,
        _content: &str,
        _parent_id: Option<&RecordId>,
    ) -> Result<Vec<Comment>, GatewayError> {
        Err(GatewayError::Unsupported("comments"))
    }

    async fn like_comment(&self, _comment_id: &RecordId) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported("comments"))
    }
}
