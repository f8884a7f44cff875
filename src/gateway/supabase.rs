use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use url::Url;

use super::{check_status, read_json, AuthChange, DataGateway};
use crate::config::BackendConfig;
use crate::error::GatewayError;
use crate::filter::{Filter, SortDirection};
use crate::models::{
    AuthResponse, Author, AuthorFilters, Comment, Favorite, NewComment, NewFavorite, Poem, PoemFilters, ProfileFields,
    ProfileRow, RecordId, Session, User,
};

const POEMS_WITH_AUTHOR: &str = "*, authors (*)";
const POEM_DETAIL: &str = "*, authors (*), comments (*)";
const COMMENTS_WITH_USER: &str = "*, users (username, avatar_url)";
const FAVORITES_WITH_POEM: &str = "*, poems (*, authors (*))";
const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

/// GoTrue's message for sign-ins against an unconfirmed address
const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";

/// Gateway for the hosted backend: GoTrue under `/auth/v1`, PostgREST under `/rest/v1`.
///
/// Holds the current session in memory, the way the hosted client library does,
/// and uses its access token as the bearer for row requests.
pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    site_url: Option<String>,
    session: RwLock<Option<Session>>,
    auth_events: broadcast::Sender<AuthChange>,
}

impl SupabaseGateway {
    pub fn new(config: &BackendConfig) -> Result<Self, GatewayError> {
        // Validate early so a typo surfaces before the first request
        Url::parse(&config.supabase_url)?;

        let client = Client::builder().build()?;
        let (auth_events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            site_url: config.site_url.clone(),
            session: RwLock::new(None),
            auth_events,
        })
    }

    /// Resume with an access token persisted by an earlier run
    pub fn restore_session(&self, access_token: Option<String>) {
        let restored = access_token.map(Session::bearer);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = restored;
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Receive sign-in / sign-out transitions from this point on
    pub fn subscribe_auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.auth_events.subscribe()
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn set_session(&self, session: Option<Session>, user: Option<User>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        let change = match session {
            Some(session) => AuthChange::SignedIn { user, session },
            None => AuthChange::SignedOut,
        };
        // No subscribers is fine
        let _ = self.auth_events.send(change);
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn auth_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}/auth/v1/{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn rest_url(&self, table: &str, pairs: &[(String, String)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// GET for a row query; single-object filters ask PostgREST for an object instead of an array
    fn select_request(&self, filter: &Filter) -> Result<RequestBuilder, GatewayError> {
        let params = filter.to_params()?;
        let url = self.rest_url(filter.table(), &params.pairs)?;

        let request = self.request(Method::GET, url.clone());
        if params.single {
            tracing::debug!("GET {} (single)", url);
            Ok(request.header(ACCEPT, PGRST_OBJECT))
        } else {
            tracing::debug!("GET {}", url);
            Ok(request)
        }
    }

    async fn select_list<T: DeserializeOwned>(&self, filter: Filter) -> Result<Vec<T>, GatewayError> {
        let response = check_status(self.select_request(&filter)?.send().await?).await?;
        let rows: Option<Vec<T>> = read_json(response).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn select_one<T: DeserializeOwned>(&self, filter: Filter) -> Result<T, GatewayError> {
        let response = self.select_request(&filter.single())?.send().await?;
        match check_status(response).await {
            Ok(response) => read_json(response).await,
            // PostgREST answers 406 when a single-object query matches no row
            Err(GatewayError::Remote { status: 406, message }) => Err(GatewayError::not_found(message)),
            Err(e) => Err(e),
        }
    }

    async fn insert<B: Serialize + ?Sized>(&self, table: &str, body: &B, returning: bool) -> Result<Value, GatewayError> {
        let url = self.rest_url(table, &[])?;
        let prefer = if returning { "return=representation" } else { "return=minimal" };
        tracing::debug!("POST {} ({})", url, prefer);

        let response = self
            .request(Method::POST, url)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        read_json(check_status(response).await?).await
    }

    async fn update<B: Serialize + ?Sized>(&self, filter: Filter, body: &B) -> Result<(), GatewayError> {
        let params = filter.to_params()?;
        let url = self.rest_url(filter.table(), &params.pairs)?;
        tracing::debug!("PATCH {}", url);

        check_status(self.request(Method::PATCH, url).json(body).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, filter: Filter) -> Result<(), GatewayError> {
        let params = filter.to_params()?;
        let url = self.rest_url(filter.table(), &params.pairs)?;
        tracing::debug!("DELETE {}", url);

        check_status(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    /// Mutations never trust a cached principal: ask the auth service every time.
    /// A token the auth service rejects counts as no user at all.
    async fn require_user(&self) -> Result<User, GatewayError> {
        match self.current_user().await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(GatewayError::Unauthenticated),
            Err(GatewayError::Remote { status: 401 | 403, message }) => {
                tracing::debug!("Stored session rejected by the auth service: {}", message);
                Err(GatewayError::Unauthenticated)
            }
            Err(e) => Err(e),
        }
    }

    async fn auth_call(&self, url: Url, body: Value) -> Result<AuthResponse, GatewayError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await?;
        let body: Value = read_json(check_status(response).await?).await?;
        Ok(AuthResponse::from_gotrue(body)?)
    }
}

#[async_trait]
impl DataGateway for SupabaseGateway {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn sign_up(&self, email: &str, password: &str, profile: &ProfileFields) -> Result<AuthResponse, GatewayError> {
        let query: Vec<(&str, &str)> = self.site_url.as_deref().map(|s| ("redirect_to", s)).into_iter().collect();
        let url = self.auth_url("signup", &query)?;
        let body = json!({ "email": email, "password": password, "data": profile });

        let response = self.auth_call(url, body).await?;

        if let Some(session) = response.session.clone() {
            self.set_session(Some(session), response.user.clone());
        }

        // The profile row is a courtesy: a failure here does not undo the sign-up
        if let Some(user) = &response.user {
            let row = ProfileRow::for_sign_up(user, email, profile);
            if let Err(e) = self.insert("users", &row, false).await {
                tracing::error!("Failed to create user record for {}: {}", email, e);
            }
        }

        tracing::info!("Sign-up succeeded for {}; check the inbox to confirm the account", email);
        Ok(response)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let url = self.auth_url("token", &[("grant_type", "password")])?;
        let body = json!({ "email": email, "password": password });

        let response = match self.auth_call(url, body).await {
            Ok(response) => response,
            Err(e) => {
                if e.to_string() == EMAIL_NOT_CONFIRMED {
                    tracing::warn!("Email for {} is not confirmed; check the inbox and confirm the account", email);
                }
                return Err(e);
            }
        };

        if let Some(session) = response.session.clone() {
            self.set_session(Some(session), response.user.clone());
        }
        Ok(response)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let result = match self.access_token() {
            Some(token) => {
                let url = self.auth_url("logout", &[])?;
                let response = self
                    .client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(token)
                    .send()
                    .await;
                match response {
                    Ok(response) => check_status(response).await.map(|_| ()),
                    Err(e) => Err(e.into()),
                }
            }
            None => Ok(()),
        };

        self.set_session(None, None);
        result
    }

    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        let url = self.auth_url("user", &[])?;
        let response = self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let user: User = read_json(check_status(response).await?).await?;
        Ok(Some(user))
    }

    async fn get_poems(&self, filters: &PoemFilters) -> Result<Vec<Poem>, GatewayError> {
        let mut filter = Filter::new("poems")?.select(POEMS_WITH_AUTHOR)?;
        if let Some(dynasty) = &filters.dynasty {
            filter = filter.eq("dynasty", dynasty.as_str())?;
        }
        if let Some(kind) = &filters.kind {
            filter = filter.eq("type", kind.as_str())?;
        }
        if let Some(author) = &filters.author {
            filter = filter.eq("author_id", author)?;
        }
        let filter = filter.order("created_at", SortDirection::Desc)?;
        self.select_list(filter).await
    }

    async fn get_poem(&self, id: &RecordId) -> Result<Poem, GatewayError> {
        let filter = Filter::new("poems")?.select(POEM_DETAIL)?.eq("id", id)?;
        self.select_one(filter).await
    }

    async fn search_poems(&self, query: &str) -> Result<Vec<Poem>, GatewayError> {
        let filter = Filter::new("poems")?
            .select(POEMS_WITH_AUTHOR)?
            .ilike_any(&["title", "content"], query)?;
        self.select_list(filter).await
    }

    async fn favorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError> {
        let user = self.require_user().await?;
        let row = NewFavorite { user_id: user.id, poem_id: poem_id.clone() };
        self.insert("favorites", &row, false).await?;
        Ok(())
    }

    async fn unfavorite_poem(&self, poem_id: &RecordId) -> Result<(), GatewayError> {
        let user = self.require_user().await?;
        let filter = Filter::new("favorites")?.eq("user_id", &user.id)?.eq("poem_id", poem_id)?;
        self.delete(filter).await
    }

    async fn get_user_favorites(&self) -> Result<Vec<Favorite>, GatewayError> {
        let user = self.require_user().await?;
        let filter = Filter::new("favorites")?.select(FAVORITES_WITH_POEM)?.eq("user_id", &user.id)?;
        self.select_list(filter).await
    }

    async fn get_authors(&self, filters: &AuthorFilters) -> Result<Vec<Author>, GatewayError> {
        let mut filter = Filter::new("authors")?.select("*")?;
        if let Some(dynasty) = &filters.dynasty {
            filter = filter.eq("dynasty", dynasty.as_str())?;
        }
        let filter = filter.order("name", SortDirection::Asc)?;
        self.select_list(filter).await
    }

    async fn get_author(&self, id: &RecordId) -> Result<Author, GatewayError> {
        let filter = Filter::new("authors")?.select("*")?.eq("id", id)?;
        self.select_one(filter).await
    }

    async fn get_author_works(&self, author_id: &RecordId) -> Result<Vec<Poem>, GatewayError> {
        let filter = Filter::new("poems")?
            .select("*")?
            .eq("author_id", author_id)?
            .order("created_at", SortDirection::Desc)?;
        self.select_list(filter).await
    }

    async fn get_poem_comments(&self, poem_id: &RecordId) -> Result<Vec<Comment>, GatewayError> {
        let filter = Filter::new("comments")?
            .select(COMMENTS_WITH_USER)?
            .eq("poem_id", poem_id)?
            .is_null("parent_id")?
            .order("created_at", SortDirection::Desc)?;
        self.select_list(filter).await
    }

    async fn create_comment(
        &self,
        poem_id: &RecordId,
        content: &str,
        parent_id: Option<&RecordId>,
    ) -> Result<Vec<Comment>, GatewayError> {
        let user = self.require_user().await?;
        let row = NewComment {
            poem_id: poem_id.clone(),
            user_id: user.id,
            content: content.to_string(),
            parent_id: parent_id.cloned(),
        };
        let created = self.insert("comments", &row, true).await?;
        if created.is_null() {
            return Ok(vec![]);
        }
        Ok(serde_json::from_value(created)?)
    }

    // Read then write: two concurrent likes can lose one increment
    async fn like_comment(&self, comment_id: &RecordId) -> Result<(), GatewayError> {
        let current: Value = self
            .select_one(Filter::new("comments")?.select("likes_count")?.eq("id", comment_id)?)
            .await?;
        let likes = current.get("likes_count").and_then(Value::as_i64).unwrap_or(0);

        let filter = Filter::new("comments")?.eq("id", comment_id)?;
        self.update(filter, &json!({ "likes_count": likes + 1 })).await
    }
}
