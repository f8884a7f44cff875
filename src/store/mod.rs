//! Client-side session store.
//!
//! Holds the signed-in user, the session, and snapshots of remote lists.
//! Actions call the [`DataGateway`], then reduce the outcome into state
//! through [`Mutation`]s. No action returns an error or panics: failures come
//! back as [`ActionResult`]s, except `initialize_auth` and `logout`, which are
//! best-effort and report nothing.

pub mod getters;
pub mod result;
pub mod state;

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::GatewayError;
use crate::gateway::DataGateway;
use crate::models::{
    Author, AuthorFilters, Comment, Favorite, Poem, PoemFilters, ProfileFields, RecordId, Session, User,
};
use crate::storage::TokenStore;

pub use result::ActionResult;
pub use state::{reduce, AppState, Mutation};

pub struct Store {
    gateway: Arc<dyn DataGateway>,
    tokens: Arc<dyn TokenStore>,
    token_key: String,
    state: RwLock<AppState>,
}

/// Clears the loading flag when the action that raised it ends, whichever way it ends
struct LoadingGuard<'a> {
    store: &'a Store,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.commit(Mutation::SetLoading(false));
    }
}

impl Store {
    pub fn new(gateway: Arc<dyn DataGateway>, tokens: Arc<dyn TokenStore>, token_key: impl Into<String>) -> Self {
        Self {
            gateway,
            tokens,
            token_key: token_key.into(),
            state: RwLock::new(AppState::default()),
        }
    }

    /// Apply a mutation. A `SetSession` also writes (or removes) the persisted
    /// token before the state lock is released, so no reader can observe the
    /// two disagreeing.
    pub fn commit(&self, mutation: Mutation) {
        let name = mutation.name();
        let persisted = match &mutation {
            Mutation::SetSession(session) => Some(session.as_ref().map(|s| s.access_token.clone())),
            _ => None,
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        reduce(&mut state, mutation);
        if let Some(token) = persisted {
            self.persist_token(token.as_deref());
        }
        drop(state);

        tracing::trace!(mutation = name, "committed");
    }

    fn persist_token(&self, token: Option<&str>) {
        let result = match token.filter(|t| !t.is_empty()) {
            Some(token) => self.tokens.set(&self.token_key, token),
            None => self.tokens.remove(&self.token_key),
        };
        if let Err(e) = result {
            tracing::error!("Failed to persist session token: {}", e);
        }
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.commit(Mutation::SetLoading(true));
        LoadingGuard { store: self }
    }

    /// Run `f` against the current state without cloning it
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    // Getters

    pub fn is_authenticated(&self) -> bool {
        self.with_state(getters::is_authenticated)
    }

    pub fn current_user(&self) -> Option<User> {
        self.with_state(|s| getters::current_user(s).cloned())
    }

    pub fn session(&self) -> Option<Session> {
        self.with_state(|s| s.session.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.with_state(getters::is_loading)
    }

    pub fn poems(&self) -> Vec<Poem> {
        self.with_state(|s| s.poems.clone())
    }

    pub fn authors(&self) -> Vec<Author> {
        self.with_state(|s| s.authors.clone())
    }

    pub fn search_results(&self) -> Vec<Poem> {
        self.with_state(|s| s.search_results.clone())
    }

    pub fn featured_poems(&self) -> Vec<Poem> {
        self.with_state(getters::featured_poems)
    }

    pub fn recent_poems(&self) -> Vec<Poem> {
        self.with_state(getters::recent_poems)
    }

    pub fn poems_by_dynasty(&self, dynasty: &str) -> Vec<Poem> {
        self.with_state(|s| getters::poems_by_dynasty(s, dynasty))
    }

    pub fn poems_by_author(&self, author_id: &RecordId) -> Vec<Poem> {
        self.with_state(|s| getters::poems_by_author(s, author_id))
    }

    // Actions

    pub async fn initialize_auth(&self) {
        match self.gateway.current_user().await {
            Ok(Some(user)) => self.commit(Mutation::SetUser(Some(user))),
            Ok(None) => tracing::debug!("No authenticated user to restore"),
            Err(e) => tracing::error!("Failed to initialize authentication: {}", e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ActionResult<()> {
        let _loading = self.begin_loading();
        match self.gateway.sign_in(email, password).await {
            Ok(response) => {
                self.commit(Mutation::SetUser(response.user));
                self.commit(Mutation::SetSession(response.session));
                tracing::info!("Signed in as {}", email);
                ActionResult::ok()
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                ActionResult::failed(&e)
            }
        }
    }

    pub async fn register(&self, email: &str, password: &str, profile: &ProfileFields) -> ActionResult<()> {
        let _loading = self.begin_loading();
        match self.gateway.sign_up(email, password, profile).await {
            Ok(response) => {
                self.commit(Mutation::SetUser(response.user));
                self.commit(Mutation::SetSession(response.session));
                tracing::info!("Registered {}", email);
                ActionResult::ok()
            }
            Err(e) => {
                tracing::error!("Registration failed: {}", e);
                ActionResult::failed(&e)
            }
        }
    }

    /// Local state is cleared even when the remote sign-out fails
    pub async fn logout(&self) {
        if let Err(e) = self.gateway.sign_out().await {
            tracing::error!("Remote sign-out failed: {}", e);
        }
        self.commit(Mutation::SetUser(None));
        self.commit(Mutation::SetSession(None));
    }

    pub async fn fetch_poems(&self, filters: &PoemFilters) -> ActionResult<Vec<Poem>> {
        let _loading = self.begin_loading();
        match self.gateway.get_poems(filters).await {
            Ok(poems) => {
                self.commit(Mutation::SetPoems(poems.clone()));
                ActionResult::with_data(poems)
            }
            Err(e) => {
                tracing::error!("Failed to fetch poems: {}", e);
                ActionResult::failed(&e)
            }
        }
    }

    pub async fn fetch_authors(&self, filters: &AuthorFilters) -> ActionResult<Vec<Author>> {
        let _loading = self.begin_loading();
        match self.gateway.get_authors(filters).await {
            Ok(authors) => {
                self.commit(Mutation::SetAuthors(authors.clone()));
                ActionResult::with_data(authors)
            }
            Err(e) => {
                tracing::error!("Failed to fetch authors: {}", e);
                ActionResult::failed(&e)
            }
        }
    }

    pub async fn search_poems(&self, query: &str) -> ActionResult<Vec<Poem>> {
        let _loading = self.begin_loading();
        match self.gateway.search_poems(query).await {
            Ok(results) => {
                self.commit(Mutation::SetSearchResults(results.clone()));
                ActionResult::with_data(results)
            }
            Err(e) => {
                tracing::error!("Poem search failed: {}", e);
                ActionResult::failed(&e)
            }
        }
    }

    pub async fn favorite_poem(&self, poem_id: &RecordId) -> ActionResult<()> {
        settle_unit("Favorite poem", self.gateway.favorite_poem(poem_id).await)
    }

    pub async fn unfavorite_poem(&self, poem_id: &RecordId) -> ActionResult<()> {
        settle_unit("Unfavorite poem", self.gateway.unfavorite_poem(poem_id).await)
    }

    pub fn add_poem(&self, poem: Poem) {
        self.commit(Mutation::AddPoem(poem));
    }

    pub fn update_poem(&self, poem: Poem) {
        self.commit(Mutation::UpdatePoem(poem));
    }

    // Pass-through reads and writes with no resident state

    pub async fn fetch_poem(&self, id: &RecordId) -> ActionResult<Poem> {
        settle("Fetch poem", self.gateway.get_poem(id).await)
    }

    pub async fn fetch_author(&self, id: &RecordId) -> ActionResult<Author> {
        settle("Fetch author", self.gateway.get_author(id).await)
    }

    pub async fn fetch_author_works(&self, author_id: &RecordId) -> ActionResult<Vec<Poem>> {
        settle("Fetch author works", self.gateway.get_author_works(author_id).await)
    }

    pub async fn fetch_favorites(&self) -> ActionResult<Vec<Favorite>> {
        settle("Fetch favorites", self.gateway.get_user_favorites().await)
    }

    pub async fn fetch_comments(&self, poem_id: &RecordId) -> ActionResult<Vec<Comment>> {
        settle("Fetch comments", self.gateway.get_poem_comments(poem_id).await)
    }

    pub async fn post_comment(
        &self,
        poem_id: &RecordId,
        content: &str,
        parent_id: Option<&RecordId>,
    ) -> ActionResult<Vec<Comment>> {
        settle("Post comment", self.gateway.create_comment(poem_id, content, parent_id).await)
    }

    pub async fn like_comment(&self, comment_id: &RecordId) -> ActionResult<()> {
        settle_unit("Like comment", self.gateway.like_comment(comment_id).await)
    }
}

fn settle<T>(context: &str, result: Result<T, GatewayError>) -> ActionResult<T> {
    match result {
        Ok(data) => ActionResult::with_data(data),
        Err(e) => {
            tracing::error!("{} failed: {}", context, e);
            ActionResult::failed(&e)
        }
    }
}

fn settle_unit(context: &str, result: Result<(), GatewayError>) -> ActionResult<()> {
    match result {
        Ok(()) => ActionResult::ok(),
        Err(e) => {
            tracing::error!("{} failed: {}", context, e);
            ActionResult::failed(&e)
        }
    }
}
