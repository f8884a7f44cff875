use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::gateway::DataGateway;
use crate::models::{
    AuthResponse, Author, AuthorFilters, Comment, Favorite, Poem, PoemFilters, ProfileFields, RecordId, Session, User,
};

/// In-memory gateway for store tests.
///
/// Any operation can be made to fail with [`FakeGateway::fail_on`]. Writes that
/// would reach a remote table are recorded so tests can assert on what was
/// (or was not) sent.
pub struct FakeGateway {
    poems: Vec<Poem>,
    authors: Vec<Author>,
    confirm_email: bool,
    remote_user: Mutex<Option<User>>,
    failing: Mutex<HashSet<&'static str>>,
    mutations: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub const PASSWORD: &'static str = "moonlight";

    pub fn new() -> Self {
        Self {
            poems: Vec::new(),
            authors: vec![Author::new("li-bai", "李白"), Author::new("du-fu", "杜甫")],
            confirm_email: false,
            remote_user: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_poems(poems: Vec<Poem>) -> Self {
        Self { poems, ..Self::new() }
    }

    /// Sign-up answers with a user but no session
    pub fn requiring_confirmation(mut self) -> Self {
        self.confirm_email = true;
        self
    }

    pub fn poem(id: &str, title: &str, dynasty: &str) -> Poem {
        Poem {
            dynasty: Some(dynasty.to_string()),
            content: title.to_string(),
            ..Poem::new(id, title)
        }
    }

    pub fn user(email: &str) -> User {
        User {
            id: RecordId::from(Uuid::new_v4().to_string()),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
            user_metadata: Default::default(),
            email_confirmed_at: None,
            last_sign_in_at: None,
            created_at: None,
        }
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Pretend a session already exists on the service side
    pub fn sign_in_remotely(&self, email: &str) {
        *self.remote_user.lock().unwrap() = Some(Self::user(email));
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), GatewayError> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(GatewayError::remote(500, format!("{} failed", operation)));
        }
        Ok(())
    }

    fn require_user(&self) -> Result<User, GatewayError> {
        self.remote_user.lock().unwrap().clone().ok_or(GatewayError::Unauthenticated)
    }

    fn record(&self, mutation: &str) {
        self.mutations.lock().unwrap().push(mutation.to_string());
    }

    fn start_session(&self, email: &str) -> AuthResponse {
        let user = Self::user(email);
        *self.remote_user.lock().unwrap() = Some(user.clone());
        let session = Session {
            user: Some(user.clone()),
            ..Session::bearer(format!("token-{}", user.id))
        };
        AuthResponse { user: Some(user), session: Some(session) }
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn sign_up(&self, email: &str, _password: &str, _profile: &ProfileFields) -> Result<AuthResponse, GatewayError> {
        self.check("sign_up")?;
        if self.confirm_email {
            return Ok(AuthResponse { user: Some(Self::user(email)), session: None });
        }
        Ok(self.start_session(email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        self.check("sign_in")?;
        if password != Self::PASSWORD {
            return Err(GatewayError::remote(400, "Invalid login credentials"));
        }
        Ok(self.start_session(email))
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.check("sign_out")?;
        *self.remote_user.lock().unwrap() = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        self.check("current_user")?;
        Ok(self.remote_user.lock().unwrap().clone())
    }

    async fn get_poems(&self, filters: &PoemFilters) -> Result<Vec<Poem>, GatewayError> {
        self.check("get_poems")?;
        Ok(self
            .poems
            .iter()
            .filter(|p| filters.dynasty.is_none() || p.dynasty == filters.dynasty)
            .filter(|p| filters.kind.is_none() || p.kind == filters.kind)
            .filter(|p| filters.author.is_none() || p.author_id == filters.author)
            .cloned()
            .collect())
    }

    async fn get_poem(&self, id: &RecordId) -> Result<Poem, GatewayError> {
        self.check("get_poem")?;
        self.poems
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("poem {}", id)))
    }

    async fn search_poems(&self, query: &str) -> Result<Vec<Poem>, GatewayError> {
        self.check("search_poems")?;
        let needle = query.to_lowercase();
        Ok(self
            .poems
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle) || p.content.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn favorite_poem(&self, _poem_id: &RecordId) -> Result<(), GatewayError> {
        self.check("favorite_poem")?;
        self.require_user()?;
        self.record("insert favorites");
        Ok(())
    }

    async fn unfavorite_poem(&self, _poem_id: &RecordId) -> Result<(), GatewayError> {
        self.check("unfavorite_poem")?;
        self.require_user()?;
        self.record("delete favorites");
        Ok(())
    }

    async fn get_user_favorites(&self) -> Result<Vec<Favorite>, GatewayError> {
        self.check("get_user_favorites")?;
        self.require_user()?;
        Ok(Vec::new())
    }

    async fn get_authors(&self, filters: &AuthorFilters) -> Result<Vec<Author>, GatewayError> {
        self.check("get_authors")?;
        Ok(self
            .authors
            .iter()
            .filter(|a| filters.dynasty.is_none() || a.dynasty == filters.dynasty)
            .cloned()
            .collect())
    }

    async fn get_author(&self, id: &RecordId) -> Result<Author, GatewayError> {
        self.check("get_author")?;
        self.authors
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("author {}", id)))
    }

    async fn get_author_works(&self, author_id: &RecordId) -> Result<Vec<Poem>, GatewayError> {
        self.check("get_author_works")?;
        Ok(self.poems.iter().filter(|p| p.author_id.as_ref() == Some(author_id)).cloned().collect())
    }

    async fn get_poem_comments(&self, _poem_id: &RecordId) -> Result<Vec<Comment>, GatewayError> {
        self.check("get_poem_comments")?;
        Ok(Vec::new())
    }

    async fn create_comment(
        &self,
        poem_id: &RecordId,
        content: &str,
        parent_id: Option<&RecordId>,
    ) -> Result<Vec<Comment>, GatewayError> {
        self.check("create_comment")?;
        let user = self.require_user()?;
        self.record("insert comments");
        Ok(vec![Comment {
            id: RecordId::from(Uuid::new_v4().to_string()),
            poem_id: poem_id.clone(),
            user_id: Some(user.id),
            content: content.to_string(),
            parent_id: parent_id.cloned(),
            likes_count: 0,
            created_at: None,
            user: None,
        }])
    }

    async fn like_comment(&self, _comment_id: &RecordId) -> Result<(), GatewayError> {
        self.check("like_comment")?;
        self.record("update comments");
        Ok(())
    }
}
