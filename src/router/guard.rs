use serde::Serialize;
use std::sync::Arc;

use super::routes::Route;
use crate::storage::{usable_token, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

/// Decides whether a navigation may go ahead.
///
/// Only the persisted token is consulted, at decision time. The session store
/// is not, so the two can disagree (a stale token passes the guard while the
/// store is signed out).
pub struct RouteGuard {
    tokens: Arc<dyn TokenStore>,
    token_key: String,
}

impl RouteGuard {
    pub fn new(tokens: Arc<dyn TokenStore>, token_key: impl Into<String>) -> Self {
        Self { tokens, token_key: token_key.into() }
    }

    pub fn check(&self, target: Route) -> Navigation {
        if target.requires_auth() && usable_token(self.tokens.as_ref(), &self.token_key).is_none() {
            tracing::debug!("Redirecting {} to login: no stored token", target.name());
            return Navigation::Redirect(Route::Login);
        }
        Navigation::Proceed
    }
}
