//! Derived views over [`AppState`]. Recomputed on every call.

use super::state::AppState;
use crate::models::{Poem, RecordId, User};

pub const FEATURED_COUNT: usize = 6;
pub const RECENT_COUNT: usize = 10;

pub fn is_authenticated(state: &AppState) -> bool {
    state.user.is_some()
}

pub fn current_user(state: &AppState) -> Option<&User> {
    state.user.as_ref()
}

pub fn is_loading(state: &AppState) -> bool {
    state.is_loading
}

pub fn featured_poems(state: &AppState) -> Vec<Poem> {
    state.poems.iter().take(FEATURED_COUNT).cloned().collect()
}

/// The list reversed, then the first ten
pub fn recent_poems(state: &AppState) -> Vec<Poem> {
    state.poems.iter().rev().take(RECENT_COUNT).cloned().collect()
}

pub fn poems_by_dynasty(state: &AppState, dynasty: &str) -> Vec<Poem> {
    state
        .poems
        .iter()
        .filter(|p| p.dynasty.as_deref() == Some(dynasty))
        .cloned()
        .collect()
}

pub fn poems_by_author(state: &AppState, author_id: &RecordId) -> Vec<Poem> {
    state
        .poems
        .iter()
        .filter(|p| p.author_id.as_ref() == Some(author_id))
        .cloned()
        .collect()
}
