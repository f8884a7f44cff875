use serde::Serialize;

use crate::models::{Author, Poem, Session, User};

/// Everything the client holds in memory. Lists are snapshots of remote data
/// and are only ever replaced, prepended to, or patched by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub poems: Vec<Poem>,
    pub authors: Vec<Author>,
    pub search_results: Vec<Poem>,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetUser(Option<User>),
    SetSession(Option<Session>),
    SetPoems(Vec<Poem>),
    SetAuthors(Vec<Author>),
    SetSearchResults(Vec<Poem>),
    SetLoading(bool),
    /// Prepend a newly created poem
    AddPoem(Poem),
    /// Replace the poem with the same id in place; no-op when absent
    UpdatePoem(Poem),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetUser(_) => "SET_USER",
            Mutation::SetSession(_) => "SET_SESSION",
            Mutation::SetPoems(_) => "SET_POEMS",
            Mutation::SetAuthors(_) => "SET_AUTHORS",
            Mutation::SetSearchResults(_) => "SET_SEARCH_RESULTS",
            Mutation::SetLoading(_) => "SET_LOADING",
            Mutation::AddPoem(_) => "ADD_POEM",
            Mutation::UpdatePoem(_) => "UPDATE_POEM",
        }
    }
}

/// Apply one mutation. Pure: persistence of the session token is the
/// store's job, not the reducer's.
pub fn reduce(state: &mut AppState, mutation: Mutation) {
    match mutation {
        Mutation::SetUser(user) => state.user = user,
        Mutation::SetSession(session) => state.session = session,
        Mutation::SetPoems(poems) => state.poems = poems,
        Mutation::SetAuthors(authors) => state.authors = authors,
        Mutation::SetSearchResults(results) => state.search_results = results,
        Mutation::SetLoading(loading) => state.is_loading = loading,
        Mutation::AddPoem(poem) => state.poems.insert(0, poem),
        Mutation::UpdatePoem(updated) => {
            if let Some(slot) = state.poems.iter_mut().find(|p| p.id == updated.id) {
                *slot = updated;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poem(id: &str, title: &str) -> Poem {
        Poem::new(id, title)
    }

    #[test]
    fn add_poem_prepends() {
        let mut state = AppState { poems: vec![poem("a", "A"), poem("b", "B")], ..Default::default() };
        reduce(&mut state, Mutation::AddPoem(poem("c", "C")));

        let ids: Vec<&str> = state.poems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn update_poem_replaces_in_place() {
        let mut state = AppState {
            poems: vec![poem("c", "C"), poem("a", "A"), poem("b", "B")],
            ..Default::default()
        };
        reduce(&mut state, Mutation::UpdatePoem(poem("b", "X")));

        let titles: Vec<&str> = state.poems.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "X"]);
        assert_eq!(state.poems[2].id.as_str(), "b");
    }

    #[test]
    fn update_poem_with_unknown_id_is_noop() {
        let mut state = AppState { poems: vec![poem("a", "A")], ..Default::default() };
        let before = state.clone();
        reduce(&mut state, Mutation::UpdatePoem(poem("zzz", "X")));
        assert_eq!(state, before);
    }

    #[test]
    fn set_poems_replaces_wholesale() {
        let mut state = AppState { poems: vec![poem("a", "A"), poem("b", "B")], ..Default::default() };
        reduce(&mut state, Mutation::SetPoems(vec![poem("d", "D")]));
        assert_eq!(state.poems.len(), 1);
        assert_eq!(state.poems[0].id.as_str(), "d");
    }

    #[test]
    fn search_results_are_independent_of_poems() {
        let mut state = AppState { poems: vec![poem("a", "A")], ..Default::default() };
        reduce(&mut state, Mutation::SetSearchResults(vec![poem("s", "S")]));
        assert_eq!(state.poems[0].id.as_str(), "a");
        assert_eq!(state.search_results[0].id.as_str(), "s");
    }
}
