use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    Home,
    Poems,
    PoemDetail,
    Authors,
    AuthorDetail,
    Search,
    Login,
    Register,
    Profile,
    Favorites,
    Admin,
}

/// A concrete path matched against the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub route: Route,
    pub id: Option<String>,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Home,
        Route::Poems,
        Route::PoemDetail,
        Route::Authors,
        Route::AuthorDetail,
        Route::Search,
        Route::Login,
        Route::Register,
        Route::Profile,
        Route::Favorites,
        Route::Admin,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Poems => "/poems",
            Route::PoemDetail => "/poems/:id",
            Route::Authors => "/authors",
            Route::AuthorDetail => "/authors/:id",
            Route::Search => "/search",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Profile => "/profile",
            Route::Favorites => "/favorites",
            Route::Admin => "/admin",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Poems => "Poems",
            Route::PoemDetail => "PoemDetail",
            Route::Authors => "Authors",
            Route::AuthorDetail => "AuthorDetail",
            Route::Search => "Search",
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Profile => "Profile",
            Route::Favorites => "Favorites",
            Route::Admin => "Admin",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Profile | Route::Favorites | Route::Admin)
    }

    /// Match a concrete path. Query strings and a trailing slash are ignored;
    /// `:id` segments must be non-empty.
    pub fn resolve(path: &str) -> Option<ResolvedRoute> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        Route::ALL.iter().find_map(|route| {
            let pattern: Vec<&str> = route.path().split('/').filter(|s| !s.is_empty()).collect();
            if pattern.len() != segments.len() {
                return None;
            }

            let mut id = None;
            for (expected, actual) in pattern.iter().zip(&segments) {
                if *expected == ":id" {
                    id = Some(actual.to_string());
                } else if expected != actual {
                    return None;
                }
            }
            Some(ResolvedRoute { route: *route, id })
        })
    }
}
