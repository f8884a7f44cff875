//! Route table and navigation guard.

pub mod guard;
pub mod routes;

pub use guard::{Navigation, RouteGuard};
pub use routes::{ResolvedRoute, Route};
