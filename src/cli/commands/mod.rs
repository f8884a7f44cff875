pub mod auth;
pub mod authors;
pub mod comments;
pub mod favorites;
pub mod poems;
pub mod route;
