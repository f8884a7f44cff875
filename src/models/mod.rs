pub mod author;
pub mod comment;
pub mod favorite;
pub mod id;
pub mod poem;
pub mod user;

pub use author::{Author, AuthorFilters};
pub use comment::{Comment, CommentAuthor, NewComment};
pub use favorite::{Favorite, NewFavorite};
pub use id::RecordId;
pub use poem::{Poem, PoemFilters};
pub use user::{AuthResponse, ProfileFields, ProfileRow, Session, User};
