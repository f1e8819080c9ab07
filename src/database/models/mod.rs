pub mod movie;
pub mod user;

pub use movie::{Movie, MovieDraft, MovieFilter};
pub use user::{User, UserDraft};
