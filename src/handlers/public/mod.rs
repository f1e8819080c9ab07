// handlers/public/mod.rs - Public handlers (no authentication required)
pub mod health;
pub mod movies;
pub mod tokens;
pub mod users;

pub use health::{healthcheck, metrics};
pub use movies::{movie_get, movie_update, movies_list};
pub use tokens::token_create;
pub use users::user_register;
