// handlers/protected/mod.rs - Handlers behind the `authenticate` route layer
pub mod movies;

pub use movies::{movie_create, movie_delete};
