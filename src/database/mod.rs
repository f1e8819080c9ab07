pub mod manager;
pub mod memory;
pub mod models;
pub mod movies;
pub mod store;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use movies::PgMovieStore;
pub use store::{MovieStore, UserStore};
pub use users::PgUserStore;
