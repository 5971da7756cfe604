pub mod entity_store;
pub mod models;

pub use entity_store::EntityStore;
pub use models::{Address, DraftToken, Owned, Post, RecordKey, Todo, User, UserId};
