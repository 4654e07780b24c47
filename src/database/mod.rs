pub mod manager;
pub mod models;
pub mod postgres;
pub mod user_store;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{NewUser, User};
pub use postgres::PgUserStore;
pub use user_store::{MemoryUserStore, UserStore};
