// handlers/protected/mod.rs - endpoints behind the bearer-token gate.
//
// Handlers may rely on `AuthPrincipal` being present.
pub mod auth;
pub mod users;

pub use auth::whoami;
pub use users::{create_user, delete_user, get_user, list_users, update_user};
