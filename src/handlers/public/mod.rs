// handlers/public/mod.rs - endpoints reachable without a bearer token.
//
// These never see a principal, so every input is validated here.
pub mod auth;
pub mod system;

pub use auth::{challenge_post, token_post};
pub use system::{health, license, root};
