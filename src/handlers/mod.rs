// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, health, license, token acquisition
// Protected (bearer token): everything under /api
pub mod protected;
pub mod public;
