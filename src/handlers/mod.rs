// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (Bearer token, see middleware::auth)
pub mod public;    // Organization signup, lookup and login
pub mod protected; // Mutations scoped to the authenticated organization
