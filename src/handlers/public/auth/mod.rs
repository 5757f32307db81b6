// handlers/public/auth/mod.rs - Token acquisition
pub mod login; // POST /api/auth/login - exchange admin credentials for a token

pub use login::login_post;
