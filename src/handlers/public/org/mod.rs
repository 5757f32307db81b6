// handlers/public/org/mod.rs - Organization signup and lookup
pub mod create; // POST /api/org/create
pub mod get;    // GET /api/org/get?organization_name=

pub use create::create_post;
pub use get::get;
