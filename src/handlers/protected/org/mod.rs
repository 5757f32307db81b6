// handlers/protected/org/mod.rs - Authenticated organization mutations
pub mod delete; // DELETE /api/org/delete
pub mod update; // PUT /api/org/update

pub use delete::delete;
pub use update::update_put;
