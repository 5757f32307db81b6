// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here takes `AuthOrg` and only ever touches that organization.
pub mod org;
