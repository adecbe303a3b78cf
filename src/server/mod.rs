pub mod dto;
mod hooks;
mod keys;
pub mod response;
mod router;
mod tenants;
pub mod validation;

pub use hooks::{AuthMethod, authenticate, public_keys_match};
pub use router::{AppState, create_router};
