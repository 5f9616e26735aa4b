//! OAuth2 client-credentials token lifecycle.
//!
//! [`TokenManager`] owns the cached token and is the only component that
//! mutates it. Every authenticated call in the system goes through
//! [`TokenManager::get_token`].

mod token_manager;
mod traits;
mod types;

pub use token_manager::TokenManager;
pub use traits::TokenEndpoint;
pub use types::{TokenResponse, TokenSet};
