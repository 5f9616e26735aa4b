//! Remote directory API client.

mod directory;
mod pagination;
mod token;

pub use directory::DirectoryClient;
pub use token::HttpTokenEndpoint;
