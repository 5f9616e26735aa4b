//! # DirSync Infra
//!
//! Wire-level implementations behind the core's ports:
//! - `http`: reqwest wrapper with retry, backoff, and status classification
//! - `api`: the remote directory API client (token endpoint, paginated
//!   listing, per-entity CRUD) implementing `DirectoryOps`

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod http;

pub use api::{DirectoryClient, HttpTokenEndpoint};
pub use http::HttpClient;
