//! HTTP transport with retry and error classification.

mod client;

pub use client::HttpClient;
