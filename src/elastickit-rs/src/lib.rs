//! elastickit Client Library
//!
//! HTTP client for search clusters, seeded from canonicalized endpoints.

mod client;

pub use client::Client;
pub use elastickit_core::builders;
pub use elastickit_core::{canonicalize, ClientConfig, Endpoint, SearchSource, Source};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no available endpoints")]
    NoAvailableEndpoints,

    #[error("invalid configuration: {0}")]
    Config(#[from] elastickit_core::ConfigError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response from server")]
    InvalidResponse,
}

pub type Result<T> = std::result::Result<T, ClientError>;
