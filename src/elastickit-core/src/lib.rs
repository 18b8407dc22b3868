//! elastickit Core Library
//!
//! This crate provides the core functionality for elastickit, including:
//! - Endpoint canonicalization with DNS fallback for `host:port` inputs
//! - Request body builders (aggregations, filters, queries, search source)
//! - Client configuration

pub mod builders;
pub mod canonicalize;
pub mod config;
pub mod endpoint;
pub mod resolver;

// Re-export commonly used types
pub use builders::{Aggregation, Filter, Query, SearchSource, Source};
pub use canonicalize::{
    canonicalize, CanonicalizeOptions, CanonicalizeReport, Canonicalizer, DropReason, Outcome,
};
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{Endpoint, Scheme};
pub use resolver::{Resolver, SystemResolver};
