//! Core components of the `npiregistry-rs` client.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`NpiClient`] and its builder.
//! - The primary [`NpiError`] type.
//! - The provider data model shared by every lookup.
//! - The request-execution core: retry engine, TTL cache and transport seam.

/// In-memory TTL cache with a background sweeper.
pub mod cache;
/// The main client (`NpiClient`), builder, and configuration.
pub mod client;
/// The primary error type (`NpiError`) for the crate.
pub mod error;
/// Provider records as returned by the registry.
pub mod models;
pub(crate) mod retry;
/// The HTTP seam used by the client.
pub mod transport;
pub(crate) mod wire;

// convenient re-exports so most code can just `use crate::core::NpiClient`
pub use cache::CacheStore;
pub use client::{CacheMode, NpiClient, NpiClientBuilder, RetryConfig};
pub use error::{Classification, NpiError};
pub use models::{
    Address, BasicInfo, Endpoint, Identifier, OtherName, PracticeLocation, Provider, Taxonomy,
};
pub use transport::{RawResponse, Transport};
pub use wire::ApiResponse;
