//! npiregistry-rs: ergonomic client for the CMS NPI Registry.
//!
//! Look up a provider by NPI number, search with filters, or fetch many providers at once
//! with bounded concurrency. Every request goes through an exponential-backoff retry
//! engine that honors a [`CancellationToken`]; provider lookups can be cached in memory
//! with a TTL and a background sweeper.
//!
//! ```no_run
//! # async fn run() -> Result<(), npiregistry_rs::NpiError> {
//! use std::time::Duration;
//! use npiregistry_rs::NpiClient;
//!
//! let client = NpiClient::builder()
//!     .cache_ttl(Duration::from_secs(300))
//!     .build()?;
//!
//! let provider = client.get_provider("1043218118").await?;
//! println!("{}", provider.display_name());
//!
//! let (found, err) = client
//!     .get_providers(["1043218118", "1003000126"])
//!     .await?
//!     .into_parts();
//! if let Some(e) = err {
//!     eprintln!("{e}");
//! }
//! println!("{} providers", found.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod core;
pub mod provider;
pub mod search;

pub use batch::{BatchBuilder, BatchResult};
pub use crate::core::{
    Address, ApiResponse, BasicInfo, CacheMode, CacheStore, Classification, Endpoint, Identifier,
    NpiClient, NpiClientBuilder, NpiError, OtherName, PracticeLocation, Provider, RawResponse,
    RetryConfig, Taxonomy, Transport,
};
pub use provider::ProviderBuilder;
pub use search::{SearchBuilder, SearchOptions};
pub use tokio_util::sync::CancellationToken;
