//! Centralized constants for default endpoints, UA and limits.

use std::time::Duration;

pub(crate) const USER_AGENT: &str = concat!("npiregistry-rs/", env!("CARGO_PKG_VERSION"));

/// NPI Registry API base. Query parameters are appended.
pub(crate) const DEFAULT_BASE_URL: &str = "https://npiregistry.cms.hhs.gov/api/";

/// Registry API version sent with every request.
pub(crate) const API_VERSION: &str = "2.1";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifetime of a cached provider, independent of the sweep interval.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Maximum number of lookups a batch keeps in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Result limit used when a search does not set one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest result limit the registry accepts.
pub const MAX_LIMIT: u32 = 200;
