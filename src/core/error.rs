use thiserror::Error;

/// Whether a failed attempt may be retried.
///
/// Decided once, when the error is constructed, so callers match on it instead of
/// re-inspecting the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Server errors (5xx), rate limiting (429), and anything below the protocol layer.
    Transient,
    /// Any other non-2xx response. The upstream rejected the request permanently.
    Fatal,
}

impl Classification {
    /// Classifies an HTTP status code returned by the registry.
    #[must_use]
    pub const fn of_status(status: u16) -> Self {
        if status >= 500 || status == 429 {
            Self::Transient
        } else {
            Self::Fatal
        }
    }
}

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum NpiError {
    /// The caller supplied invalid input (an empty NPI, an empty batch).
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The client configuration was rejected at build time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The registry answered with a non-2xx status code.
    #[error("registry returned status {status} at {url}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// The response body, as returned by the registry.
        message: String,
        /// Whether this status is worth retrying.
        class: Classification,
    },

    /// The request failed below the protocol layer (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Every attempt failed with a transient error and the retry budget ran out.
    #[error("max retries exceeded after {attempts} attempt(s){}: {last}", for_npi(.npi))]
    RetriesExhausted {
        /// Total number of attempts made, including the first.
        attempts: u32,
        /// The NPI being looked up, for single and batch lookups.
        npi: Option<String>,
        /// The failure observed on the final attempt.
        #[source]
        last: Box<NpiError>,
    },

    /// The cancellation token fired before the request could complete.
    #[error("request cancelled after {attempts} attempt(s){}", for_npi(.npi))]
    Cancelled {
        /// Attempts that were started before cancellation.
        attempts: u32,
        /// The NPI being looked up, for single and batch lookups.
        npi: Option<String>,
    },

    /// The registry answered successfully but had no record for this NPI.
    #[error("no provider found with NPI {npi}")]
    NotFound {
        /// The NPI that was looked up.
        npi: String,
    },

    /// A batch lookup finished with at least one failed key.
    #[error("batch fetch completed with {failed} of {total} failed; first failure for NPI {key}: {source}")]
    PartialBatch {
        /// Number of keys that failed.
        failed: usize,
        /// Number of distinct keys in the batch.
        total: usize,
        /// The key of the first recorded failure.
        key: String,
        /// The first recorded failure.
        #[source]
        source: Box<NpiError>,
    },

    /// A spawned lookup task panicked or was aborted.
    #[error("lookup task failed: {0}")]
    Task(String),
}

impl NpiError {
    /// Builds a `Status` error, classifying the status code.
    pub(crate) fn from_status(status: u16, url: &url::Url, body: String) -> Self {
        Self::Status {
            status,
            url: url.to_string(),
            message: body,
            class: Classification::of_status(status),
        }
    }

    /// The retry classification of a single attempt's failure, if it has one.
    ///
    /// Failures below the protocol layer are always transient. Terminal errors
    /// produced by the client itself (`NotFound`, `Cancelled`, ...) have none.
    #[must_use]
    pub const fn classification(&self) -> Option<Classification> {
        match self {
            Self::Status { class, .. } => Some(*class),
            Self::Http(_) | Self::Json(_) => Some(Classification::Transient),
            _ => None,
        }
    }

    /// Returns `true` if another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.classification(), Some(Classification::Transient))
    }

    /// Returns `true` for a lookup that legitimately matched no record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the request was preempted by its cancellation token.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Attaches the NPI being looked up to errors that would not otherwise name it.
    pub(crate) fn with_npi(mut self, key: &str) -> Self {
        if let Self::RetriesExhausted { npi, .. } | Self::Cancelled { npi, .. } = &mut self {
            *npi = Some(key.to_string());
        }
        self
    }

    /// The NPI a lookup failure refers to, if known.
    #[must_use]
    pub fn npi(&self) -> Option<&str> {
        match self {
            Self::RetriesExhausted { npi, .. } | Self::Cancelled { npi, .. } => npi.as_deref(),
            Self::NotFound { npi } => Some(npi),
            Self::PartialBatch { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The HTTP status behind this error, looking through `RetriesExhausted`.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

fn for_npi(npi: &Option<String>) -> String {
    npi.as_deref()
        .map_or_else(String::new, |n| format!(" for NPI {n}"))
}
