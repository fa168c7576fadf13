use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use url::Url;

use crate::core::NpiError;

/// The raw outcome of one GET request: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A single awaitable GET against the registry.
///
/// Implementations return `Ok` for every response that made it back from the server,
/// whatever its status; status classification happens in the retry engine. `Err` is reserved
/// for failures below the protocol layer.
///
/// The default implementation is backed by `reqwest`. Tests and embedders can supply their
/// own through [`NpiClientBuilder::transport`](crate::NpiClientBuilder::transport).
pub trait Transport: Send + Sync + Debug {
    fn get<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, NpiError>> + Send + 'a>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub(crate) const fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, NpiError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .http
                .get(url.clone())
                .header("accept", "application/json")
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok(RawResponse { status, body })
        })
    }
}
