use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::client::RetryConfig;
use crate::core::client::constants::{API_VERSION, DEFAULT_LIMIT, MAX_LIMIT};
use crate::core::{ApiResponse, NpiClient, NpiError, Provider, retry};

/// Filters for a registry search. Every field is optional; empty strings are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// A specific 10-digit NPI number.
    pub number: String,
    /// `NPI-1`/`ind` for individuals, `NPI-2`/`org` for organizations.
    pub enumeration_type: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,
    /// Specialty, e.g. `Family Medicine`. Partial matches are allowed.
    pub taxonomy_description: String,
    /// `LOCATION` or `MAILING`; empty searches both.
    pub address_purpose: String,
    pub city: String,
    /// Two-letter state code, e.g. `CA`.
    pub state: String,
    /// 5-digit or 9-digit ZIP code.
    pub postal_code: String,
    pub country_code: String,
    /// Results per request. `0` means the default (10); values above 200 are capped.
    pub limit: u32,
    /// Results to skip, for pagination.
    pub skip: u32,
    /// Ask the registry to pretty-print its JSON.
    pub pretty: bool,
}

impl SearchOptions {
    /// Builds the request URL on top of `base`.
    pub(crate) fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("version", API_VERSION);

            let filters = [
                ("number", &self.number),
                ("enumeration_type", &self.enumeration_type),
                ("first_name", &self.first_name),
                ("last_name", &self.last_name),
                ("organization_name", &self.organization_name),
                ("taxonomy_description", &self.taxonomy_description),
                ("address_purpose", &self.address_purpose),
                ("city", &self.city),
                ("state", &self.state),
                ("postal_code", &self.postal_code),
                ("country_code", &self.country_code),
            ];
            for (name, value) in filters {
                if !value.is_empty() {
                    qp.append_pair(name, value);
                }
            }

            qp.append_pair("limit", &effective_limit(self.limit).to_string());
            if self.skip > 0 {
                qp.append_pair("skip", &self.skip.to_string());
            }
            if self.pretty {
                qp.append_pair("pretty", "true");
            }
        }
        url
    }
}

const fn effective_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_LIMIT
    } else if limit > MAX_LIMIT {
        MAX_LIMIT
    } else {
        limit
    }
}

/// Runs one search through the retry engine and decodes the envelope.
///
/// Non-2xx responses become `NpiError::Status`; a body that is not a registry envelope
/// becomes `NpiError::Json`. Both are classified there, so the engine decides what to retry.
pub(crate) async fn run_query(
    client: &NpiClient,
    opts: &SearchOptions,
    retry_policy: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<ApiResponse, NpiError> {
    let url = opts.to_url(client.base_url());
    let url = &url;

    retry::execute(retry_policy, cancel, move |_attempt| async move {
        let raw = client.transport().get(url).await?;
        if !raw.is_success() {
            return Err(NpiError::from_status(raw.status, url, raw.body));
        }
        let env: ApiResponse = serde_json::from_str(&raw.body)?;
        Ok::<_, NpiError>(env)
    })
    .await
}

/* ---------------- Public API ---------------- */

/// A builder for searching providers in the NPI Registry.
///
/// Search results are never cached. An empty result set is `Ok(vec![])`.
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    client: NpiClient,
    opts: SearchOptions,
    retry_override: Option<RetryConfig>,
    cancel: CancellationToken,
}

impl SearchBuilder {
    /// Creates a new `SearchBuilder` with no filters set.
    #[must_use]
    pub fn new(client: &NpiClient) -> Self {
        Self {
            client: client.clone(),
            opts: SearchOptions::default(),
            retry_override: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces every filter at once.
    #[must_use]
    pub fn options(mut self, opts: SearchOptions) -> Self {
        self.opts = opts;
        self
    }

    #[must_use]
    pub fn number(mut self, s: impl Into<String>) -> Self {
        self.opts.number = s.into();
        self
    }

    #[must_use]
    pub fn enumeration_type(mut self, s: impl Into<String>) -> Self {
        self.opts.enumeration_type = s.into();
        self
    }

    #[must_use]
    pub fn first_name(mut self, s: impl Into<String>) -> Self {
        self.opts.first_name = s.into();
        self
    }

    #[must_use]
    pub fn last_name(mut self, s: impl Into<String>) -> Self {
        self.opts.last_name = s.into();
        self
    }

    #[must_use]
    pub fn organization_name(mut self, s: impl Into<String>) -> Self {
        self.opts.organization_name = s.into();
        self
    }

    #[must_use]
    pub fn taxonomy_description(mut self, s: impl Into<String>) -> Self {
        self.opts.taxonomy_description = s.into();
        self
    }

    #[must_use]
    pub fn address_purpose(mut self, s: impl Into<String>) -> Self {
        self.opts.address_purpose = s.into();
        self
    }

    #[must_use]
    pub fn city(mut self, s: impl Into<String>) -> Self {
        self.opts.city = s.into();
        self
    }

    #[must_use]
    pub fn state(mut self, s: impl Into<String>) -> Self {
        self.opts.state = s.into();
        self
    }

    #[must_use]
    pub fn postal_code(mut self, s: impl Into<String>) -> Self {
        self.opts.postal_code = s.into();
        self
    }

    #[must_use]
    pub fn country_code(mut self, s: impl Into<String>) -> Self {
        self.opts.country_code = s.into();
        self
    }

    /// Sets the maximum number of results (1-200, default 10).
    #[must_use]
    pub const fn limit(mut self, n: u32) -> Self {
        self.opts.limit = n;
        self
    }

    /// Skips the first `n` results.
    #[must_use]
    pub const fn skip(mut self, n: u32) -> Self {
        self.opts.skip = n;
        self
    }

    #[must_use]
    pub const fn pretty(mut self, yes: bool) -> Self {
        self.opts.pretty = yes;
        self
    }

    /// Overrides the client's retry policy for this search.
    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Cancels the search (including pending retries) when `token` fires.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Executes the search request.
    ///
    /// # Errors
    ///
    /// Returns `NpiError::Status` for a non-retryable status, `NpiError::RetriesExhausted` when
    /// transient failures outlast the retry policy, `NpiError::Cancelled` when the token fires,
    /// or `NpiError::Config` if an overriding retry policy is invalid.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err, fields(limit = self.opts.limit)))]
    pub async fn fetch(self) -> Result<Vec<Provider>, NpiError> {
        let policy = match &self.retry_override {
            Some(cfg) => {
                cfg.validate()?;
                cfg
            }
            None => self.client.retry_config(),
        };
        let env = run_query(&self.client, &self.opts, policy, &self.cancel).await?;
        Ok(env.results)
    }
}

/// Searches for providers matching `opts`.
///
/// # Errors
///
/// See [`SearchBuilder::fetch`].
pub async fn search(client: &NpiClient, opts: SearchOptions) -> Result<Vec<Provider>, NpiError> {
    SearchBuilder::new(client).options(opts).fetch().await
}

impl NpiClient {
    /// Searches for providers matching `opts`. See [`SearchBuilder`].
    ///
    /// # Errors
    ///
    /// See [`SearchBuilder::fetch`].
    pub async fn search(&self, opts: SearchOptions) -> Result<Vec<Provider>, NpiError> {
        SearchBuilder::new(self).options(opts).fetch().await
    }
}
