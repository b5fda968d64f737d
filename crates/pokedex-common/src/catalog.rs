use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{NamedResource, Page, PokemonDetail};

const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of types requested by [`CatalogClient::list_types`]; PokeAPI has fewer than this.
const TYPE_PAGE_LIMIT: u32 = 100;

#[derive(Clone, Debug)]
pub struct CatalogClientConfig {
    pub base_url: String,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(2_000),
            max_error_body_bytes: 8 * 1024,
        }
    }
}

impl CatalogClientConfig {
    /// Same defaults as [`Default`], pointed at `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Optional:
    /// - `POKEAPI_BASE_URL` (default: "https://pokeapi.co/api/v2")
    /// - `POKEAPI_TIMEOUT_SECS` (default: 10)
    /// - `POKEAPI_MAX_RETRIES` (default: 2)
    /// - `POKEAPI_RETRY_INITIAL_MS` (default: 200)
    /// - `POKEAPI_RETRY_MAX_MS` (default: 2000)
    /// - `POKEAPI_MAX_ERROR_BODY_BYTES` (default: 8192)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("POKEAPI_BASE_URL").unwrap_or(defaults.base_url);

        let default_timeout = lookup("POKEAPI_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.default_timeout);

        let max_retries = lookup("POKEAPI_MAX_RETRIES")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_retries);

        let initial_backoff = lookup("POKEAPI_RETRY_INITIAL_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.initial_backoff);

        let max_backoff = lookup("POKEAPI_RETRY_MAX_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_backoff);

        let max_error_body_bytes = lookup("POKEAPI_MAX_ERROR_BODY_BYTES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_error_body_bytes);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_error_body_bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },
}

impl CatalogClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request(e) => e.status(),
            Self::Upstream { status, .. } | Self::UpstreamBody { status, .. } => Some(*status),
            Self::InvalidJson(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// The two catalog lookups the enrichment pipeline depends on.
///
/// [`CatalogClient`] is the HTTP implementation; tests substitute in-memory fakes.
pub trait CatalogService {
    /// One page of `{ name, url }` summaries plus the catalog-wide count.
    fn list_summaries(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Page<NamedResource>, CatalogClientError>> + Send;

    /// Full detail record for the Pokémon with numeric id `id`.
    fn get_detail_by_id(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<PokemonDetail, CatalogClientError>> + Send;
}

#[derive(Clone)]
pub struct CatalogClient {
    config: CatalogClientConfig,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let http = reqwest::Client::builder()
            .user_agent("pokedex-fetch")
            .build()?;
        Ok(Self { config, http })
    }

    /// Total number of Pokémon in the catalog. Requests a single-item page and reads `count`.
    pub async fn count(&self) -> Result<u64, CatalogClientError> {
        let page = self.list_summaries(1, 0).await?;
        Ok(page.count)
    }

    pub async fn list_types(&self) -> Result<Page<NamedResource>, CatalogClientError> {
        self.get_json(&format!(
            "{}/type?limit={TYPE_PAGE_LIMIT}&offset=0",
            self.config.base_url
        ))
        .await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, CatalogClientError> {
        debug!(url, "catalog GET");
        self.request_with_retry(|| async {
            let resp = self
                .http
                .get(url)
                .timeout(self.config.default_timeout)
                .send()
                .await?;
            Self::parse_json_response(resp, self.config.max_error_body_bytes).await
        })
        .await
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, CatalogClientError> {
        if resp.status().is_success() {
            // Decode from bytes so malformed bodies surface as InvalidJson, not Request.
            let bytes = resp.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> CatalogClientError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(&body) {
            if let Some(message) = parsed.detail.or(parsed.message) {
                return CatalogClientError::Upstream { status, message };
            }
        }
        CatalogClientError::UpstreamBody { status, body }
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, CatalogClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "catalog request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl CatalogService for CatalogClient {
    async fn list_summaries(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Page<NamedResource>, CatalogClientError> {
        self.get_json(&format!(
            "{}/pokemon?limit={limit}&offset={offset}",
            self.config.base_url
        ))
        .await
    }

    async fn get_detail_by_id(&self, id: u32) -> Result<PokemonDetail, CatalogClientError> {
        self.get_json(&format!("{}/pokemon/{id}", self.config.base_url))
            .await
    }
}

fn should_retry(err: &CatalogClientError) -> bool {
    match err {
        CatalogClientError::Request(e) => {
            e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
        }
        CatalogClientError::Upstream { status, .. }
        | CatalogClientError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        CatalogClientError::InvalidJson(_) => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<String>,
    message: Option<String>,
}
