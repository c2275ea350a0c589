use crate::api::types::{
    CatalogEntry, CategoryMembershipResponse, DetailRecord, DetailResponse,
    EvolutionChainResponse, EvolutionNode, ListingPage, ListingResponse, SpeciesRecord,
    SpeciesResponse, Sprites, SpritesOnlyResponse,
};
use crate::util::{validate_api_base, validate_url};
use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public PokeAPI endpoint used when no base is configured.
pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Limit passed to the listing endpoint to get every entry in one response.
pub const FULL_LISTING_LIMIT: usize = 10_000;

const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024; // 8MB
const USER_AGENT: &str = concat!("dexterm/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while talking to the catalog API.
///
/// `Clone` so one failure can be handed to every caller attached to the same
/// in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response within the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// DNS, connection or TLS failure
    #[error("Request failed: {0}")]
    Network(String),
    /// The API has no record for the identifier (HTTP 404)
    #[error("Not found")]
    NotFound,
    /// Any other non-2xx status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Body did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Body exceeded the 8MB cap
    #[error("Response too large")]
    ResponseTooLarge,
    /// Base URL, identifier or followed locator rejected before sending
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
}

impl FetchError {
    /// Transient failures worth another attempt: timeouts, network errors and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Network(_) => true,
            FetchError::HttpStatus(status) => *status >= 500,
            _ => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Transport tuning for [`CatalogClient`].
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Extra attempts after the first one for transient failures.
    pub max_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Create a custom redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Read-only client for the remote catalog API.
///
/// Every operation is idempotent. Transient failures are retried up to
/// `max_retries` times immediately; 4xx responses and decode failures are
/// returned on the first attempt. Caching and in-flight sharing live one
/// layer up in [`crate::api::CatalogStore`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base: Url,
    options: ClientOptions,
}

impl CatalogClient {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        Self::with_options(base, ClientOptions::default())
    }

    /// Build a client for `base`.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidLocator`] when the base is not HTTPS (plain HTTP is
    /// allowed for localhost only), [`FetchError::Network`] when the HTTP
    /// client cannot be constructed.
    pub fn with_options(base: &str, options: ClientOptions) -> Result<Self, FetchError> {
        let base = validate_api_base(base).map_err(|e| FetchError::InvalidLocator(e.to_string()))?;
        let base = Url::parse(&base).map_err(|e| FetchError::InvalidLocator(e.to_string()))?;

        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::from_reqwest)?;

        Ok(Self {
            http,
            base,
            options,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// One page of the listing. `has_next` mirrors the API's `next` link.
    pub async fn fetch_listing_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<ListingPage, FetchError> {
        let mut url = self.endpoint(&["pokemon"])?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let response: ListingResponse = self.get_json(url).await?;
        Ok(ListingPage {
            has_next: response.next.is_some(),
            entries: response.results,
        })
    }

    /// Every entry in catalog order.
    pub async fn fetch_full_listing(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let mut url = self.endpoint(&["pokemon"])?;
        url.query_pairs_mut()
            .append_pair("limit", &FULL_LISTING_LIMIT.to_string());

        let response: ListingResponse = self.get_json(url).await?;
        Ok(response.results)
    }

    pub async fn fetch_detail(&self, identifier: &str) -> Result<DetailRecord, FetchError> {
        let url = self.endpoint(&["pokemon", checked_identifier(identifier)?])?;
        let raw: DetailResponse = self.get_json(url).await?;
        Ok(raw.into())
    }

    pub async fn fetch_species(&self, identifier: &str) -> Result<SpeciesRecord, FetchError> {
        let url = self.endpoint(&["pokemon-species", checked_identifier(identifier)?])?;
        let raw: SpeciesResponse = self.get_json(url).await?;
        Ok(raw.into())
    }

    /// Members of one type, unwrapped from the `{ pokemon: { name, url } }` slots.
    pub async fn fetch_by_category(&self, category: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        let url = self.endpoint(&["type", checked_identifier(category)?])?;
        let raw: CategoryMembershipResponse = self.get_json(url).await?;
        Ok(raw.pokemon.into_iter().map(|m| m.pokemon).collect())
    }

    /// Follow an evolution-chain locator taken from a species record.
    pub async fn fetch_evolution_graph(&self, locator: &str) -> Result<EvolutionNode, FetchError> {
        let url = self.resolve_locator(locator)?;
        let bytes = self.get_body(&url).await?;
        let raw = EvolutionChainResponse::from_slice(&bytes).map_err(|e| malformed(&url, e))?;
        Ok(raw.chain)
    }

    /// Sprite locator for one item: official artwork, else the default front sprite.
    pub async fn fetch_artwork(&self, identifier: &str) -> Result<Option<String>, FetchError> {
        let url = self.endpoint(&["pokemon", checked_identifier(identifier)?])?;
        let raw: SpritesOnlyResponse = self.get_json(url).await?;
        let sprites: Sprites = raw.sprites.into();
        Ok(sprites.primary().map(str::to_owned))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidLocator(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Locators on the API's own origin are trusted; anything else must pass
    /// the public-address check.
    fn resolve_locator(&self, locator: &str) -> Result<Url, FetchError> {
        let url = Url::parse(locator).map_err(|e| FetchError::InvalidLocator(e.to_string()))?;
        if url.origin() == self.base.origin() {
            return Ok(url);
        }
        validate_url(locator).map_err(|e| {
            tracing::warn!(locator = %locator, error = %e, "Rejected evolution locator");
            FetchError::InvalidLocator(e.to_string())
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let bytes = self.get_body(&url).await?;
        serde_json::from_slice(&bytes).map_err(|e| malformed(&url, e))
    }

    /// Response body with retries applied to retryable failures.
    async fn get_body(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_bytes(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt < self.options.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        url = %url,
                        error = %e,
                        attempt = attempt,
                        max_retries = self.options.max_retries,
                        "Retrying catalog request"
                    );
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Catalog request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let request = async {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound);
            }
            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            read_limited_bytes(response, MAX_RESPONSE_SIZE).await
        };

        tokio::time::timeout(self.options.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}

fn malformed(url: &Url, e: serde_json::Error) -> FetchError {
    tracing::warn!(url = %url, error = %e, "Catalog response did not decode");
    FetchError::Malformed(e.to_string())
}

fn checked_identifier(identifier: &str) -> Result<&str, FetchError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidLocator("empty identifier".to_string()));
    }
    Ok(trimmed)
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
