//! Client for the Emporium content backend.
//!
//! Every call returns `Result<T, BackendError>`. Handlers log the error, show a
//! notification where it makes sense and fall back to empty values; nothing
//! here retries.
//!
//! The four single types (`global`, `integrations`, `cookies`, `shop`) change
//! rarely and are read on nearly every request, so they are cached in-process
//! using `moka` (5-minute TTL).

mod cache;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use emporium_core::{
    CookieConfig, GlobalData, Integrations, Message, Order, Page, Post, PostQuery, Product,
    ProductQuery, ShopConfig,
};

use cache::{CacheKey, CacheValue};

/// Message reported for failures that never produced a backend response.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Carries the visitor address on submissions; the backend rate limits by it.
const FORWARDED_FOR: &str = "x-forwarded-for";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the content backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend answered with a non-200 status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Configured base URL cannot carry path segments.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// HTTP status to report; transport and parse failures count as 500.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            _ => 500,
        }
    }

    /// Human-readable message to report.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            _ => UNKNOWN_ERROR,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the content backend's JSON API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments (each segment is percent-encoded).
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl serde::Serialize,
        client_ip: Option<IpAddr>,
    ) -> Result<T, BackendError> {
        let mut request = self.inner.client.post(url).json(body);
        if let Some(ip) = client_ip {
            request = request.header(FORWARDED_FOR, ip.to_string());
        }
        read_json(request.send().await?).await
    }

    // =========================================================================
    // Single Types
    // =========================================================================

    async fn single_type<T: DeserializeOwned>(&self, key: CacheKey) -> Result<T, BackendError> {
        self.get_json(self.endpoint([key.path()])?).await
    }

    /// Navigation, footer and branding.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn global(&self) -> Result<GlobalData, BackendError> {
        if let Some(CacheValue::Global(global)) = self.inner.cache.get(&CacheKey::Global).await {
            debug!("Cache hit for global");
            return Ok(*global);
        }

        let global: GlobalData = self.single_type(CacheKey::Global).await?;
        self.inner
            .cache
            .insert(CacheKey::Global, CacheValue::Global(Box::new(global.clone())))
            .await;
        Ok(global)
    }

    /// Public integration settings (captcha public key, analytics, chat).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn integrations(&self) -> Result<Integrations, BackendError> {
        if let Some(CacheValue::Integrations(integrations)) =
            self.inner.cache.get(&CacheKey::Integrations).await
        {
            debug!("Cache hit for integrations");
            return Ok(*integrations);
        }

        let integrations: Integrations = self.single_type(CacheKey::Integrations).await?;
        self.inner
            .cache
            .insert(
                CacheKey::Integrations,
                CacheValue::Integrations(Box::new(integrations.clone())),
            )
            .await;
        Ok(integrations)
    }

    /// Cookie banner configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cookies(&self) -> Result<CookieConfig, BackendError> {
        if let Some(CacheValue::Cookies(cookies)) = self.inner.cache.get(&CacheKey::Cookies).await
        {
            debug!("Cache hit for cookies");
            return Ok(*cookies);
        }

        let cookies: CookieConfig = self.single_type(CacheKey::Cookies).await?;
        self.inner
            .cache
            .insert(CacheKey::Cookies, CacheValue::Cookies(Box::new(cookies.clone())))
            .await;
        Ok(cookies)
    }

    /// Currency, quantity limit and shipping tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn shop(&self) -> Result<ShopConfig, BackendError> {
        if let Some(CacheValue::Shop(shop)) = self.inner.cache.get(&CacheKey::Shop).await {
            debug!("Cache hit for shop");
            return Ok(*shop);
        }

        let shop: ShopConfig = self.single_type(CacheKey::Shop).await?;
        self.inner
            .cache
            .insert(CacheKey::Shop, CacheValue::Shop(Box::new(shop.clone())))
            .await;
        Ok(shop)
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Get the page at `path` (e.g. `index`, `about/team`).
    ///
    /// # Errors
    ///
    /// Returns a 404 `BackendError::Status` if no page has this path.
    #[instrument(skip(self))]
    pub async fn get_page(&self, path: &str) -> Result<Page, BackendError> {
        let segments = std::iter::once("pages").chain(path.split('/').filter(|s| !s.is_empty()));
        self.get_json(self.endpoint(segments)?).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products; `details` is not included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let mut url = self.endpoint(["products"])?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        self.get_json(url).await
    }

    /// Get a product by identifier or numeric id.
    ///
    /// # Errors
    ///
    /// Returns a 404 `BackendError::Status` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn get_product(&self, identifier: &str) -> Result<Product, BackendError> {
        self.get_json(self.endpoint(["products", identifier])?).await
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// List posts; `content` is not included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, BackendError> {
        let mut url = self.endpoint(["posts"])?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        self.get_json(url).await
    }

    /// Count posts matching the search and topic of `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn count_posts(&self, query: &PostQuery) -> Result<u64, BackendError> {
        let filters = PostQuery {
            q: query.q.clone(),
            topic: query.topic.clone(),
            ..PostQuery::default()
        };
        let mut url = self.endpoint(["posts", "count"])?;
        url.query_pairs_mut().extend_pairs(filters.to_query_pairs());
        self.get_json(url).await
    }

    /// Get a post by identifier.
    ///
    /// # Errors
    ///
    /// Returns a 404 `BackendError::Status` if the post does not exist.
    #[instrument(skip(self))]
    pub async fn get_post(&self, identifier: &str) -> Result<Post, BackendError> {
        self.get_json(self.endpoint(["posts", identifier])?).await
    }

    // =========================================================================
    // Submissions
    // =========================================================================

    /// Submit a contact message on behalf of the visitor at `client_ip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the message or the captcha.
    #[instrument(skip_all, fields(email = %message.email))]
    pub async fn submit_message(
        &self,
        message: &Message,
        captcha_token: Option<&str>,
        client_ip: Option<IpAddr>,
    ) -> Result<Message, BackendError> {
        let url = self.submission_url("messages", captcha_token)?;
        self.post_json(url, message, client_ip).await
    }

    /// Submit an order on behalf of the visitor at `client_ip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the captcha.
    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn submit_order(
        &self,
        order: &Order,
        captcha_token: Option<&str>,
        client_ip: Option<IpAddr>,
    ) -> Result<Order, BackendError> {
        let url = self.submission_url("orders", captcha_token)?;
        self.post_json(url, order, client_ip).await
    }

    fn submission_url(&self, collection: &str, captcha_token: Option<&str>) -> Result<Url, BackendError> {
        let mut url = self.endpoint([collection])?;
        if let Some(token) = captcha_token {
            url.query_pairs_mut().append_pair("captchaToken", token);
        }
        Ok(url)
    }
}

/// Decode a 200 response, or turn anything else into `BackendError::Status`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or(UNKNOWN_ERROR)
                .to_string()
        });
        if status == StatusCode::NOT_FOUND {
            debug!(%message, "Backend resource not found");
        } else {
            tracing::warn!(
                status = %status,
                %message,
                "Backend returned non-success status"
            );
        }
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

/// Best-effort message from an error body.
///
/// Understands the nested validation shape `message[0].messages[0].message`,
/// a plain `message` string and an `error` string, in that order.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    value
        .pointer("/message/0/messages/0/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("message").and_then(Value::as_str))
        .or_else(|| value.get("error").and_then(Value::as_str))
        .map(str::to_owned)
}
