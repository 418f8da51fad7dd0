//! REST client for the remote content API.
//!
//! The pipeline talks to the remote system only through [`RemoteApi`]
//! (authenticated collection calls) and [`WebFetcher`] (anonymous page and
//! image fetches). [`RestClient`] implements both over reqwest.

use async_trait::async_trait;
use pressmark_types::{RemoteId, RemoteItem};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, RANGE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// JSON object sent as a post body
pub type JsonObject = Map<String, Value>;

/// Errors from the remote API or a fetched page
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{method} {url} returned HTTP {status}: {message}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Binary upload to the media collection
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// File name announced in `Content-Disposition`
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name)
    }
}

/// Authenticated collection operations
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List items of `collection` matching `query`
    async fn list(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<RemoteItem>, RemoteError>;

    /// Create an item from a JSON body
    async fn create(&self, collection: &str, payload: &JsonObject)
        -> Result<RemoteItem, RemoteError>;

    /// Update the item with `id`
    async fn update(
        &self,
        collection: &str,
        id: RemoteId,
        payload: &JsonObject,
    ) -> Result<RemoteItem, RemoteError>;

    /// Transfer file bytes into the media library
    async fn upload_media(&self, upload: MediaUpload) -> Result<RemoteItem, RemoteError>;
}

/// Anonymous fetches of third-party resources
#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// Fetch a page body as text
    async fn fetch_text(&self, url: &str) -> Result<String, RemoteError>;

    /// Fetch at most `limit` leading bytes of a resource
    async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Vec<u8>, RemoteError>;
}

/// Result of a lookup by slug
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Missing,
    Found(RemoteItem),
    Ambiguous(Vec<RemoteItem>),
}

impl Lookup {
    pub fn match_count(&self) -> usize {
        match self {
            Lookup::Missing => 0,
            Lookup::Found(_) => 1,
            Lookup::Ambiguous(items) => items.len(),
        }
    }
}

/// Look up `slug` in `collection`, with optional extra query parameters
pub async fn find_by_slug(
    api: &dyn RemoteApi,
    collection: &str,
    slug: &str,
    extra: &[(&str, &str)],
) -> Result<Lookup, RemoteError> {
    let mut query: Vec<(&str, &str)> = vec![("slug", slug)];
    query.extend_from_slice(extra);

    let mut items = api.list(collection, &query).await?;
    debug!(collection, slug, matches = items.len(), "slug lookup");

    Ok(match items.len() {
        0 => Lookup::Missing,
        1 => Lookup::Found(items.remove(0)),
        _ => Lookup::Ambiguous(items),
    })
}

/// reqwest-backed client for a WordPress-style REST API
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl RestClient {
    /// Create a client for the API described by `config`
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .user_agent(concat!("pressmark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            user: config.auth.user.clone(),
            password: config.auth.password.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn item_url(&self, collection: &str, id: RemoteId) -> String {
        format!("{}/{}/{}/", self.base_url, collection, id)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        if self.user.is_empty() {
            request
        } else {
            request.basic_auth(&self.user, Some(&self.password))
        }
    }

    async fn item_from(
        &self,
        method: &'static str,
        url: &str,
        response: Response,
    ) -> Result<RemoteItem, RemoteError> {
        let response = check_status(method, url, response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Turn a non-success response into [`RemoteError::Status`]
async fn check_status(
    method: &'static str,
    url: &str,
    response: Response,
) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(200).collect();
    Err(RemoteError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteApi for RestClient {
    async fn list(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<RemoteItem>, RemoteError> {
        let url = self.collection_url(collection);
        let response = self
            .authed(self.client.get(&url).query(query))
            .send()
            .await?;
        let response = check_status("GET", &url, response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse {
            url,
            message: e.to_string(),
        })
    }

    async fn create(
        &self,
        collection: &str,
        payload: &JsonObject,
    ) -> Result<RemoteItem, RemoteError> {
        let url = self.collection_url(collection);
        debug!(%url, "create");
        let response = self
            .authed(self.client.post(&url).json(payload))
            .send()
            .await?;
        self.item_from("POST", &url, response).await
    }

    async fn update(
        &self,
        collection: &str,
        id: RemoteId,
        payload: &JsonObject,
    ) -> Result<RemoteItem, RemoteError> {
        let url = self.item_url(collection, id);
        debug!(%url, "update");
        let response = self
            .authed(self.client.post(&url).json(payload))
            .send()
            .await?;
        self.item_from("POST", &url, response).await
    }

    async fn upload_media(&self, upload: MediaUpload) -> Result<RemoteItem, RemoteError> {
        let url = self.collection_url(pressmark_types::collection::MEDIA);
        debug!(%url, file = %upload.file_name, bytes = upload.bytes.len(), "upload");
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .header(CONTENT_DISPOSITION, upload.content_disposition())
            .body(upload.bytes);
        let response = self.authed(request).send().await?;
        self.item_from("POST", &url, response).await
    }
}

#[async_trait]
impl WebFetcher for RestClient {
    async fn fetch_text(&self, url: &str) -> Result<String, RemoteError> {
        let response = self.client.get(url).send().await?;
        let response = check_status("GET", url, response).await?;
        Ok(response.text().await?)
    }

    async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Vec<u8>, RemoteError> {
        let range = format!("bytes=0-{}", limit.saturating_sub(1));
        let response = self.client.get(url).header(RANGE, range).send().await?;
        let mut response = check_status("GET", url, response).await?;

        // Servers that ignore Range send the whole body; stop reading early
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() >= limit {
                bytes.truncate(limit);
                break;
            }
        }
        Ok(bytes)
    }
}
