//! HTTP client for the hosted signage backend.
//!
//! The backend exposes its tables through a PostgREST-style REST surface
//! (`/rest/v1/{table}` with `column=op.value` filters) and its private
//! media bucket through a signing endpoint (`/storage/v1/object/sign`).
//! This client issues exactly the queries the display page needs, nothing
//! more: content is read-only from here, writing stays with the admin
//! application.
//!
//! # Example
//!
//! ```no_run
//! use pmobackend::{ContentRepository, RestBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = RestBackend::builder()
//!         .base_url("https://project.example.co")
//!         .api_key("service-key")
//!         .build()?;
//!
//!     for item in backend.list_active().await? {
//!         println!("{} ({}s)", item.title, item.duration_secs);
//!     }
//!     Ok(())
//! }
//! ```

use chrono::Weekday;
use pmocontent::{ContentId, ContentItem, Screen, ScreenId, TimeOfDay};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{BackendError, Result};
use crate::rows;
use crate::traits::{
    ContentRepository, ScheduleEntry, ScheduleRepository, ScreenRepository, SignedUrlProvider,
};

/// Default timeout for HTTP requests (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default lifetime of a signed media URL (1 hour).
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u32 = 3600;

/// Bucket holding uploaded media files.
pub const DEFAULT_STORAGE_BUCKET: &str = "content-files";

/// Nested select pulling a schedule's playlist and content in one query.
const SCHEDULE_SELECT: &str = "*,playlist:playlists(id,name,playlist_items(id,content_id,order_index,content(id,title,type,content_data,duration,is_active,created_at)))";

/// REST client for the hosted backend.
///
/// The client is stateless: no caching, no retries. Sequencing decisions
/// (what to do when a query fails) belong to the resolver, freshness
/// decisions to the session layer.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
    timeout: Duration,
}

impl RestBackend {
    /// Client with default settings for the given project URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).api_key(api_key).build()
    }

    /// Builder for configuring the client.
    pub fn builder() -> RestBackendBuilder {
        RestBackendBuilder::default()
    }

    /// The project base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bucket media paths are signed against.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// One GET against `/rest/v1/{table}`, returning the raw row page.
    async fn get_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest)?;

        if !response.status().is_success() {
            return Err(BackendError::from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

fn map_reqwest(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        err.into()
    }
}

// ============================================================================
// Query construction (pure, so the dialect is testable without a server)
// ============================================================================

fn content_list_query() -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("is_active", "eq.true".to_string()),
        ("order", "created_at.desc".to_string()),
    ]
}

fn content_by_id_query(id: &ContentId) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("id", format!("eq.{id}")),
        ("limit", "1".to_string()),
    ]
}

fn schedule_query(screen: &ScreenId, day: Weekday, time: TimeOfDay) -> Vec<(&'static str, String)> {
    // `cs.{N}` is the array-contains filter; day numbering is
    // Sunday = 0 like the rows store it.
    vec![
        ("select", SCHEDULE_SELECT.to_string()),
        ("screen_id", format!("eq.{screen}")),
        ("is_active", "eq.true".to_string()),
        (
            "days_of_week",
            format!("cs.{{{}}}", day.num_days_from_sunday()),
        ),
        ("start_time", format!("lte.{time}")),
        ("end_time", format!("gte.{time}")),
        ("order", "created_at.asc".to_string()),
    ]
}

fn screen_list_query() -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("order", "name.asc".to_string()),
    ]
}

fn screen_by_id_query(id: &ScreenId) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("id", format!("eq.{id}")),
        ("limit", "1".to_string()),
    ]
}

/// Resolves the signing endpoint's relative answer against the project URL.
///
/// The endpoint replies with a path like
/// `/object/sign/content-files/a.jpg?token=...`, relative to `/storage/v1`.
/// Absolute answers pass through untouched.
fn resolve_signed_path(base_url: &str, signed: &str) -> String {
    if signed.starts_with("http://") || signed.starts_with("https://") {
        return signed.to_string();
    }
    if signed.starts_with('/') {
        format!("{base_url}/storage/v1{signed}")
    } else {
        format!("{base_url}/storage/v1/{signed}")
    }
}

// ============================================================================
// Repository implementations
// ============================================================================

#[async_trait::async_trait]
impl ContentRepository for RestBackend {
    async fn list_active(&self) -> Result<Vec<ContentItem>> {
        let values = self.get_rows("content", &content_list_query()).await?;
        Ok(rows::decode_content_rows(values))
    }

    async fn get_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let values = self.get_rows("content", &content_by_id_query(id)).await?;
        Ok(rows::decode_content_rows(values).into_iter().next())
    }
}

#[async_trait::async_trait]
impl ScheduleRepository for RestBackend {
    async fn find_active_for_screen(
        &self,
        screen: &ScreenId,
        day: Weekday,
        time: TimeOfDay,
    ) -> Result<Vec<ScheduleEntry>> {
        let values = self
            .get_rows("schedules", &schedule_query(screen, day, time))
            .await?;
        Ok(rows::decode_schedule_rows(values))
    }
}

#[async_trait::async_trait]
impl ScreenRepository for RestBackend {
    async fn list_screens(&self) -> Result<Vec<Screen>> {
        let values = self.get_rows("screens", &screen_list_query()).await?;
        Ok(rows::decode_screen_rows(values))
    }

    async fn get_screen(&self, id: &ScreenId) -> Result<Option<Screen>> {
        let values = self.get_rows("screens", &screen_by_id_query(id)).await?;
        Ok(rows::decode_screen_rows(values).into_iter().next())
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[async_trait::async_trait]
impl SignedUrlProvider for RestBackend {
    async fn signed_url(&self, storage_path: &str, expires_secs: u32) -> Result<String> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, storage_path
        );
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "expiresIn": expires_secs }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest)?;

        if !response.status().is_success() {
            let err = BackendError::from_response(response).await;
            return Err(match err {
                BackendError::Status { status, body } => {
                    BackendError::storage(format!("signing {storage_path} failed ({status}): {body}"))
                }
                other => other,
            });
        }

        let signed: SignResponse = response.json().await?;
        Ok(resolve_signed_path(&self.base_url, &signed.signed_url))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`RestBackend`].
#[derive(Debug)]
pub struct RestBackendBuilder {
    client: Option<Client>,
    base_url: Option<String>,
    api_key: Option<String>,
    bucket: String,
    timeout: Duration,
}

impl Default for RestBackendBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: None,
            api_key: None,
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl RestBackendBuilder {
    /// Project base URL, e.g. `https://project.example.co`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// API key, sent as both `apikey` and bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Bucket to sign media paths against (default `content-files`).
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Per-request timeout (default 30 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Custom `reqwest::Client`, for sharing a connection pool.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<RestBackend> {
        let base_url = self
            .base_url
            .ok_or_else(|| BackendError::config("backend base URL is required"))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let api_key = self
            .api_key
            .ok_or_else(|| BackendError::config("backend API key is required"))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };

        Ok(RestBackend {
            client,
            base_url,
            api_key,
            bucket: self.bucket,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_query_matches_the_dialect() {
        let query = schedule_query(
            &ScreenId::from("scr1"),
            Weekday::Wed,
            "09:30".parse().unwrap(),
        );

        let lookup = |key: &str| -> &str {
            &query
                .iter()
                .find(|(k, _)| *k == key)
                .unwrap_or_else(|| panic!("missing {key}"))
                .1
        };

        assert_eq!(lookup("screen_id"), "eq.scr1");
        assert_eq!(lookup("is_active"), "eq.true");
        assert_eq!(lookup("days_of_week"), "cs.{3}");
        assert_eq!(lookup("start_time"), "lte.09:30");
        assert_eq!(lookup("end_time"), "gte.09:30");
        assert_eq!(lookup("order"), "created_at.asc");
        assert!(lookup("select").contains("playlist:playlists"));
        assert!(lookup("select").contains("order_index"));
    }

    #[test]
    fn sunday_is_day_zero() {
        let query = schedule_query(
            &ScreenId::from("scr1"),
            Weekday::Sun,
            "00:00".parse().unwrap(),
        );
        assert!(query.contains(&("days_of_week", "cs.{0}".to_string())));
    }

    #[test]
    fn content_queries_order_and_filter() {
        assert_eq!(
            content_list_query(),
            vec![
                ("select", "*".to_string()),
                ("is_active", "eq.true".to_string()),
                ("order", "created_at.desc".to_string()),
            ]
        );
        let by_id = content_by_id_query(&ContentId::from("abc"));
        assert!(by_id.contains(&("id", "eq.abc".to_string())));
        assert!(by_id.contains(&("limit", "1".to_string())));
    }

    #[test]
    fn signed_paths_resolve_against_storage_base() {
        let base = "https://project.example.co";
        assert_eq!(
            resolve_signed_path(base, "/object/sign/content-files/a.jpg?token=t"),
            "https://project.example.co/storage/v1/object/sign/content-files/a.jpg?token=t"
        );
        assert_eq!(
            resolve_signed_path(base, "object/sign/content-files/a.jpg"),
            "https://project.example.co/storage/v1/object/sign/content-files/a.jpg"
        );
        assert_eq!(
            resolve_signed_path(base, "https://cdn.example/a.jpg"),
            "https://cdn.example/a.jpg"
        );
    }

    #[test]
    fn builder_requires_base_url_and_key() {
        assert!(RestBackend::builder().build().is_err());
        assert!(RestBackend::builder().base_url("https://x.example").build().is_err());

        let backend = RestBackend::builder()
            .base_url("https://x.example/")
            .api_key("k")
            .build()
            .unwrap();
        assert_eq!(backend.base_url(), "https://x.example");
        assert_eq!(backend.bucket(), DEFAULT_STORAGE_BUCKET);
    }
}
