//! Client for the hosted workspace store's HTTP API

use core::fmt;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::properties::PropertyMap;
use crate::store::{BlockRecord, DatabaseQuery, PageRecord, Paged, WorkspaceStore};

/// Hosted endpoint of the workspace store
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Wire format revision this client is written against
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

/// Page size requested when listing block children, the store's maximum
const CHILDREN_PAGE_SIZE: usize = 100;

/// [`WorkspaceStore`] implementation backed by the hosted HTTP API
#[derive(Clone)]
pub struct HttpStore {
    http: Client,
    base_url: String,
    api_key: String,
    api_version: String,
}

impl HttpStore {
    /// Create a client against the hosted endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Point the client at another deployment, used with proxies
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Pin a wire format revision other than the default
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.api_version)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| StoreError::decode(err.to_string()))
    }
}

impl fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WorkspaceStore for HttpStore {
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Paged<BlockRecord>> {
        let url = self.endpoint(&format!("blocks/{block_id}/children"));
        let mut request = self
            .prepare(self.http.get(&url))
            .query(&[("page_size", CHILDREN_PAGE_SIZE)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("start_cursor", cursor)]);
        }
        debug!(block = block_id, "listing block children");
        Self::read(request.send().await?).await
    }

    async fn retrieve_page(&self, page_id: &str) -> StoreResult<PageRecord> {
        let url = self.endpoint(&format!("pages/{page_id}"));
        Self::read(self.prepare(self.http.get(&url)).send().await?).await
    }

    async fn query_database(
        &self,
        database_id: &str,
        query: DatabaseQuery,
    ) -> StoreResult<Paged<PageRecord>> {
        let url = self.endpoint(&format!("databases/{database_id}/query"));
        debug!(database = database_id, "querying database");
        Self::read(
            self.prepare(self.http.post(&url))
                .json(&query)
                .send()
                .await?,
        )
        .await
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> StoreResult<PageRecord> {
        let url = self.endpoint("pages");
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        Self::read(self.prepare(self.http.post(&url)).json(&body).send().await?).await
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> StoreResult<PageRecord> {
        let url = self.endpoint(&format!("pages/{page_id}"));
        let body = json!({ "properties": properties });
        Self::read(self.prepare(self.http.patch(&url)).json(&body).send().await?).await
    }
}

fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::unauthorized(message),
        StatusCode::NOT_FOUND => StoreError::not_found(message),
        StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::invalid_request(message)
        }
        status if status.is_server_error() => StoreError::Unavailable(status.as_u16()),
        status => StoreError::other(format!("unexpected status {status}: {message}")),
    }
}

/// Error payloads carry a human readable `message` field; fall back to the
/// raw body when they do not parse
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["message"].as_str().map(ToString::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_duplicate_slash() {
        let store = HttpStore::new("secret").with_base_url("https://proxy.local/");
        assert_eq!(
            store.endpoint("blocks/b1/children"),
            "https://proxy.local/v1/blocks/b1/children"
        );
        assert_eq!(store.endpoint("pages"), "https://proxy.local/v1/pages");
    }

    #[test]
    fn classify_status_maps_store_errors() {
        let err = classify_status(
            StatusCode::NOT_FOUND,
            r#"{"message": "Could not find block"}"#,
        );
        assert!(matches!(err, StoreError::NotFound(m) if m == "Could not find block"));

        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "{}"),
            StoreError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            StoreError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            StoreError::Unavailable(502)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad filter"),
            StoreError::InvalidRequest(m) if m == "bad filter"
        ));
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message(r#"{"message": "boom"}"#), "boom");
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message(r#"{"code": 42}"#), r#"{"code": 42}"#);
    }

    #[test]
    fn debug_output_hides_credentials() {
        let store = HttpStore::new("secret-integration-token");
        let output = format!("{store:?}");
        assert!(!output.contains("secret-integration-token"));
        assert!(output.contains("base_url"));
    }
}
