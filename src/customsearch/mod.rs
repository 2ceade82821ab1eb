pub mod types;

use std::env;

use reqwest::Client;
use tracing::{debug, warn};

use crate::results::SearchResult;
use types::{ApiError, Item, SearchResponse};

const API_BASE: &str = "https://www.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum CustomSearchError {
    #[error("GOOGLE_API_KEY not set. Get one at https://console.cloud.google.com/apis/credentials")]
    ApiKeyNotSet,

    #[error("CUSTOM_SEARCH_ENGINE_ID not set. Create an engine at https://programmablesearchengine.google.com")]
    EngineIdNotSet,

    #[error("Custom Search API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("Custom Search API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Custom Search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Client for the Google Custom Search JSON API: one keyword search call,
/// no secondary lookups.
#[derive(Clone)]
pub struct CustomSearchClient {
    http: Client,
    api_key: Option<ApiKey>,
    engine_id: Option<String>,
    base_url: String,
}

impl CustomSearchClient {
    /// Reads `GOOGLE_API_KEY` and `CUSTOM_SEARCH_ENGINE_ID` from the
    /// environment. Missing values are not errors here; the first search
    /// call fails instead.
    pub fn from_env(http: Client) -> Self {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(ApiKey);
        let engine_id = env::var("CUSTOM_SEARCH_ENGINE_ID")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if api_key.is_none() {
            warn!("GOOGLE_API_KEY not set. Article searches will fail.");
        }
        if engine_id.is_none() {
            warn!("CUSTOM_SEARCH_ENGINE_ID not set. Article searches will fail.");
        }
        Self {
            http,
            api_key,
            engine_id,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: Some(ApiKey("test-key".to_string())),
            engine_id: Some("test-engine".to_string()),
            base_url: base_url.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn without_credentials(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: None,
            engine_id: None,
            base_url: base_url.to_string(),
        }
    }

    /// Search the web for `term` and normalize each hit into an article
    /// result. An absent `items` array (no hits) is an empty result set,
    /// not an error.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, CustomSearchError> {
        let key = self.api_key.as_ref().ok_or(CustomSearchError::ApiKeyNotSet)?;
        let engine = self
            .engine_id
            .as_deref()
            .ok_or(CustomSearchError::EngineIdNotSet)?;

        let url = format!("{}/customsearch/v1", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", term), ("cx", engine), ("key", &key.0)])
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Custom Search API rate limited");
            return Err(CustomSearchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<types::ErrorEnvelope>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Custom Search API error");
                return Err(classified);
            }
            let snippet = truncate_snippet(&text);
            warn!(status = %status, "Custom Search API error (no structured body)");
            return Err(CustomSearchError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: SearchResponse = response.json().await?;
        if let Some(err) = &body.error {
            return Err(classify_api_error(err));
        }

        let items = body.items.unwrap_or_default();
        debug!(count = items.len(), "custom search complete");
        Ok(items.into_iter().map(normalize_item).collect())
    }
}

fn normalize_item(item: Item) -> SearchResult {
    let thumbnail = item
        .pagemap
        .and_then(|p| p.cse_image)
        .and_then(|images| images.into_iter().next())
        .and_then(|image| image.src);
    SearchResult::Article {
        title: item.title.unwrap_or_default(),
        link: item.link.unwrap_or_default(),
        snippet: item.snippet.unwrap_or_default(),
        thumbnail,
    }
}

/// First 200 bytes of an error body, backed off to a char boundary so a
/// multi-byte character at the cut never panics.
fn truncate_snippet(text: &str) -> &str {
    const MAX: usize = 200;
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn classify_api_error(err: &ApiError) -> CustomSearchError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => CustomSearchError::RateLimited,
        Some(403) => CustomSearchError::QuotaExhausted(message),
        Some(code) => CustomSearchError::Api { code, message },
        None => CustomSearchError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}
