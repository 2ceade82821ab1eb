pub mod types;

use std::env;

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};

use crate::results::SearchResult;
use types::{ApiError, SearchItem, SearchListResponse, Statistics, VideoListResponse};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: &str = "5";

#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("YOUTUBE_API_KEY not set. Get one at https://console.cloud.google.com/apis/credentials")]
    ApiKeyNotSet,

    #[error("YouTube API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("YouTube API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("YouTube API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("No statistics returned for video '{0}'")]
    MissingStatistics(String),

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

/// Client for the YouTube Data API v3: keyword search plus per-video
/// engagement statistics.
#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    api_key: Option<ApiKey>,
    base_url: String,
}

impl YouTubeClient {
    /// Reads `YOUTUBE_API_KEY` from the environment. A missing key is not an
    /// error here; the first search call fails with `ApiKeyNotSet` instead.
    pub fn from_env(http: Client) -> Self {
        let api_key = env::var("YOUTUBE_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(ApiKey);
        if api_key.is_none() {
            warn!("YOUTUBE_API_KEY not set. Video searches will fail.");
        }
        Self {
            http,
            api_key,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: Some(ApiKey("test-key".to_string())),
            base_url: base_url.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn without_key(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: None,
            base_url: base_url.to_string(),
        }
    }

    /// Search for videos matching `term` and normalize them, including a
    /// statistics lookup per video. Statistics calls run concurrently once
    /// the initial search resolves; any failure fails the whole fetch.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, YouTubeError> {
        let key = self.api_key.as_ref().ok_or(YouTubeError::ApiKeyNotSet)?;

        let body: SearchListResponse = self
            .get_json(
                "/search",
                &[
                    ("part", "snippet"),
                    ("maxResults", MAX_RESULTS),
                    ("q", term),
                    ("type", "video"),
                    ("key", &key.0),
                ],
            )
            .await?;
        if let Some(err) = &body.error {
            return Err(classify_api_error(err));
        }

        let items = body.items.unwrap_or_default();
        debug!(count = items.len(), "youtube search complete");

        let lookups = items.iter().filter_map(|item| {
            let id = item.id.video_id.as_deref()?;
            Some(self.video_with_statistics(item, id, key))
        });
        join_all(lookups).await.into_iter().collect()
    }

    async fn video_with_statistics(
        &self,
        item: &SearchItem,
        id: &str,
        key: &ApiKey,
    ) -> Result<SearchResult, YouTubeError> {
        let stats = self.fetch_statistics(id, key).await?;
        let snippet = item.snippet.as_ref();
        Ok(SearchResult::Video {
            title: snippet.and_then(|s| s.title.clone()).unwrap_or_default(),
            link: format!("https://www.youtube.com/watch?v={id}"),
            thumbnail: snippet
                .and_then(|s| s.thumbnails.as_ref())
                .and_then(|t| t.medium.as_ref())
                .and_then(|m| m.url.clone()),
            views: parse_count(stats.view_count.as_deref()),
            likes: parse_count(stats.like_count.as_deref()),
        })
    }

    async fn fetch_statistics(&self, id: &str, key: &ApiKey) -> Result<Statistics, YouTubeError> {
        let body: VideoListResponse = self
            .get_json("/videos", &[("part", "statistics"), ("id", id), ("key", &key.0)])
            .await?;
        if let Some(err) = &body.error {
            return Err(classify_api_error(err));
        }
        body.items
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::MissingStatistics(id.to_string()))
            .map(|item| {
                item.statistics.unwrap_or(Statistics {
                    view_count: None,
                    like_count: None,
                })
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(query)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("YouTube API rate limited");
            return Err(YouTubeError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<types::ErrorEnvelope>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "YouTube API error");
                return Err(classified);
            }
            let snippet = truncate_snippet(&text);
            warn!(status = %status, "YouTube API error (no structured body)");
            return Err(YouTubeError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        Ok(response.json().await?)
    }
}

/// Engagement counts are decimal strings on the wire; absent or unparseable
/// counts (e.g. hidden likes) normalize to 0.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
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

fn classify_api_error(err: &ApiError) -> YouTubeError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => YouTubeError::RateLimited,
        Some(403) => YouTubeError::QuotaExhausted(message),
        Some(code) => YouTubeError::Api { code, message },
        None => YouTubeError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_body(ids: &[&str]) -> serde_json::Value {
        let items: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": {"videoId": id},
                    "snippet": {
                        "title": format!("Video {id}"),
                        "thumbnails": {"medium": {"url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg")}}
                    }
                })
            })
            .collect();
        serde_json::json!({"items": items})
    }

    fn stats_body(views: &str, likes: Option<&str>) -> serde_json::Value {
        let mut statistics = serde_json::json!({"viewCount": views});
        if let Some(likes) = likes {
            statistics["likeCount"] = serde_json::json!(likes);
        }
        serde_json::json!({"items": [{"statistics": statistics}]})
    }

    #[tokio::test]
    async fn search_normalizes_videos_with_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(query_param("maxResults", "5"))
            .and(query_param("type", "video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["abc"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats_body("1200", Some("34"))))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let results = client.search("rust").await.unwrap();

        assert_eq!(results.len(), 1);
        match &results[0] {
            SearchResult::Video {
                title,
                link,
                thumbnail,
                views,
                likes,
            } => {
                assert_eq!(title, "Video abc");
                assert_eq!(link, "https://www.youtube.com/watch?v=abc");
                assert_eq!(
                    thumbnail.as_deref(),
                    Some("https://i.ytimg.com/vi/abc/mqdefault.jpg")
                );
                assert_eq!(*views, 1200);
                assert_eq!(*likes, 34);
            }
            other => panic!("expected video, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn hidden_likes_normalize_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["abc"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats_body("500", None)))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let results = client.search("rust").await.unwrap();

        match &results[0] {
            SearchResult::Video { views, likes, .. } => {
                assert_eq!(*views, 500);
                assert_eq!(*likes, 0);
            }
            other => panic!("expected video, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_thumbnail_is_none_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": {"videoId": "abc"}, "snippet": {"title": "No thumb"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats_body("1", Some("0"))))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let results = client.search("rust").await.unwrap();

        match &results[0] {
            SearchResult::Video { thumbnail, .. } => assert!(thumbnail.is_none()),
            other => panic!("expected video, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_statistics_items_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["gone"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("rust").await;
        assert!(matches!(result, Err(YouTubeError::MissingStatistics(id)) if id == "gone"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_call() {
        let server = MockServer::start().await;

        let client = YouTubeClient::without_key(Client::new(), &server.uri());
        let result = client.search("rust").await;

        assert!(matches!(result, Err(YouTubeError::ApiKeyNotSet)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_403_with_error_body_is_quota_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "quotaExceeded"}
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("rust").await;
        assert!(matches!(result, Err(YouTubeError::QuotaExhausted(_))));
    }

    #[tokio::test]
    async fn search_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("rust").await;
        assert!(matches!(result, Err(YouTubeError::RateLimited)));
    }

    #[tokio::test]
    async fn search_500_with_unstructured_body_keeps_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("rust").await;
        match &result {
            Err(YouTubeError::Api { code: 500, message }) => {
                assert!(message.contains("not json"), "expected body snippet, got: {message}");
            }
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_500_with_multibyte_body_truncates_without_panicking() {
        let server = MockServer::start().await;
        // Byte 200 of this body falls inside the em dash.
        let body = format!("{}—and more", "x".repeat(199));
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string(body))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("rust").await;
        match &result {
            Err(YouTubeError::Api { code: 500, message }) => {
                assert!(message.contains(&"x".repeat(199)), "got: {message}");
                assert!(!message.contains('—'));
            }
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_items_yields_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let client = YouTubeClient::with_base_url(Client::new(), &server.uri());
        let results = client.search("rust").await.unwrap();
        assert!(results.is_empty());
    }
}
