//! Fan-out orchestration: run both fetchers for one term, merge, rank.

use crate::customsearch::{CustomSearchClient, CustomSearchError};
use crate::ranking;
use crate::results::SearchResult;
use crate::youtube::{YouTubeClient, YouTubeError};

/// Abstraction over the video-search provider. Implemented by
/// `YouTubeClient` for production; mock implementations used in tests.
pub trait VideoSearch {
    async fn search(&self, term: &str) -> Result<Vec<SearchResult>, YouTubeError>;
}

/// Abstraction over the web-search provider. Implemented by
/// `CustomSearchClient` for production; mock implementations used in tests.
pub trait WebSearch {
    async fn search(&self, term: &str) -> Result<Vec<SearchResult>, CustomSearchError>;
}

impl VideoSearch for YouTubeClient {
    async fn search(&self, term: &str) -> Result<Vec<SearchResult>, YouTubeError> {
        YouTubeClient::search(self, term).await
    }
}

impl WebSearch for CustomSearchClient {
    async fn search(&self, term: &str) -> Result<Vec<SearchResult>, CustomSearchError> {
        CustomSearchClient::search(self, term).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Video(#[from] YouTubeError),

    #[error("{0}")]
    Web(#[from] CustomSearchError),
}

/// Run both fetchers concurrently, concatenate video results first, then
/// rank. Either fetcher failing fails the whole search; there is no
/// partial-result mode.
pub async fn search(
    videos: &impl VideoSearch,
    web: &impl WebSearch,
    term: &str,
) -> Result<Vec<SearchResult>, SearchError> {
    let (mut results, articles) = tokio::try_join!(
        async { videos.search(term).await.map_err(SearchError::from) },
        async { web.search(term).await.map_err(SearchError::from) },
    )?;
    results.extend(articles);
    ranking::rank(&mut results);
    Ok(results)
}
