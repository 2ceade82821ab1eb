use serde::Deserialize;

/// Response from `GET /search?part=snippet&type=video`.
#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    pub items: Option<Vec<SearchItem>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: VideoId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Snippet {
    pub title: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: Option<String>,
}

/// Response from `GET /videos?part=statistics&id={id}`.
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    pub items: Option<Vec<VideoItem>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct VideoItem {
    pub statistics: Option<Statistics>,
}

/// Engagement counts arrive as decimal strings on the wire. `likeCount` is
/// absent when the channel hides likes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}

/// Minimal envelope for structured error bodies on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
}
