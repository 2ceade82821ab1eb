use serde::Deserialize;

/// Response from `GET /customsearch/v1`. `items` is absent entirely when the
/// query matches nothing.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub items: Option<Vec<Item>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct Item {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub pagemap: Option<PageMap>,
}

/// Nested page metadata; a preview image lives under `cse_image` when the
/// indexed page declared one.
#[derive(Debug, Deserialize)]
pub struct PageMap {
    pub cse_image: Option<Vec<CseImage>>,
}

#[derive(Debug, Deserialize)]
pub struct CseImage {
    pub src: Option<String>,
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
