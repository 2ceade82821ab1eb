use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::customsearch::CustomSearchClient;
use crate::search;
use crate::youtube::YouTubeClient;

pub struct AppState {
    pub youtube: YouTubeClient,
    pub customsearch: CustomSearchClient,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Build the application router. CORS is permissive: the browser client is
/// served from a different origin.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/search", post(search_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// One endpoint: fan the term out to both providers and return the ranked
/// merge. Every fetcher failure collapses to a generic 500 with a message;
/// the client is not told which provider failed or why.
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    info!(term = %request.term, "search");

    match search::search(&state.youtube, &state.customsearch, &request.term).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            warn!(error = %e, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
