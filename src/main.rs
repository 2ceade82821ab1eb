mod customsearch;
mod ranking;
mod results;
mod search;
mod server;
mod youtube;

pub const USER_AGENT: &str = concat!("medley/", env!("CARGO_PKG_VERSION"));

const DEFAULT_PORT: u16 = 5000;

use std::env;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use customsearch::CustomSearchClient;
use server::AppState;
use youtube::YouTubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medley=info".parse()?),
        )
        .init();

    let http = reqwest::Client::new();
    let state = Arc::new(AppState {
        youtube: YouTubeClient::from_env(http.clone()),
        customsearch: CustomSearchClient::from_env(http),
    });

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = format!("0.0.0.0:{port}");
    info!("medley search server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
