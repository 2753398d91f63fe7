//! HTTP search endpoint
//!
//! Exposes `POST /search`, which takes `{ "searchId": 1, "searchText":
//! "bondi" }` and answers with the resolved location and price summary.
//! Malformed bodies are rejected by the JSON extractor; everything else gets
//! a summary, even if every site was unreachable. When a static directory is
//! configured, every other path is served from it.

mod search;

pub use search::{SearchRequest, SearchResponse, SearchService};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Builds the search router, with `static_dir` as the fallback for other paths
pub fn router(service: Arc<SearchService>, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/search", post(search_handler))
        .with_state(service);

    if let Some(dir) = static_dir {
        if !dir.is_dir() {
            tracing::warn!("Static directory {} does not exist", dir.display());
        }
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http())
}

async fn search_handler(
    State(service): State<Arc<SearchService>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    if request.search_text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "searchText cannot be empty".to_string(),
        ));
    }

    Ok(Json(service.search(request).await))
}

/// Serves the search endpoint until the process is stopped
pub async fn serve(
    service: Arc<SearchService>,
    port: u16,
    static_dir: Option<&Path>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service, static_dir)).await
}
