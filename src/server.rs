use crate::config::AppConfig;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub struct AppState {
    pub html: String,
    pub file_name: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let download_path = format!("/{}", state.file_name);
    Router::new()
        .route("/", get(view_handler))
        .route(&download_path, get(download_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves a map previously written by `generate`.
pub async fn start_server(config: AppConfig, map_path: &Path) -> Result<()> {
    let html = tokio::fs::read_to_string(map_path)
        .await
        .with_context(|| {
            format!("Failed to read generated map {:?}; run `generate` first", map_path)
        })?;
    let file_name = map_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(crate::config::DEFAULT_OUTPUT)
        .to_string();

    let state = Arc::new(AppState { html, file_name });
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));

    info!("Serving map on http://{}", addr);
    info!("Download at http://{}/{}", addr, state.file_name);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn view_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.html.clone())
}

async fn download_handler(State(state): State<Arc<AppState>>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", state.file_name),
            ),
        ],
        state.html.clone(),
    )
        .into_response()
}
