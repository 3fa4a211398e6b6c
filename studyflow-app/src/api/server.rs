use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{
    deck_cards, health, list_decks, progress_preview, quiz_analyze, quiz_generate, retrieve,
    stats, AppState,
};
use crate::services::AppServices;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/decks", get(list_decks))
        .route("/decks/:deck/cards", get(deck_cards))
        .route("/stats", get(stats))
        .route("/retrieve", post(retrieve))
        .route("/quiz/generate", post(quiz_generate))
        .route("/quiz/analyze", post(quiz_analyze))
        .route("/progress/preview", post(progress_preview))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(services: AppServices, addr: SocketAddr) -> anyhow::Result<()> {
    let tutor_kind = services.tutor.kind();
    let app = router(AppState {
        repo: services.repo,
        tutor: services.tutor,
    });

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, tutor = tutor_kind, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
