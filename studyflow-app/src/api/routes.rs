use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use studyflow_core::{study_queue, CoreError, Repository, StudySessionProgress};
use studyflow_tutor::{
    AnalysisRequest, ContextResponse, FeedbackResponse, HealthResponse, QueryRequest,
    QuizRequest, QuizResponse, TutorError, TutorService,
};
use tracing::warn;

use crate::api::dto::{CardOut, CardsQuery, DeckOut, ProgressPreviewIn, StatsQuery};
use crate::services::{resolve_deck, stats_report, StatsReport};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub tutor: Arc<TutorService>,
}

fn core_status(e: CoreError) -> StatusCode {
    match e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn tutor_status(e: TutorError) -> StatusCode {
    warn!(error = %e, "tutor request failed");
    match e {
        TutorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        TutorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

pub async fn health(State(st): State<Arc<AppState>>) -> Result<Json<HealthResponse>, StatusCode> {
    st.tutor.health().await.map(Json).map_err(tutor_status)
}

pub async fn list_decks(State(st): State<Arc<AppState>>) -> Result<Json<Vec<DeckOut>>, StatusCode> {
    let mut decks = st.repo.list_decks().await.map_err(core_status)?;
    decks.sort_by_key(|d| d.created_at);
    Ok(Json(decks.into_iter().map(DeckOut::from).collect()))
}

/// Study queue for a deck: unsuspended cards in creation order.
pub async fn deck_cards(
    State(st): State<Arc<AppState>>,
    Path(deck): Path<String>,
    Query(q): Query<CardsQuery>,
) -> Result<Json<Vec<CardOut>>, StatusCode> {
    let deck = resolve_deck(&*st.repo, &deck)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let cards = st.repo.list_cards(Some(deck.id)).await.map_err(core_status)?;
    let queue = study_queue(&cards, q.tag.as_deref(), q.max.unwrap_or(usize::MAX));
    Ok(Json(queue.into_iter().map(CardOut::from).collect()))
}

pub async fn stats(
    State(st): State<Arc<AppState>>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<StatsReport>, StatusCode> {
    let deck_id = match q.deck {
        Some(sel) => Some(
            resolve_deck(&*st.repo, &sel)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?
                .id,
        ),
        None => None,
    };
    stats_report(&*st.repo, deck_id).await.map(Json).map_err(core_status)
}

pub async fn retrieve(
    State(st): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<ContextResponse>, StatusCode> {
    st.tutor.retrieve(&body).await.map(Json).map_err(tutor_status)
}

pub async fn quiz_generate(
    State(st): State<Arc<AppState>>,
    Json(body): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, StatusCode> {
    st.tutor.generate_quiz(&body).await.map(Json).map_err(tutor_status)
}

pub async fn quiz_analyze(
    State(st): State<Arc<AppState>>,
    Json(body): Json<AnalysisRequest>,
) -> Result<Json<FeedbackResponse>, StatusCode> {
    st.tutor.analyze(&body).await.map(Json).map_err(tutor_status)
}

/// Applies each op in order; the first invalid op rejects the whole request.
pub async fn progress_preview(
    Json(body): Json<ProgressPreviewIn>,
) -> Result<Json<StudySessionProgress>, StatusCode> {
    let mut p = StudySessionProgress::initial(body.total_cards, body.subject).map_err(core_status)?;
    for op in &body.ops {
        p = p.apply(op).map_err(core_status)?;
    }
    Ok(Json(p))
}
