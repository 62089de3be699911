use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::ApiError,
    router::AppState,
    session::{ReviewSession, SessionId},
    srs::{Grade, calculate},
    store::StoreError,
};

#[derive(Deserialize)]
pub struct GradeRequest {
    pub grade: Grade,
}

fn session_json(session: &ReviewSession) -> serde_json::Value {
    serde_json::json!({
        "id": session.id,
        "cursor": session.cursor(),
        "total": session.len(),
        "view": session.view(),
    })
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now()?;
    let cards = state.store.get_all().await;
    let session = ReviewSession::start(&cards, &now);
    info!(
        "Starting review session {} with {} of {} cards due",
        session.id,
        session.len(),
        cards.len()
    );
    let body = session_json(&session);
    state.active_sessions.insert(session.id, session);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .active_sessions
        .get(&SessionId(id))
        .ok_or(ApiError::SessionNotFound)?;
    Ok(Json(session_json(&session)))
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, session) = state
        .active_sessions
        .remove(&SessionId(id))
        .ok_or(ApiError::SessionNotFound)?;
    info!(
        "Ended review session {} after {} of {} cards (complete: {})",
        session.id,
        session.cursor(),
        session.len(),
        session.is_exhausted()
    );
    Ok(StatusCode::OK)
}

/// Grades the session's current card and moves the session on.
///
/// The card is claimed by advancing the cursor before the store is touched, so
/// two requests on one session never grade the same card. The schedule is
/// recomputed from the stored card rather than the session's snapshot.
pub async fn grade_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    form: Result<Json<GradeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = form.map_err(|e| ApiError::MalformedGrade(e.body_text()))?;
    let session_id = SessionId(id);
    if !form.grade.is_valid() {
        return Err(ApiError::InvalidGrade(form.grade.0));
    }
    let now = state.clock.now()?;

    // The shard guard must not be held across the store's await points.
    let card_id = state
        .active_sessions
        .get_mut(&session_id)
        .ok_or(ApiError::SessionNotFound)?
        .advance()
        .ok_or(ApiError::SessionExhausted)?;

    let updated = match state
        .store
        .reschedule(&card_id, |card| calculate(card, form.grade, &now).schedule)
        .await
    {
        Ok(card) => card,
        Err(e) => {
            if let Some(mut session) = state.active_sessions.get_mut(&session_id) {
                if matches!(e, StoreError::NotFound(_)) {
                    warn!("Card {} vanished during session {}", card_id, session_id);
                    session.forget(&card_id);
                } else {
                    session.rewind(&card_id);
                }
            }
            return Err(e.into());
        }
    };
    info!(
        "Graded card {} with {}: reps={} interval={} ef={:.2}",
        updated.id,
        form.grade.0,
        updated.schedule.reps,
        updated.schedule.interval,
        updated.schedule.ef
    );

    let session = state
        .active_sessions
        .get(&session_id)
        .ok_or(ApiError::SessionNotFound)?;
    Ok(Json(serde_json::json!({
        "card": updated,
        "session": session_json(&session),
    })))
}
