use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::{
    errors::ApiError,
    models::{CardContent, CardId},
    router::AppState,
};

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn check_content(content: CardContent) -> Result<CardContent, ApiError> {
    let content = CardContent {
        source: content.source.trim().to_string(),
        phonetic: content.phonetic.trim().to_string(),
        translation: content.translation.trim().to_string(),
    };
    if content.source.is_empty() {
        return Err(ApiError::InvalidCard("hanzi must not be empty".to_string()));
    }
    Ok(content)
}

// Newest first, optionally filtered by a search term
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let needle = query.q.unwrap_or_default();
    let needle = needle.trim();
    let cards: Vec<_> = state
        .store
        .get_all()
        .await
        .into_iter()
        .rev()
        .filter(|c| needle.is_empty() || c.content.matches(needle))
        .collect();
    Json(cards)
}

pub async fn create_card(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CardContent>,
) -> Result<impl IntoResponse, ApiError> {
    let content = check_content(form)?;
    let now = state.clock.now()?.with_timezone(&Utc);
    let card = state.store.create(content, now).await?;
    info!("Created card {} ({})", card.id, card.content.source);
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.store.get(&CardId::from(id)).await?;
    Ok(Json(card))
}

// Edits only the content fields; the review schedule is kept
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<CardContent>,
) -> Result<impl IntoResponse, ApiError> {
    let content = check_content(form)?;
    let card = state
        .store
        .update_content(&CardId::from(id), content)
        .await?;
    info!("Updated card {}", card.id);
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = CardId::from(id);
    state.store.delete(&id).await?;
    for mut session in state.active_sessions.iter_mut() {
        session.forget(&id);
    }
    info!("Deleted card {}", id);
    Ok(StatusCode::OK)
}
