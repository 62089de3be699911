mod backup;
mod cards;
mod review;

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::{
    errors::ApiError,
    import,
    models::CardStats,
    router::AppState,
    session::select_due,
};

pub use backup::{clear_cards, export_backup, restore_backup};
pub use cards::{create_card, delete_card, get_card, list_cards, update_card};
pub use review::{end_session, get_session, grade_card, start_session};

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "cards": state.store.len().await,
        "activeSessions": state.active_sessions.len()
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now()?;
    let cards = state.store.get_all().await;
    Ok(Json(CardStats {
        total: cards.len(),
        due: select_due(&cards, &now).len(),
    }))
}

#[derive(Deserialize)]
pub struct TranslateQuery {
    pub text: String,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranslateQuery>,
) -> impl IntoResponse {
    let text = query.text.trim();
    let suggestion = if text.is_empty() {
        None
    } else {
        state.translator.lookup(text).await
    };
    Json(suggestion)
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub text: String,
}

pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now()?.with_timezone(&Utc);
    let imported = import::bulk_import(
        &state.store,
        &state.translator,
        &form.text,
        state.import_delay,
        now,
    )
    .await?;
    info!("Bulk import added {} cards", imported);
    Ok(Json(serde_json::json!({ "imported": imported })))
}
