use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use dashmap::DashMap;
use tower_http::trace::TraceLayer;

use crate::{
    routes,
    session::{ReviewSession, SessionId},
    srs::Clock,
    store::CardStore,
    translate::Translator,
};

pub struct AppState {
    pub store: CardStore,
    pub active_sessions: DashMap<SessionId, ReviewSession>,
    pub clock: Arc<dyn Clock>,
    pub translator: Translator,
    pub import_delay: Duration,
}

impl AppState {
    pub fn new(
        store: CardStore,
        clock: Arc<dyn Clock>,
        translator: Translator,
        import_delay: Duration,
    ) -> Self {
        Self {
            store,
            active_sessions: DashMap::new(),
            clock,
            translator,
            import_delay,
        }
    }
}

pub fn init_router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/stats", get(routes::stats))
        .route("/translate", get(routes::translate))
        .route("/import", post(routes::bulk_import))
        .route(
            "/cards",
            get(routes::list_cards).post(routes::create_card),
        )
        .route(
            "/cards/{id}",
            get(routes::get_card)
                .put(routes::update_card)
                .delete(routes::delete_card),
        )
        .route(
            "/backup",
            get(routes::export_backup)
                .post(routes::restore_backup)
                .delete(routes::clear_cards),
        )
        .route("/sessions", post(routes::start_session))
        .route(
            "/sessions/{id}",
            get(routes::get_session).delete(routes::end_session),
        )
        .route("/sessions/{id}/grade", post(routes::grade_card))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
