use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{errors::ApiError, models::Card, router::AppState};

fn backup_filename(date: NaiveDate) -> String {
    format!("chinese_srs_backup_{}.json", date.format("%Y-%m-%d"))
}

fn parse_backup(body: &[u8]) -> Result<Vec<Card>, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBackup(e.to_string()))?;
    if !value.is_array() {
        return Err(ApiError::InvalidBackup("expected a JSON array of cards".to_string()));
    }
    serde_json::from_value(value).map_err(|e| ApiError::InvalidBackup(e.to_string()))
}

pub async fn export_backup(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let today = state.clock.now()?.date_naive();
    let cards = state.store.get_all().await;
    let json = serde_json::to_string_pretty(&cards).map_err(anyhow::Error::from)?;
    info!("Exporting {} cards", cards.len());
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", backup_filename(today)),
        )
        .body(json.into())?;

    Ok(response)
}

// Replaces every card with the uploaded ones
pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let cards = parse_backup(&body)?;
    let restored = state.store.restore(cards).await?;
    state.active_sessions.clear();
    info!("Restored {} cards from backup", restored);
    Ok(Json(serde_json::json!({ "restored": restored })))
}

pub async fn clear_cards(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.store.clear().await?;
    state.active_sessions.clear();
    warn!("All cards deleted");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod test {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use chrono::NaiveDate;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::test::{add_card, send, test_app};

    #[test]
    fn test_backup_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(super::backup_filename(date), "chinese_srs_backup_2024-01-05.json");
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(super::parse_backup(br#"{"id": "x"}"#).is_err());
        assert!(super::parse_backup(b"not json").is_err());
        assert!(super::parse_backup(br#"[{"id": "x"}]"#).is_err());
        assert!(super::parse_backup(b"[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_then_restore() {
        let app = test_app();
        add_card(&app, "茶").await;
        add_card(&app, "水").await;

        let response = app
            .clone()
            .oneshot(Request::get("/backup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"chinese_srs_backup_2024-06-15.json\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let exported: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(exported.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "DELETE", "/backup", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, stats) = send(&app, "GET", "/stats", None).await;
        assert_eq!(stats["total"], 0);

        let (status, body) = send(&app, "POST", "/backup", Some(exported.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["restored"], 2);
        let (_, cards) = send(&app, "GET", "/cards", None).await;
        assert_eq!(cards[1], exported[0]);
    }

    #[tokio::test]
    async fn test_restore_invalid_keeps_cards() {
        let app = test_app();
        add_card(&app, "饭").await;
        let (status, body) = send(&app, "POST", "/backup", Some(json!({"cards": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        let (_, stats) = send(&app, "GET", "/stats", None).await;
        assert_eq!(stats["total"], 1);
    }

    #[tokio::test]
    async fn test_restore_duplicate_ids_rejected() {
        let app = test_app();
        let kept = add_card(&app, "米").await;
        let record = json!({
            "id": "same", "hanzi": "一", "pinyin": "yī", "vietnamese": "một",
            "reps": 0, "interval": 0, "ef": 2.5, "nextReview": "2024-01-01T00:00:00Z"
        });
        let (status, body) = send(&app, "POST", "/backup", Some(json!([record, record]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        let (_, cards) = send(&app, "GET", "/cards", None).await;
        assert_eq!(cards, json!([kept]));
    }
}
