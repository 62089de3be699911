use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{models::CardContent, store::CardStore, translate::Translator};

const SEPARATORS: [char; 3] = [',', '\n', '，'];

fn split_terms(text: &str) -> Vec<&str> {
    text.split(SEPARATORS)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect()
}

/// Adds one card per term in `text`, filling pinyin and translation from the
/// translator. Terms without a suggestion are skipped. Lookups are spaced by
/// `delay` to stay under the translation service's rate limit.
///
/// A store failure stops the import. Cards created before it are kept, and
/// the error names how many there were.
pub async fn bulk_import(
    store: &CardStore,
    translator: &Translator,
    text: &str,
    delay: Duration,
    now: DateTime<Utc>,
) -> Result<usize> {
    let terms = split_terms(text);
    info!("Bulk importing {} terms", terms.len());
    let mut imported = 0;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        match translator.lookup(term).await {
            Some(suggestion) => {
                let content = CardContent {
                    source: term.to_string(),
                    phonetic: suggestion.pinyin,
                    translation: suggestion.translation,
                };
                if let Err(e) = store.create(content, now).await {
                    error!("Import stopped at {} after {} cards: {}", term, imported, e);
                    return Err(e).with_context(|| {
                        format!("Import stopped after {} of {} terms", imported, terms.len())
                    });
                }
                imported += 1;
            }
            None => warn!("Skipping {}: no suggestion", term),
        }
    }
    info!("Imported {} of {} terms", imported, terms.len());
    Ok(imported)
}

#[cfg(test)]
mod test {
    use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use crate::{config::TranslateConfig, models::Card, store::CardStore, translate::Translator};

    type Responder = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

    /// Serves `translate_a/single` locally, answering each `q` with
    /// `respond`, or a 500 when it returns `None`.
    async fn local_translator(respond: Responder) -> Translator {
        let app = Router::new().route(
            "/translate_a/single",
            get(move |Query(params): Query<Vec<(String, String)>>| async move {
                let term = params
                    .iter()
                    .find(|(key, _)| key == "q")
                    .map(|(_, value)| value.as_str())
                    .unwrap_or_default();
                (*respond)(term)
                    .map(Json)
                    .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Translator::new(TranslateConfig {
            api_url: format!("http://{addr}/translate_a/single"),
            source_lang: "zh-CN".to_string(),
            target_lang: "vi".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn payload(translation: &str, pinyin: &str) -> Value {
        json!([[[translation, "x"], [null, null, pinyin, ""]]])
    }

    fn disk_cards(path: &Path) -> Vec<Card> {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_import_fills_from_suggestions() {
        let translator = local_translator(Arc::new(|term: &str| match term {
            "你好" => Some(payload("xin chào", "nǐ hǎo")),
            _ => None,
        }))
        .await;
        let store = CardStore::in_memory();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let imported = super::bulk_import(&store, &translator, "坏，你好", Duration::ZERO, now)
            .await
            .unwrap();
        assert_eq!(imported, 1);
        let cards = store.get_all().await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].content.source, "你好");
        assert_eq!(cards[0].content.phonetic, "nǐ hǎo");
        assert_eq!(cards[0].content.translation, "xin chào");
        assert_eq!(cards[0].schedule.next_review, now);
    }

    #[tokio::test]
    async fn test_import_reports_partial_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let blocker = dir.path().join("cards.json.tmp");
        let translator = local_translator(Arc::new(move |term: &str| {
            if term == "二" {
                // later saves fail once the temp file's place is taken
                std::fs::create_dir(&blocker).unwrap();
            }
            Some(payload(term, term))
        }))
        .await;
        let store = CardStore::open(&path).await.unwrap();

        let err = super::bulk_import(&store, &translator, "一,二,三", Duration::ZERO, Utc::now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 1 of 3 terms"), "{err:#}");
        let cards = store.get_all().await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].content.source, "一");
        assert_eq!(disk_cards(&path), cards);
    }

    #[test]
    fn test_split_terms() {
        let terms = super::split_terms("你好, 谢谢\n\n朋友，学习 ,,\n  再见  ");
        assert_eq!(terms, vec!["你好", "谢谢", "朋友", "学习", "再见"]);
    }

    #[test]
    fn test_split_blank() {
        assert!(super::split_terms(" ,\n，").is_empty());
    }
}
