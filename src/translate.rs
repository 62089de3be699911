//! Auto-fill suggestions from a web translation endpoint.
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TranslateConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub pinyin: String,
    #[serde(rename = "vietnamese")]
    pub translation: String,
}

pub struct Translator {
    client: Client,
    config: TranslateConfig,
}

impl Translator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    async fn fetch(&self, text: &str) -> Result<Suggestion> {
        let resp = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.config.source_lang.as_str()),
                ("tl", self.config.target_lang.as_str()),
                ("dt", "t"),
                ("dt", "rm"),
                ("q", text),
            ])
            .send()
            .await
            .context("Network error")?
            .error_for_status()
            .context("Translation service error")?;
        let data: serde_json::Value = resp.json().await.context("Parse error")?;
        Ok(parse_response(&data))
    }

    /// Looks up a suggestion for `text`. Any failure yields `None`; a missing
    /// suggestion must never block adding or editing a card.
    pub async fn lookup(&self, text: &str) -> Option<Suggestion> {
        match self.fetch(text).await {
            Ok(suggestion) => {
                debug!("Suggestion for {}: {:?}", text, suggestion);
                Some(suggestion)
            }
            Err(e) => {
                warn!("Translation lookup for {} failed: {:#}", text, e);
                None
            }
        }
    }
}

/// Reads the `translate_a/single` payload: translated segments are the first
/// element of each entry in `data[0]`, and the last entry carries the
/// romanization at index 2 (or 3).
fn parse_response(data: &serde_json::Value) -> Suggestion {
    let mut translation = String::new();
    let mut pinyin = String::new();
    if let Some(segments) = data.get(0).and_then(|v| v.as_array()) {
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(|v| v.as_str()) {
                translation.push_str(part);
            }
        }
        if let Some(last) = segments.last().and_then(|v| v.as_array()) {
            pinyin = [2, 3]
                .iter()
                .filter_map(|&i| last.get(i).and_then(|v| v.as_str()))
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();
        }
    }
    Suggestion {
        pinyin,
        translation,
    }
}
