//! Application configuration, read from the environment.
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Clone, Debug)]
pub struct TranslateConfig {
    pub api_url: String,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_path: PathBuf,
    pub translate: TranslateConfig,
    pub import_delay: Duration,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .parse()
        .with_context(|| format!("Invalid value for {key}"))
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: parse_var("HANZICARDS_BIND", "0.0.0.0:8000")?,
            data_path: var_or("HANZICARDS_DATA", "cards.json").into(),
            translate: TranslateConfig {
                api_url: var_or("TRANSLATE_API_URL", DEFAULT_TRANSLATE_URL),
                source_lang: var_or("TRANSLATE_SOURCE_LANG", "zh-CN"),
                target_lang: var_or("TRANSLATE_TARGET_LANG", "vi"),
                timeout_secs: parse_var("TRANSLATE_TIMEOUT_SECS", "10")?,
            },
            import_delay: Duration::from_millis(parse_var("IMPORT_DELAY_MS", "1000")?),
        })
    }
}
