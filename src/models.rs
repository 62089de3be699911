use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_EF: f64 = 2.5;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
#[serde(transparent)]
pub struct CardId(pub(crate) String);

impl CardId {
    pub fn generate() -> Self {
        CardId(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        CardId(s)
    }
}

/// User-editable side of a card. The scheduler never touches these.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct CardContent {
    #[serde(rename = "hanzi")]
    pub source: String,
    #[serde(rename = "pinyin")]
    pub phonetic: String,
    #[serde(rename = "vietnamese")]
    pub translation: String,
}

impl CardContent {
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.source.to_lowercase().contains(&needle)
            || self.phonetic.to_lowercase().contains(&needle)
            || self.translation.to_lowercase().contains(&needle)
    }
}

/// Technical fields owned by the scheduler.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Schedule {
    pub reps: u32,
    pub interval: u32,
    pub ef: f64,
    #[serde(rename = "nextReview")]
    pub next_review: DateTime<Utc>,
}

impl Schedule {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            reps: 0,
            interval: 0,
            ef: INITIAL_EF,
            next_review: now,
        }
    }
}

/// A flashcard. Serializes as the flat backup record
/// `{id, hanzi, pinyin, vietnamese, reps, interval, ef, nextReview}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Card {
    pub id: CardId,
    #[serde(flatten)]
    pub content: CardContent,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl Card {
    pub fn new(content: CardContent, now: DateTime<Utc>) -> Self {
        Self {
            id: CardId::generate(),
            content,
            schedule: Schedule::new(now),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.next_review <= now
    }
}

#[derive(Serialize)]
pub struct CardStats {
    pub total: usize,
    pub due: usize,
}
