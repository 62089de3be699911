//! Card persistence: an ordered collection kept in memory and mirrored to a
//! JSON file after every write.
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{Card, CardContent, CardId, Schedule};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("card {0} not found")]
    NotFound(CardId),
    #[error("card id {0} appears more than once")]
    DuplicateId(CardId),
    #[error("I/O error on card file: {0}")]
    Io(#[from] std::io::Error),
    #[error("card file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct CardStore {
    cards: RwLock<Vec<Card>>,
    path: Option<PathBuf>,
}

impl CardStore {
    pub fn in_memory() -> Self {
        Self {
            cards: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Opens the card file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let cards = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let cards = serde_json::from_slice::<Vec<Card>>(&bytes)?;
                check_unique(&cards)?;
                cards
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No card file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!("Loaded {} cards from {}", cards.len(), path.display());
        Ok(Self {
            cards: RwLock::new(cards),
            path: Some(path),
        })
    }

    async fn persist(&self, cards: &[Card]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec(cards)?;
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Saved {} cards to {}", cards.len(), path.display());
        Ok(())
    }

    pub async fn get_all(&self) -> Vec<Card> {
        self.cards.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn get(&self, id: &CardId) -> Result<Card, StoreError> {
        self.cards
            .read()
            .await
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Writes `next` to disk and only then makes it the live collection, so a
    /// failed write leaves both unchanged.
    async fn commit(&self, cards: &mut Vec<Card>, next: Vec<Card>) -> Result<(), StoreError> {
        self.persist(&next).await?;
        *cards = next;
        Ok(())
    }

    pub async fn create(
        &self,
        content: CardContent,
        now: DateTime<Utc>,
    ) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;
        let card = Card::new(content, now);
        let mut next = cards.clone();
        next.push(card.clone());
        self.commit(&mut cards, next).await?;
        Ok(card)
    }

    async fn modify<F>(&self, id: &CardId, f: F) -> Result<Card, StoreError>
    where
        F: FnOnce(&mut Card),
    {
        let mut cards = self.cards.write().await;
        let mut next = cards.clone();
        let card = next
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        f(card);
        let card = card.clone();
        self.commit(&mut cards, next).await?;
        Ok(card)
    }

    /// Replaces the content fields of a card, leaving its schedule alone.
    pub async fn update_content(
        &self,
        id: &CardId,
        content: CardContent,
    ) -> Result<Card, StoreError> {
        self.modify(id, |card| card.content = content).await
    }

    /// Recomputes a card's schedule from its stored state while holding the
    /// write lock, so two gradings of one card never start from the same
    /// snapshot.
    pub async fn reschedule<F>(&self, id: &CardId, f: F) -> Result<Card, StoreError>
    where
        F: FnOnce(&Card) -> Schedule,
    {
        self.modify(id, |card| card.schedule = f(card)).await
    }

    pub async fn delete(&self, id: &CardId) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let next: Vec<Card> = cards.iter().filter(|c| &c.id != id).cloned().collect();
        if next.len() == cards.len() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.commit(&mut cards, next).await
    }

    /// Replaces the whole collection, as when restoring a backup. Ids must be
    /// unique.
    pub async fn restore(&self, restored: Vec<Card>) -> Result<usize, StoreError> {
        check_unique(&restored)?;
        let mut cards = self.cards.write().await;
        self.commit(&mut cards, restored).await?;
        Ok(cards.len())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.restore(Vec::new()).await.map(|_| ())
    }
}

fn check_unique(cards: &[Card]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(cards.len());
    for card in cards {
        if !seen.insert(&card.id) {
            return Err(StoreError::DuplicateId(card.id.clone()));
        }
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
