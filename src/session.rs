//! Due-card selection and the review session cursor.
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Card, CardId};

/// Cards whose next review is at or before `now`, in collection order.
pub fn select_due<'c, Tz: TimeZone>(
    cards: impl IntoIterator<Item = &'c Card>,
    now: &DateTime<Tz>,
) -> Vec<Card> {
    let now = now.with_timezone(&Utc);
    cards
        .into_iter()
        .filter(|card| card.is_due(now))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pass over the cards that were due when the session started.
#[derive(Debug)]
pub struct ReviewSession {
    pub id: SessionId,
    due: Vec<Card>,
    cursor: usize,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionView<'s> {
    /// Nothing was due when the session started.
    NothingDue,
    Reviewing {
        card: &'s Card,
        position: usize,
        total: usize,
    },
    Complete {
        reviewed: usize,
    },
}

impl ReviewSession {
    pub fn start<'c, Tz: TimeZone>(
        cards: impl IntoIterator<Item = &'c Card>,
        now: &DateTime<Tz>,
    ) -> Self {
        Self {
            id: SessionId(Uuid::new_v4()),
            due: select_due(cards, now),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Card> {
        self.due.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.due.len()
    }

    pub fn view(&self) -> SessionView<'_> {
        match self.current() {
            Some(card) => SessionView::Reviewing {
                card,
                position: self.cursor,
                total: self.due.len(),
            },
            None if self.due.is_empty() => SessionView::NothingDue,
            None => SessionView::Complete {
                reviewed: self.due.len(),
            },
        }
    }

    /// Moves past the current card. Returns the id of the card left behind,
    /// or `None` if the session was already exhausted.
    pub fn advance(&mut self) -> Option<CardId> {
        let id = self.current()?.id.clone();
        self.cursor += 1;
        Some(id)
    }

    /// Steps back onto `id` if it is the card most recently advanced past.
    pub fn rewind(&mut self, id: &CardId) -> bool {
        let last = self.cursor.checked_sub(1).and_then(|i| self.due.get(i));
        if last.is_some_and(|c| &c.id == id) {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Drops a card the store no longer has so the cursor does not point at it.
    pub fn forget(&mut self, id: &CardId) {
        if let Some(pos) = self.due.iter().position(|c| &c.id == id) {
            self.due.remove(pos);
            if pos < self.cursor {
                self.cursor -= 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{CardContent, Schedule};
    use chrono::{Duration, FixedOffset};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 9, 1, 9, 0, 0)
            .unwrap()
    }

    fn card(id: &str, next_review: DateTime<Utc>) -> Card {
        Card {
            id: CardId::from(id.to_string()),
            content: CardContent {
                source: id.to_string(),
                ..Default::default()
            },
            schedule: Schedule::new(next_review),
        }
    }

    fn deck() -> Vec<Card> {
        let now = now().with_timezone(&Utc);
        vec![
            card("a", now - Duration::days(3)),
            card("b", now + Duration::days(1)),
            card("c", now),
            card("d", now + Duration::seconds(1)),
            card("e", now - Duration::seconds(1)),
        ]
    }

    fn ids(cards: &[Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_select_due_keeps_order() {
        let due = select_due(&deck(), &now());
        assert_eq!(ids(&due), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_select_due_is_idempotent() {
        let cards = deck();
        assert_eq!(select_due(&cards, &now()), select_due(&cards, &now()));
    }

    #[test]
    fn test_select_due_inclusion() {
        let cards = deck();
        let due = select_due(&cards, &now());
        let now = now().with_timezone(&Utc);
        for c in &cards {
            assert_eq!(due.contains(c), c.schedule.next_review <= now);
        }
    }

    #[test]
    fn test_session_walk() {
        let mut session = ReviewSession::start(&deck(), &now());
        assert_eq!(session.len(), 3);
        assert!(matches!(
            session.view(),
            SessionView::Reviewing { position: 0, total: 3, .. }
        ));
        assert_eq!(session.advance().unwrap().to_string(), "a");
        assert_eq!(session.current().unwrap().id.to_string(), "c");
        session.advance();
        session.advance();
        assert!(session.is_exhausted());
        assert_eq!(session.view(), SessionView::Complete { reviewed: 3 });
        assert_eq!(session.advance(), None);
        assert_eq!(session.cursor(), 3);
    }

    #[test]
    fn test_empty_session() {
        let cards = vec![card("x", now().with_timezone(&Utc) + Duration::days(2))];
        let session = ReviewSession::start(&cards, &now());
        assert_eq!(session.view(), SessionView::NothingDue);
        assert!(session.is_exhausted());
    }

    #[test]
    fn test_forget_keeps_cursor_on_next_card() {
        let mut session = ReviewSession::start(&deck(), &now());
        session.advance();
        session.forget(&CardId::from("a".to_string()));
        assert_eq!(session.current().unwrap().id.to_string(), "c");
        session.forget(&CardId::from("c".to_string()));
        assert_eq!(session.current().unwrap().id.to_string(), "e");
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_rewind_only_undoes_the_last_advance() {
        let mut session = ReviewSession::start(&deck(), &now());
        let a = session.advance().unwrap();
        let c = session.advance().unwrap();
        assert!(!session.rewind(&a));
        assert_eq!(session.cursor(), 2);
        assert!(session.rewind(&c));
        assert_eq!(session.current().unwrap().id, c);
        assert!(!session.rewind(&c));
        assert!(session.rewind(&a));
        assert!(!session.rewind(&a));
        assert_eq!(session.cursor(), 0);
    }
}
