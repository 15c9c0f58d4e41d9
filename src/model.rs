//! Flashcard entities: cards, decks, and what ingestion produces.

use crate::pipeline::encode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DeckId = Uuid;
pub type CardId = Uuid;
pub type UserId = String;

/// A card is mastered once its progress reaches this many correct answers in a row.
pub const MASTERY_THRESHOLD: u32 = 3;

/// One student name recovered from a page's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub first_name: String,
    pub last_name: String,
    /// `"First Last"`.
    pub full_name: String,
}

impl NameRecord {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let full_name = format!("{first_name} {last_name}");
        Self {
            first_name,
            last_name,
            full_name,
        }
    }
}

/// A name paired with its cropped, JPEG-encoded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCard {
    pub name: String,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// Image as a `data:` URL.
    pub image: String,
    pub progress: u32,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image: image.into(),
            progress: 0,
            created_at: Utc::now(),
        }
    }

    /// Fresh, unpractised card for an extracted roster entry.
    pub fn from_extracted(card: ExtractedCard) -> Self {
        Self::new(card.name, encode::jpeg_data_url(&card.image))
    }

    pub fn is_mastered(&self) -> bool {
        self.progress >= MASTERY_THRESHOLD
    }

    /// Self-graded practice answer: a hit adds one, a miss starts over.
    pub fn record_answer(&mut self, correct: bool) {
        if correct {
            self.progress = self.progress.saturating_add(1);
        } else {
            self.progress = 0;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub user_id: UserId,
    pub name: String,
    pub cards: Vec<Card>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>, cards: Vec<Card>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            cards,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn stats(&self) -> DeckStats {
        let total_cards = self.cards.len();
        let mastered_count = self.cards.iter().filter(|c| c.is_mastered()).count();
        let mastered_percent = if total_cards == 0 {
            0
        } else {
            ((mastered_count as f64 / total_cards as f64) * 100.0).round() as u32
        };
        DeckStats {
            total_cards,
            mastered_count,
            mastered_percent,
        }
    }

    /// Cards to drill, optionally leaving out the mastered ones.
    pub fn practice_cards(&self, hide_mastered: bool) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| !hide_mastered || !c.is_mastered())
            .collect()
    }

    /// The card list with every progress counter back at zero, ready for a bulk replace.
    pub fn reset_progress(&self) -> Vec<Card> {
        self.cards
            .iter()
            .cloned()
            .map(|mut c| {
                c.progress = 0;
                c
            })
            .collect()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_cards: usize,
    pub mastered_count: usize,
    pub mastered_percent: u32,
}
