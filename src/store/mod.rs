//! Deck persistence.
//!
//! [`DeckStore`] is the interface the rest of the crate uses to read and
//! write decks. Every call is scoped to the owning user: asking for another
//! user's deck is indistinguishable from asking for a deck that does not
//! exist.
//!
//! Two implementations ship with the crate:
//! - [`memory::MemoryDeckStore`] — process-local, for tests and embedding
//! - [`json::JsonDeckStore`] — a single JSON file with atomic rewrites

use crate::error::StoreError;
use crate::model::{Card, CardId, Deck, DeckId};
use async_trait::async_trait;

pub mod json;
pub mod memory;

pub use json::JsonDeckStore;
pub use memory::MemoryDeckStore;

/// Fields to replace on an existing deck. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DeckUpdate {
    pub name: Option<String>,
    /// Replaces the whole card list (shuffle, bulk progress reset).
    pub cards: Option<Vec<Card>>,
}

#[async_trait]
pub trait DeckStore: Send + Sync {
    /// The user's decks, most recently updated first.
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, StoreError>;
    async fn get_deck(&self, user_id: &str, deck_id: DeckId) -> Result<Deck, StoreError>;
    /// Exact-name lookup. When several decks share the name the oldest wins.
    async fn find_deck_by_name(&self, user_id: &str, name: &str)
        -> Result<Option<Deck>, StoreError>;
    async fn create_deck(
        &self,
        user_id: &str,
        name: &str,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError>;
    async fn update_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StoreError>;
    /// Removes the deck and every card in it.
    async fn delete_deck(&self, user_id: &str, deck_id: DeckId) -> Result<(), StoreError>;

    /// Append `cards` after the existing ones, preserving their order.
    async fn append_cards_to_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError>;
    /// Manual card entry. Name and image are both required.
    async fn add_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        name: &str,
        image: &str,
    ) -> Result<Deck, StoreError>;
    async fn set_card_progress(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
        progress: u32,
    ) -> Result<Deck, StoreError>;
    async fn delete_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<Deck, StoreError>;
}

/// In-memory deck collection shared by both stores.
///
/// All mutation rules live here so the two backends cannot drift apart; the
/// stores only add locking and (for JSON) persistence around it.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeckSet {
    decks: Vec<Deck>,
}

impl DeckSet {
    pub(crate) fn from_decks(decks: Vec<Deck>) -> Self {
        Self { decks }
    }

    pub(crate) fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub(crate) fn list(&self, user_id: &str) -> Vec<Deck> {
        let mut v: Vec<Deck> = self
            .decks
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        v.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        v
    }

    pub(crate) fn get(&self, user_id: &str, deck_id: DeckId) -> Result<Deck, StoreError> {
        self.decks
            .iter()
            .find(|d| d.id == deck_id && d.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound("deck"))
    }

    pub(crate) fn find_by_name(&self, user_id: &str, name: &str) -> Option<Deck> {
        self.decks
            .iter()
            .filter(|d| d.user_id == user_id && d.name == name)
            .min_by_key(|d| d.created_at)
            .cloned()
    }

    pub(crate) fn create(
        &mut self,
        user_id: &str,
        name: &str,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("deck name is required"));
        }
        let deck = Deck::new(user_id, name, cards);
        self.decks.push(deck.clone());
        Ok(deck)
    }

    pub(crate) fn update(
        &mut self,
        user_id: &str,
        deck_id: DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StoreError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(StoreError::Invalid("deck name is required"));
            }
        }
        self.modify(user_id, deck_id, |deck| {
            if let Some(name) = update.name {
                deck.name = name.trim().to_string();
            }
            if let Some(cards) = update.cards {
                deck.cards = cards;
            }
            Ok(())
        })
    }

    pub(crate) fn delete(&mut self, user_id: &str, deck_id: DeckId) -> Result<(), StoreError> {
        let before = self.decks.len();
        self.decks
            .retain(|d| !(d.id == deck_id && d.user_id == user_id));
        if self.decks.len() == before {
            return Err(StoreError::NotFound("deck"));
        }
        Ok(())
    }

    pub(crate) fn append(
        &mut self,
        user_id: &str,
        deck_id: DeckId,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        self.modify(user_id, deck_id, |deck| {
            deck.cards.extend(cards);
            Ok(())
        })
    }

    pub(crate) fn add_card(
        &mut self,
        user_id: &str,
        deck_id: DeckId,
        name: &str,
        image: &str,
    ) -> Result<Deck, StoreError> {
        let name = name.trim();
        if name.is_empty() || image.is_empty() {
            return Err(StoreError::Invalid("card name and image are required"));
        }
        self.modify(user_id, deck_id, |deck| {
            deck.cards.push(Card::new(name, image));
            Ok(())
        })
    }

    pub(crate) fn set_progress(
        &mut self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
        progress: u32,
    ) -> Result<Deck, StoreError> {
        self.modify(user_id, deck_id, |deck| {
            let card = deck.card_mut(card_id).ok_or(StoreError::NotFound("card"))?;
            card.progress = progress;
            Ok(())
        })
    }

    pub(crate) fn delete_card(
        &mut self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<Deck, StoreError> {
        self.modify(user_id, deck_id, |deck| {
            let before = deck.cards.len();
            deck.cards.retain(|c| c.id != card_id);
            if deck.cards.len() == before {
                return Err(StoreError::NotFound("card"));
            }
            Ok(())
        })
    }

    fn modify<F>(&mut self, user_id: &str, deck_id: DeckId, f: F) -> Result<Deck, StoreError>
    where
        F: FnOnce(&mut Deck) -> Result<(), StoreError>,
    {
        let deck = self
            .decks
            .iter_mut()
            .find(|d| d.id == deck_id && d.user_id == user_id)
            .ok_or(StoreError::NotFound("deck"))?;
        f(deck)?;
        deck.touch();
        Ok(deck.clone())
    }
}
