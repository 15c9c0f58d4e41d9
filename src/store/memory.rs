use super::{DeckSet, DeckStore, DeckUpdate};
use crate::error::StoreError;
use crate::model::{Card, CardId, Deck, DeckId};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Process-local deck store.
#[derive(Default)]
pub struct MemoryDeckStore {
    decks: RwLock<DeckSet>,
}

impl MemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeckStore for MemoryDeckStore {
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, StoreError> {
        Ok(self.decks.read().list(user_id))
    }

    async fn get_deck(&self, user_id: &str, deck_id: DeckId) -> Result<Deck, StoreError> {
        self.decks.read().get(user_id, deck_id)
    }

    async fn find_deck_by_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Deck>, StoreError> {
        Ok(self.decks.read().find_by_name(user_id, name))
    }

    async fn create_deck(
        &self,
        user_id: &str,
        name: &str,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        self.decks.write().create(user_id, name, cards)
    }

    async fn update_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StoreError> {
        self.decks.write().update(user_id, deck_id, update)
    }

    async fn delete_deck(&self, user_id: &str, deck_id: DeckId) -> Result<(), StoreError> {
        self.decks.write().delete(user_id, deck_id)
    }

    async fn append_cards_to_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        self.decks.write().append(user_id, deck_id, cards)
    }

    async fn add_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        name: &str,
        image: &str,
    ) -> Result<Deck, StoreError> {
        self.decks.write().add_card(user_id, deck_id, name, image)
    }

    async fn set_card_progress(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
        progress: u32,
    ) -> Result<Deck, StoreError> {
        self.decks
            .write()
            .set_progress(user_id, deck_id, card_id, progress)
    }

    async fn delete_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<Deck, StoreError> {
        self.decks.write().delete_card(user_id, deck_id, card_id)
    }
}
