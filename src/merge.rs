//! Deck merge: put freshly extracted cards into a deck.
//!
//! Merging is purely additive. There is no de-duplication: ingesting the
//! same roster twice into one deck yields every student twice.

use crate::error::StoreError;
use crate::model::{Card, Deck, DeckId};
use crate::store::DeckStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Which deck an ingestion writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckTarget {
    /// The user's deck with exactly this name, created if missing.
    Name(String),
    /// An existing deck, by identity.
    Id(DeckId),
}

impl From<&str> for DeckTarget {
    fn from(name: &str) -> Self {
        DeckTarget::Name(name.to_string())
    }
}

impl From<String> for DeckTarget {
    fn from(name: String) -> Self {
        DeckTarget::Name(name)
    }
}

impl From<DeckId> for DeckTarget {
    fn from(id: DeckId) -> Self {
        DeckTarget::Id(id)
    }
}

impl fmt::Display for DeckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckTarget::Name(name) => write!(f, "deck '{name}'"),
            DeckTarget::Id(id) => write!(f, "deck {id}"),
        }
    }
}

/// Result of [`merge_cards`].
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub deck: Deck,
    pub created: bool,
    pub cards_added: usize,
}

/// Append `cards` to the target deck, creating a named deck when needed.
///
/// Existing cards keep their position; new cards follow in the given order.
///
/// A [`DeckTarget::Name`] is normalised the same way as
/// [`DeckStore::create_deck`] normalises new names: surrounding whitespace is
/// trimmed, then the match is exact and case-sensitive. `" CS178 "` therefore
/// lands in the deck `"CS178"` rather than creating a lookalike.
pub async fn merge_cards(
    store: &dyn DeckStore,
    user_id: &str,
    target: &DeckTarget,
    cards: Vec<Card>,
) -> Result<MergeOutcome, StoreError> {
    let cards_added = cards.len();

    let (deck, created) = match target {
        DeckTarget::Id(id) => (store.append_cards_to_deck(user_id, *id, cards).await?, false),
        DeckTarget::Name(name) => {
            let name = name.trim();
            match store.find_deck_by_name(user_id, name).await? {
                Some(existing) => (
                    store
                        .append_cards_to_deck(user_id, existing.id, cards)
                        .await?,
                    false,
                ),
                None => (store.create_deck(user_id, name, cards).await?, true),
            }
        }
    };

    info!(
        "{} {} card(s) into '{}' ({} total)",
        if created { "Created deck with" } else { "Merged" },
        cards_added,
        deck.name,
        deck.cards.len()
    );

    Ok(MergeOutcome {
        deck,
        created,
        cards_added,
    })
}
