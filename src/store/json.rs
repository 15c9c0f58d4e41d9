use super::{DeckSet, DeckStore, DeckUpdate};
use crate::error::StoreError;
use crate::model::{Card, CardId, Deck, DeckId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::debug;

const FILE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct FileImage {
    version: u32,
    updated_at: DateTime<Utc>,
    decks: Vec<Deck>,
}

/// Default store location: `<data dir>/roster-deck/decks.json`.
pub fn default_store_file() -> PathBuf {
    let root = ProjectDirs::from("com", "roster-deck", "RosterDeck")
        .map(|pd| pd.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    root.join("decks.json")
}

/// Deck store backed by one JSON file.
///
/// The whole file is rewritten after every mutation through a temp file in
/// the same directory followed by a rename, so a crash never leaves a
/// half-written store behind.
///
/// Mutations are applied to a copy of the decks and only become visible
/// once that copy is on disk. `write_gate` serialises mutate-and-persist, so
/// the file always holds the newest snapshot.
pub struct JsonDeckStore {
    path: PathBuf,
    state: RwLock<DeckSet>,
    write_gate: Mutex<()>,
}

impl JsonDeckStore {
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(default_store_file()).await
    }

    /// Open `path`, creating an empty store if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let p = path.clone();
        let decks = task::spawn_blocking(move || load_or_init(&p))
            .await
            .map_err(|e| StoreError::Storage(format!("load task panicked: {e}")))??;
        debug!("Opened deck store {} ({} decks)", path.display(), decks.len());
        Ok(Self {
            path,
            state: RwLock::new(DeckSet::from_decks(decks)),
            write_gate: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the decks, persist the copy, then publish it.
    ///
    /// On any error the in-memory state and the file are left as they were.
    async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut DeckSet) -> Result<T, StoreError>,
    {
        let _gate = self.write_gate.lock().await;

        let mut next = self.state.read().clone();
        let out = f(&mut next)?;

        let image = FileImage {
            version: FILE_VERSION,
            updated_at: Utc::now(),
            decks: next.decks().to_vec(),
        };
        let path = self.path.clone();
        task::spawn_blocking(move || write_atomic(&path, &image))
            .await
            .map_err(|e| StoreError::Storage(format!("save task panicked: {e}")))??;

        *self.state.write() = next;
        Ok(out)
    }
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(format!("{}: {e}", path.display()))
}

fn load_or_init(path: &Path) -> Result<Vec<Deck>, StoreError> {
    if path.exists() {
        let raw = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let image: FileImage = serde_json::from_str(&raw).map_err(|e| io_err(path, e))?;
        if image.version != FILE_VERSION {
            return Err(StoreError::Storage(format!(
                "{}: unsupported store version {}",
                path.display(),
                image.version
            )));
        }
        Ok(image.decks)
    } else {
        let image = FileImage {
            version: FILE_VERSION,
            updated_at: Utc::now(),
            decks: Vec::new(),
        };
        write_atomic(path, &image)?;
        Ok(image.decks)
    }
}

fn write_atomic(path: &Path, image: &FileImage) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;

    let json = serde_json::to_vec_pretty(image).map_err(|e| io_err(path, e))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(parent, e))?;
    tmp.write_all(&json).map_err(|e| io_err(path, e))?;
    tmp.flush().map_err(|e| io_err(path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

#[async_trait]
impl DeckStore for JsonDeckStore {
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, StoreError> {
        Ok(self.state.read().list(user_id))
    }

    async fn get_deck(&self, user_id: &str, deck_id: DeckId) -> Result<Deck, StoreError> {
        self.state.read().get(user_id, deck_id)
    }

    async fn find_deck_by_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Deck>, StoreError> {
        Ok(self.state.read().find_by_name(user_id, name))
    }

    async fn create_deck(
        &self,
        user_id: &str,
        name: &str,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.create(user_id, name, cards)).await
    }

    async fn update_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.update(user_id, deck_id, update)).await
    }

    async fn delete_deck(&self, user_id: &str, deck_id: DeckId) -> Result<(), StoreError> {
        self.mutate(|s| s.delete(user_id, deck_id)).await
    }

    async fn append_cards_to_deck(
        &self,
        user_id: &str,
        deck_id: DeckId,
        cards: Vec<Card>,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.append(user_id, deck_id, cards)).await
    }

    async fn add_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        name: &str,
        image: &str,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.add_card(user_id, deck_id, name, image))
            .await
    }

    async fn set_card_progress(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
        progress: u32,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.set_progress(user_id, deck_id, card_id, progress))
            .await
    }

    async fn delete_card(
        &self,
        user_id: &str,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<Deck, StoreError> {
        self.mutate(|s| s.delete_card(user_id, deck_id, card_id))
            .await
    }
}
