use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use studyflow_core::{
    repo::Repository, Card, CardId, CoreError, Deck, DeckId, Review, SessionId, SessionRecord,
};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, info, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decks: Vec<Deck>,
    cards: Vec<Card>,
    reviews: Vec<Review>,
    #[serde(default)]
    sessions: Vec<SessionRecord>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decks: HashMap<DeckId, Deck>,
    cards: HashMap<CardId, Card>,
    reviews: HashMap<CardId, Vec<Review>>,
    sessions: HashMap<SessionId, SessionRecord>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            decks: HashMap::new(),
            cards: HashMap::new(),
            reviews: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            decks: self.decks.values().cloned().collect(),
            cards: self.cards.values().cloned().collect(),
            reviews: self.reviews.values().flatten().cloned().collect(),
            sessions: self.sessions.values().cloned().collect(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let decks = img.decks.into_iter().map(|d| (d.id, d)).collect();
        let cards = img.cards.into_iter().map(|c| (c.id, c)).collect();
        let mut reviews: HashMap<CardId, Vec<Review>> = HashMap::new();
        for r in img.reviews {
            reviews.entry(r.card_id).or_default().push(r);
        }
        let sessions = img.sessions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            decks,
            cards,
            reviews,
            sessions,
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
}

impl JsonStore {
    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path, &backups_dir).await?;
        info!(path = %path.display(), decks = state.decks.len(), "json store opened");
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
        })
    }

    async fn save(&self) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(error = %e, "json store write failed");
                CoreError::Storage("io")
            })?;
        debug!(path = %self.path.display(), "json store saved");
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))?
        .map_err(|e| {
            warn!(error = %e, "json store unreadable");
            CoreError::Storage("corrupt store file")
        })?;
        if img.version > FILE_VERSION {
            return Err(CoreError::Storage("store file written by a newer version"));
        }
        let mut st = State::from_image(img);
        st.updated_at = Utc::now();
        Ok(st)
    } else {
        let st = State::new_empty();
        write_with_backup(path, backups_dir, 1, &st.to_image())
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("studyflow-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // names carry the timestamp, so lexical order is chronological
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl Repository for JsonStore {
    async fn create_deck(&self, name: &str, subject: Option<&str>) -> Result<Deck, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidArgument("deck name must not be empty"));
        }
        let deck = Deck::new(name).with_subject(subject.map(str::to_string));
        {
            let mut s = self.state.write();
            if s.decks.values().any(|d| d.name.eq_ignore_ascii_case(name)) {
                return Err(CoreError::Conflict("deck name already exists"));
            }
            s.decks.insert(deck.id, deck.clone());
        }
        self.save().await?;
        Ok(deck)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError> {
        let s = self.state.read();
        s.decks.get(&id).cloned().ok_or(CoreError::NotFound("deck"))
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, CoreError> {
        let s = self.state.read();
        Ok(s.decks.values().cloned().collect())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.decks.remove(&id).is_none() {
                return Err(CoreError::NotFound("deck"));
            }
            let to_remove: Vec<CardId> = s
                .cards
                .values()
                .filter(|c| c.deck_id == id)
                .map(|c| c.id)
                .collect();
            for cid in to_remove {
                s.cards.remove(&cid);
                s.reviews.remove(&cid);
            }
            s.sessions.retain(|_, r| r.deck_id != id);
        }
        self.save().await
    }

    async fn add_card(
        &self,
        deck_id: DeckId,
        front: &str,
        back: &str,
        hint: Option<&str>,
        tags: &[String],
    ) -> Result<Card, CoreError> {
        let card = {
            let mut s = self.state.write();
            if !s.decks.contains_key(&deck_id) {
                return Err(CoreError::NotFound("deck"));
            }
            let mut c = Card::new(deck_id, front, back);
            c.hint = hint.map(|s| s.to_string());
            c.tags = tags.to_vec();
            s.cards.insert(c.id, c.clone());
            c
        };
        self.save().await?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Card> = s.cards.values().cloned().collect();
        if let Some(did) = deck_id {
            v.retain(|c| c.deck_id == did);
        }
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        {
            let mut s = self.state.write();
            if !s.cards.contains_key(&card.id) {
                return Err(CoreError::NotFound("card"));
            }
            s.cards.insert(card.id, card.clone());
        }
        self.save().await?;
        Ok(card.clone())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.cards.remove(&id).is_none() {
                return Err(CoreError::NotFound("card"));
            }
            s.reviews.remove(&id);
        }
        self.save().await
    }

    async fn set_suspended(&self, id: CardId, suspended: bool) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(c) = s.cards.get_mut(&id) else {
                return Err(CoreError::NotFound("card"));
            };
            c.suspended = suspended;
        }
        self.save().await
    }

    async fn insert_review(&self, review: &Review) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if !s.cards.contains_key(&review.card_id) {
                return Err(CoreError::NotFound("card"));
            }
            s.reviews
                .entry(review.card_id)
                .or_default()
                .push(review.clone());
        }
        self.save().await
    }

    async fn list_reviews_for_card(&self, card_id: CardId) -> Result<Vec<Review>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews.get(&card_id).cloned().unwrap_or_default())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Review> = s.reviews.values().flatten().cloned().collect();
        v.sort_by_key(|r| r.reviewed_at);
        Ok(v)
    }

    async fn save_session(&self, session: &SessionRecord) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if !s.decks.contains_key(&session.deck_id) {
                return Err(CoreError::NotFound("deck"));
            }
            s.sessions.insert(session.id, session.clone());
        }
        self.save().await
    }

    async fn list_sessions(&self, deck_id: Option<DeckId>) -> Result<Vec<SessionRecord>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<SessionRecord> = s.sessions.values().cloned().collect();
        if let Some(did) = deck_id {
            v.retain(|r| r.deck_id == did);
        }
        v.sort_by_key(|r| r.started_at);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyflow_core::{Difficulty, StudySessionProgress};

    async fn open_in(dir: &Path, keep: usize) -> JsonStore {
        let (file, backups) = paths::store_files(dir);
        JsonStore::open_with(file, backups, keep).await.unwrap()
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (deck_id, card_id) = {
            let store = open_in(dir.path(), 3).await;
            let deck = store.create_deck("Biology", Some("Science")).await.unwrap();
            let card = store
                .add_card(deck.id, "ATP?", "energy currency", Some("cells"), &[])
                .await
                .unwrap();
            store
                .insert_review(&Review::new(card.id, Difficulty::Medium, Utc::now()))
                .await
                .unwrap();
            let progress = StudySessionProgress::initial(1, deck.subject.clone())
                .unwrap()
                .rate_card(card.rating_key(), Difficulty::Medium);
            store
                .save_session(&SessionRecord::new(deck.id, Utc::now(), progress))
                .await
                .unwrap();
            (deck.id, card.id)
        };

        let store = open_in(dir.path(), 3).await;
        let deck = store.get_deck(deck_id).await.unwrap();
        assert_eq!(deck.subject.as_deref(), Some("Science"));
        assert_eq!(store.get_card(card_id).await.unwrap().hint.as_deref(), Some("cells"));
        assert_eq!(store.list_reviews_for_card(card_id).await.unwrap().len(), 1);
        let sessions = store.list_sessions(Some(deck_id)).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].progress.medium_count(), 1);
        assert!(sessions[0].progress.is_complete());
    }

    #[tokio::test]
    async fn backups_are_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(dir.path(), 2).await;
        for name in ["a", "b", "c", "d"] {
            store.create_deck(name, None).await.unwrap();
        }
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert!(backups <= 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let (file, backups) = paths::store_files(dir.path());
        fs::write(&file, "{ nope").unwrap();
        let err = JsonStore::open_with(file, backups, 1).await.err().unwrap();
        assert_eq!(err, CoreError::Storage("corrupt store file"));
    }
}
