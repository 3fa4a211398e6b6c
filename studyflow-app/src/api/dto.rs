use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyflow_core::{Card, Deck, ProgressOp};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckOut {
    pub id: Uuid,
    pub name: String,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Deck> for DeckOut {
    fn from(d: Deck) -> Self {
        Self {
            id: d.id,
            name: d.name,
            subject: d.subject,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardOut {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
    pub suspended: bool,
}

impl From<Card> for CardOut {
    fn from(c: Card) -> Self {
        Self {
            id: c.id,
            deck_id: c.deck_id,
            front: c.front,
            back: c.back,
            hint: c.hint,
            tags: c.tags,
            suspended: c.suspended,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CardsQuery {
    pub tag: Option<String>,
    pub max: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub deck: Option<String>,
}

/// Replays `ops` over a fresh session of `total_cards`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressPreviewIn {
    pub total_cards: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub ops: Vec<ProgressOp>,
}
