use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::StudySessionProgress;

pub type DeckId = Uuid;
pub type CardId = Uuid;
pub type ReviewId = Uuid;
pub type SessionId = Uuid;

/// Self-assessed difficulty a learner gives a card after seeing its answer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Easy and medium count as correct answers, hard as incorrect.
    pub fn is_correct(&self) -> bool {
        matches!(self, Difficulty::Easy | Difficulty::Medium)
    }

    pub fn as_score(&self) -> i32 {
        match self {
            Difficulty::Hard => 1,
            Difficulty::Medium => 2,
            Difficulty::Easy => 3,
        }
    }

    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            1 => Some(Difficulty::Hard),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Easy),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "h" | "hard" => Some(Difficulty::Hard),
            "2" | "m" | "med" | "medium" => Some(Difficulty::Medium),
            "3" | "e" | "easy" => Some(Difficulty::Easy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            subject: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(deck_id: DeckId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            front: front.into(),
            back: back.into(),
            hint: None,
            tags: Vec::new(),
            suspended: false,
            created_at: Utc::now(),
        }
    }

    /// Key under which this card is rated in a [`StudySessionProgress`].
    pub fn rating_key(&self) -> String {
        self.id.to_string()
    }
}

/// One rating submitted during a study session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub card_id: CardId,
    pub difficulty: Difficulty,
    pub reviewed_at: DateTime<Utc>,
}

impl Review {
    pub fn new(card_id: CardId, difficulty: Difficulty, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            difficulty,
            reviewed_at,
        }
    }
}

/// Persisted snapshot of a study session once its owner lets go of it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub deck_id: DeckId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub progress: StudySessionProgress,
}

impl SessionRecord {
    pub fn new(deck_id: DeckId, started_at: DateTime<Utc>, progress: StudySessionProgress) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            started_at,
            finished_at: Utc::now(),
            progress,
        }
    }
}
