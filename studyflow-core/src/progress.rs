//! Progress through one pass over an ordered list of flashcards.
//!
//! [`StudySessionProgress`] is a value type: every transition borrows the
//! current snapshot and returns the next one, so the owner can compare the two
//! before replacing its copy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Difficulty};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredProgress")]
pub struct StudySessionProgress {
    subject: Option<String>,
    total_cards: usize,
    current_index: usize,
    ratings: BTreeMap<String, Difficulty>,
    easy_count: u32,
    medium_count: u32,
    hard_count: u32,
    correct_count: u32,
    incorrect_count: u32,
    completion_percentage: f64,
}

/// Persisted shape; counters are rebuilt from `ratings` on load.
#[derive(Deserialize)]
struct StoredProgress {
    subject: Option<String>,
    total_cards: usize,
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    ratings: BTreeMap<String, Difficulty>,
}

impl TryFrom<StoredProgress> for StudySessionProgress {
    type Error = CoreError;

    fn try_from(s: StoredProgress) -> Result<Self, CoreError> {
        if s.ratings.len() > s.total_cards {
            return Err(CoreError::InvalidArgument("more ratings than cards"));
        }
        if s.total_cards > 0 && s.current_index >= s.total_cards {
            return Err(CoreError::InvalidArgument("card index out of range"));
        }
        let mut p = Self::empty(s.total_cards, s.subject);
        p.current_index = s.current_index;
        p.ratings = s.ratings;
        p.recount();
        Ok(p)
    }
}

/// A single transition, as submitted by a remote caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProgressOp {
    Rate {
        card_id: String,
        difficulty: Difficulty,
    },
    Next,
    Previous,
    Jump {
        index: usize,
    },
}

impl StudySessionProgress {
    /// Fresh session over `total_cards` cards.
    ///
    /// Fails with [`CoreError::InvalidArgument`] when `total_cards` is negative.
    pub fn initial(total_cards: i64, subject: Option<String>) -> Result<Self, CoreError> {
        let total = usize::try_from(total_cards)
            .map_err(|_| CoreError::InvalidArgument("total cards must not be negative"))?;
        Ok(Self::empty(total, subject))
    }

    fn empty(total_cards: usize, subject: Option<String>) -> Self {
        Self {
            subject,
            total_cards,
            current_index: 0,
            ratings: BTreeMap::new(),
            easy_count: 0,
            medium_count: 0,
            hard_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            completion_percentage: 0.0,
        }
    }

    /// Records (or overwrites) the rating for `card_id`.
    ///
    /// A previously unseen card is ignored once every card of the session has
    /// a rating, which keeps `ratings.len() <= total_cards`.
    #[must_use]
    pub fn rate_card(&self, card_id: impl Into<String>, difficulty: Difficulty) -> Self {
        let card_id = card_id.into();
        if !self.ratings.contains_key(&card_id) && self.ratings.len() >= self.total_cards {
            return self.clone();
        }
        let mut next = self.clone();
        next.ratings.insert(card_id, difficulty);
        next.recount();
        next
    }

    #[must_use]
    pub fn next_card(&self) -> Self {
        let last = self.total_cards.saturating_sub(1);
        let mut next = self.clone();
        next.current_index = self.current_index.saturating_add(1).min(last);
        next
    }

    #[must_use]
    pub fn previous_card(&self) -> Self {
        let mut next = self.clone();
        next.current_index = self.current_index.saturating_sub(1);
        next
    }

    /// Moves to `index` without any bounds check.
    ///
    /// Callers holding unvalidated input should use [`Self::try_jump_to_card`].
    #[must_use]
    pub fn jump_to_card(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.current_index = index;
        next
    }

    pub fn try_jump_to_card(&self, index: usize) -> Result<Self, CoreError> {
        if !self.is_valid_index(index) {
            return Err(CoreError::InvalidArgument("card index out of range"));
        }
        Ok(self.jump_to_card(index))
    }

    /// Applies `op`, rejecting jumps outside the session.
    pub fn apply(&self, op: &ProgressOp) -> Result<Self, CoreError> {
        match op {
            ProgressOp::Rate {
                card_id,
                difficulty,
            } => Ok(self.rate_card(card_id.as_str(), *difficulty)),
            ProgressOp::Next => Ok(self.next_card()),
            ProgressOp::Previous => Ok(self.previous_card()),
            ProgressOp::Jump { index } => self.try_jump_to_card(*index),
        }
    }

    fn recount(&mut self) {
        let (mut easy, mut medium, mut hard) = (0u32, 0u32, 0u32);
        for d in self.ratings.values() {
            match d {
                Difficulty::Easy => easy += 1,
                Difficulty::Medium => medium += 1,
                Difficulty::Hard => hard += 1,
            }
        }
        self.easy_count = easy;
        self.medium_count = medium;
        self.hard_count = hard;
        self.correct_count = easy + medium;
        self.incorrect_count = hard;
        self.completion_percentage = if self.total_cards == 0 {
            0.0
        } else {
            (self.ratings.len() as f64 / self.total_cards as f64 * 100.0).clamp(0.0, 100.0)
        };
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn total_cards(&self) -> usize {
        self.total_cards
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn ratings(&self) -> &BTreeMap<String, Difficulty> {
        &self.ratings
    }

    pub fn rating_for(&self, card_id: &str) -> Option<Difficulty> {
        self.ratings.get(card_id).copied()
    }

    pub fn rated_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn easy_count(&self) -> u32 {
        self.easy_count
    }

    pub fn medium_count(&self) -> u32 {
        self.medium_count
    }

    pub fn hard_count(&self) -> u32 {
        self.hard_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    pub fn completion_percentage(&self) -> f64 {
        self.completion_percentage
    }

    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.total_cards
    }

    pub fn is_last(&self) -> bool {
        self.current_index.saturating_add(1) >= self.total_cards
    }

    pub fn is_complete(&self) -> bool {
        self.total_cards > 0 && self.ratings.len() >= self.total_cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(n: i64) -> StudySessionProgress {
        StudySessionProgress::initial(n, Some("Biology".into())).unwrap()
    }

    #[test]
    fn negative_total_is_rejected() {
        let err = StudySessionProgress::initial(-1, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn empty_session_stays_put() {
        let p = session(0);
        assert_eq!(p.next_card().current_index(), 0);
        assert_eq!(p.previous_card().current_index(), 0);
        assert_eq!(p.completion_percentage(), 0.0);
        assert!(!p.is_complete());
    }

    #[test]
    fn extra_cards_beyond_total_are_ignored() {
        let p = session(2)
            .rate_card("a", Difficulty::Easy)
            .rate_card("b", Difficulty::Hard);
        let q = p.rate_card("c", Difficulty::Medium);
        assert_eq!(p, q);

        let r = p.rate_card("a", Difficulty::Hard);
        assert_eq!(r.hard_count(), 2);
        assert_eq!(r.rated_count(), 2);
    }

    #[test]
    fn next_after_unchecked_jump_returns_to_last_card() {
        let p = session(3).jump_to_card(7);
        assert_eq!(p.current_index(), 7);
        assert_eq!(p.next_card().current_index(), 2);
        assert_eq!(p.previous_card().current_index(), 6);
    }

    #[test]
    fn apply_rejects_out_of_range_jump() {
        let p = session(3);
        assert!(p.apply(&ProgressOp::Jump { index: 3 }).is_err());
        assert_eq!(
            p.apply(&ProgressOp::Jump { index: 2 }).unwrap().current_index(),
            2
        );
    }

    #[test]
    fn counters_are_rebuilt_on_load() {
        let json = r#"{
            "subject": null,
            "total_cards": 2,
            "current_index": 1,
            "ratings": {"x": "easy", "y": "hard"},
            "easy_count": 40
        }"#;
        let p: StudySessionProgress = serde_json::from_str(json).unwrap();
        assert_eq!(p.easy_count(), 1);
        assert_eq!(p.hard_count(), 1);
        assert_eq!(p.completion_percentage(), 100.0);
        assert_eq!(p.current_index(), 1);
    }

    #[test]
    fn inconsistent_snapshots_are_rejected_on_load() {
        let overfull = r#"{"subject": null, "total_cards": 1, "ratings": {"a": "easy", "b": "hard", "c": "medium"}}"#;
        let err = serde_json::from_str::<StudySessionProgress>(overfull).unwrap_err();
        assert!(err.to_string().contains("more ratings than cards"));

        let past_end = r#"{"subject": null, "total_cards": 1, "current_index": 9}"#;
        assert!(serde_json::from_str::<StudySessionProgress>(past_end).is_err());

        let empty = r#"{"subject": null, "total_cards": 0}"#;
        let p: StudySessionProgress = serde_json::from_str(empty).unwrap();
        assert_eq!(p.rated_count(), 0);
    }
}
