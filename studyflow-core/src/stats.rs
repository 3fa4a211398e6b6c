use crate::{Difficulty, Review, SessionRecord};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total: u32,
    pub hard: u32,
    pub medium: u32,
    pub easy: u32,
}

impl Totals {
    pub fn record(&mut self, d: &Difficulty) {
        self.total += 1;
        match d {
            Difficulty::Hard => self.hard += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Easy => self.easy += 1,
        }
    }

    pub fn correct(&self) -> u32 {
        self.medium + self.easy
    }

    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct() as f32 / self.total as f32
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StatsSummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
}

pub fn summarize(reviews: &[Review]) -> StatsSummary {
    let mut summary = StatsSummary::default();
    for r in reviews {
        summary.totals.record(&r.difficulty);
        let d = r.reviewed_at.date_naive();
        summary.per_day.entry(d).or_default().record(&r.difficulty);
    }
    summary
}

pub fn daily_streak(reviews: &[Review], today: NaiveDate) -> u32 {
    let per_day = summarize(reviews).per_day;
    let mut streak = 0u32;
    let mut day = today;
    while per_day.get(&day).map(|t| t.total > 0).unwrap_or(false) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Aggregate over persisted sessions, counting each session's final ratings once.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionTotals {
    pub sessions: u32,
    pub completed: u32,
    pub ratings: Totals,
    pub mean_completion: f64,
}

pub fn summarize_sessions(sessions: &[SessionRecord]) -> SessionTotals {
    let mut out = SessionTotals::default();
    let mut completion_sum = 0.0;
    for s in sessions {
        out.sessions += 1;
        if s.progress.is_complete() {
            out.completed += 1;
        }
        for d in s.progress.ratings().values() {
            out.ratings.record(d);
        }
        completion_sum += s.progress.completion_percentage();
    }
    if out.sessions > 0 {
        out.mean_completion = completion_sum / out.sessions as f64;
    }
    out
}
