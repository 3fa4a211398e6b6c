//! Composition root: the repository and tutor are resolved once here and
//! passed to commands and API handlers.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use studyflow_core::{
    daily_streak, summarize, summarize_sessions, CoreError, Deck, DeckId, QuestionBank,
    Repository, SessionTotals, StatsSummary,
};
use studyflow_json::{paths, JsonStore};
use studyflow_sqlite::SqliteRepo;
use studyflow_tutor::{HttpTutor, LocalTutor, TutorConfig, TutorService};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::opts::{Cli, StoreKind};

#[derive(Clone)]
pub struct AppServices {
    pub repo: Arc<dyn Repository>,
    pub tutor: Arc<TutorService>,
}

impl AppServices {
    pub async fn from_cli(args: &Cli) -> Result<Self> {
        Ok(Self {
            repo: repo_from_cli(args).await?,
            tutor: Arc::new(tutor_from_cli(args)?),
        })
    }
}

pub async fn repo_from_cli(args: &Cli) -> Result<Arc<dyn Repository>> {
    open_repo(&args.store, args.data_dir.clone(), args.db_path.clone()).await
}

pub fn tutor_from_cli(args: &Cli) -> Result<TutorService> {
    build_tutor(
        args.tutor_url.as_deref(),
        Duration::from_secs(args.tutor_timeout_secs),
        args.question_bank.clone(),
    )
}

pub async fn open_repo(
    store: &StoreKind,
    data_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
) -> Result<Arc<dyn Repository>> {
    let root = data_dir.unwrap_or_else(paths::data_root);
    match store {
        StoreKind::Json => {
            let (file, backups) = paths::store_files(&root);
            let s = JsonStore::open_with(file, backups, 10).await?;
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(|| root.join("studyflow.sqlite3"));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let s = SqliteRepo::open_file(&p).await?;
            Ok(Arc::new(s))
        }
    }
}

/// Remote tutor when a URL is configured, otherwise the local question bank.
pub fn build_tutor(
    url: Option<&str>,
    timeout: Duration,
    question_bank: Option<PathBuf>,
) -> Result<TutorService> {
    if let Some(url) = url {
        info!(%url, ?timeout, "using remote tutor");
        let tutor = HttpTutor::new(TutorConfig::new(url).with_timeout(timeout))?;
        return Ok(TutorService::Http(tutor));
    }
    let path = question_bank.unwrap_or_else(paths::default_question_bank);
    let bank = if path.exists() {
        QuestionBank::from_path(&path)?
    } else {
        warn!(path = %path.display(), "question bank not found, local tutor starts empty");
        QuestionBank::default()
    };
    info!(questions = bank.len(), "using local tutor");
    Ok(TutorService::Local(LocalTutor::new(bank)))
}

pub async fn resolve_deck<R: Repository + ?Sized>(repo: &R, sel: &str) -> Result<Deck> {
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Ok(d) = repo.get_deck(id).await {
            return Ok(d);
        }
    }
    let decks = repo.list_decks().await?;
    if let Some(d) = decks.into_iter().find(|d| d.name.eq_ignore_ascii_case(sel)) {
        return Ok(d);
    }
    bail!("deck not found: {}", sel)
}

pub async fn ensure_deck_by_name<R: Repository + ?Sized>(repo: &R, name: &str) -> Result<Deck> {
    let decks = repo.list_decks().await?;
    if let Some(d) = decks.into_iter().find(|d| d.name.eq_ignore_ascii_case(name)) {
        return Ok(d);
    }
    Ok(repo.create_deck(name, None).await?)
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub reviews: StatsSummary,
    pub streak_days: u32,
    pub sessions: SessionTotals,
}

/// Review and session statistics, optionally restricted to one deck.
pub async fn stats_report<R: Repository + ?Sized>(
    repo: &R,
    deck_id: Option<DeckId>,
) -> Result<StatsReport, CoreError> {
    let mut reviews = repo.list_reviews().await?;
    if let Some(did) = deck_id {
        let cards = repo.list_cards(Some(did)).await?;
        reviews.retain(|r| cards.iter().any(|c| c.id == r.card_id));
    }
    let sessions = repo.list_sessions(deck_id).await?;
    Ok(StatsReport {
        reviews: summarize(&reviews),
        streak_days: daily_streak(&reviews, Utc::now().date_naive()),
        sessions: summarize_sessions(&sessions),
    })
}
