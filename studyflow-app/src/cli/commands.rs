use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::cli::study::run_session;
use crate::services::{
    ensure_deck_by_name, repo_from_cli, resolve_deck, stats_report, tutor_from_cli, AppServices,
};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{stdin, stdout};
use std::sync::Arc;
use studyflow_core::{study_queue, Card, Deck, QuizResult, Repository};
use studyflow_tutor::{AnalysisRequest, QueryRequest, QuizRequest, TutorService};
use uuid::Uuid;

/// Opens only what each command needs: deck and card commands never load
/// the question bank, and tutor commands never open the store.
pub async fn run_cli(args: Cli) -> Result<()> {
    match args.cmd.clone() {
        Command::Serve(cmd) => {
            let addr: std::net::SocketAddr = cmd.addr.parse()?;
            api_server::run(AppServices::from_cli(&args).await?, addr).await
        }
        Command::Deck(cmd) => deck_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Card(cmd) => card_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Study(cmd) => study_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Stats(cmd) => stats_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Export(cmd) => export_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Import(cmd) => import_cmd(repo_from_cli(&args).await?, cmd).await,
        Command::Ask(cmd) => ask_cmd(&tutor_from_cli(&args)?, cmd).await,
        Command::Quiz(cmd) => quiz_cmd(&tutor_from_cli(&args)?, cmd).await,
    }
}

async fn deck_cmd(repo: Arc<dyn Repository>, cmd: DeckCmd) -> Result<()> {
    match cmd {
        DeckCmd::Add { name, subject } => {
            let d = repo.create_deck(&name, subject.as_deref()).await?;
            println!("{}", d.id);
        }
        DeckCmd::List => {
            let mut v = repo.list_decks().await?;
            v.sort_by_key(|d| d.created_at);
            for d in v {
                println!("{}\t{}\t{}", d.id, d.name, d.subject.as_deref().unwrap_or("-"));
            }
        }
        DeckCmd::Rm { deck } => {
            let d = resolve_deck(&*repo, &deck).await?;
            repo.delete_deck(d.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn card_cmd(repo: Arc<dyn Repository>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let deck = resolve_deck(&*repo, &a.deck).await?;
            let c = repo
                .add_card(deck.id, &a.front, &a.back, a.hint.as_deref(), &a.tags)
                .await?;
            println!("{}", c.id);
        }
        CardCmd::List { deck } => {
            let deck_id = match deck {
                Some(sel) => Some(resolve_deck(&*repo, &sel).await?.id),
                None => None,
            };
            let mut cards = repo.list_cards(deck_id).await?;
            cards.sort_by_key(|c| c.created_at);
            for c in cards {
                let tags = if c.tags.is_empty() { "-".to_string() } else { c.tags.join(";") };
                println!(
                    "{}\t{}\t{}\tdeck={}\ttags={}\tsuspended={}",
                    c.id, c.front, c.back, c.deck_id, tags, c.suspended
                );
            }
        }
        CardCmd::Rm { card_id } => {
            let id = parse_uuid(&card_id)?;
            repo.delete_card(id).await?;
            println!("ok");
        }
        CardCmd::Edit(e) => {
            let id = parse_uuid(&e.card_id)?;
            let mut card = repo.get_card(id).await?;

            if let Some(f) = e.front {
                card.front = f;
            }
            if let Some(b) = e.back {
                card.back = b;
            }
            if e.clear_hint {
                card.hint = None;
            }
            if let Some(h) = e.hint {
                card.hint = Some(h);
            }
            for t in e.add_tags {
                if !card.tags.iter().any(|x| x.eq_ignore_ascii_case(&t)) {
                    card.tags.push(t);
                }
            }
            card.tags
                .retain(|x| !e.rm_tags.iter().any(|r| x.eq_ignore_ascii_case(r)));
            if e.suspend {
                card.suspended = true;
            } else if e.unsuspend {
                card.suspended = false;
            }

            repo.update_card(&card).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn study_cmd(repo: Arc<dyn Repository>, cmd: StudyCmd) -> Result<()> {
    let deck = resolve_deck(&*repo, &cmd.deck).await?;
    let cards = repo.list_cards(Some(deck.id)).await?;
    let queue = study_queue(&cards, cmd.tag.as_deref(), cmd.max);

    let mut input = stdin().lock();
    let mut out = stdout().lock();
    let outcome = run_session(&*repo, &deck, &queue, &mut input, &mut out).await?;
    if outcome.finished {
        println!("session complete, {} review(s) saved", outcome.reviews_saved);
    }
    Ok(())
}

async fn stats_cmd(repo: Arc<dyn Repository>, cmd: StatsCmd) -> Result<()> {
    let deck_id = match cmd.deck {
        Some(sel) => Some(resolve_deck(&*repo, &sel).await?.id),
        None => None,
    };
    let report = stats_report(&*repo, deck_id).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let t = &report.reviews.totals;
    println!(
        "reviews: {} (easy {}, medium {}, hard {}), accuracy {:.0}%",
        t.total,
        t.easy,
        t.medium,
        t.hard,
        t.accuracy() * 100.0
    );
    println!("streak: {} day(s)", report.streak_days);
    println!(
        "sessions: {} ({} complete), mean completion {:.0}%",
        report.sessions.sessions, report.sessions.completed, report.sessions.mean_completion
    );
    for (day, totals) in &report.reviews.per_day {
        println!("{}\t{}\t{:.0}%", day, totals.total, totals.accuracy() * 100.0);
    }
    Ok(())
}

async fn export_cmd(repo: Arc<dyn Repository>, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path } => {
            let decks = repo.list_decks().await?;
            let mut cards = repo.list_cards(None).await?;
            cards.sort_by_key(|c| c.created_at);
            let bundle = ExportBundle { version: 1, decks, cards };
            std::fs::write(&path, serde_json::to_string_pretty(&bundle)?)?;
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path, deck } => {
            let deck_id = match deck {
                Some(sel) => Some(resolve_deck(&*repo, &sel).await?.id),
                None => None,
            };
            let mut cards = repo.list_cards(deck_id).await?;
            cards.sort_by_key(|c| c.created_at);

            let deck_name: HashMap<Uuid, String> = repo
                .list_decks()
                .await?
                .into_iter()
                .map(|d| (d.id, d.name))
                .collect();

            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["deck", "front", "back", "hint", "tags", "suspended"])?;
            for c in cards {
                let dn = deck_name
                    .get(&c.deck_id)
                    .cloned()
                    .unwrap_or_else(|| c.deck_id.to_string());
                wtr.write_record([
                    dn,
                    c.front,
                    c.back,
                    c.hint.unwrap_or_default(),
                    c.tags.join(";"),
                    if c.suspended { "1".to_string() } else { "0".to_string() },
                ])?;
            }
            wtr.flush()?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn import_cmd(repo: Arc<dyn Repository>, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path)?;
            let bundle: ExportBundle = serde_json::from_str(&data)?;
            let n = import_bundle(&*repo, bundle).await?;
            println!("imported {n}");
        }
        ImportCmd::Csv { path, deck } => {
            let mut rdr = csv::Reader::from_path(&path)?;
            let target_deck = match deck {
                Some(sel) => Some(resolve_deck(&*repo, &sel).await?),
                None => None,
            };
            let mut n = 0usize;
            for rec in rdr.records() {
                let rec = rec?;
                let deck_name = rec.get(0).unwrap_or("").trim();
                let front = rec.get(1).unwrap_or("");
                let back = rec.get(2).unwrap_or("");
                let hint = rec.get(3).filter(|s| !s.is_empty());
                let tags: Vec<String> = rec
                    .get(4)
                    .unwrap_or("")
                    .split(';')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                let suspended = rec.get(5).unwrap_or("0").trim() == "1";

                let deck_obj = match &target_deck {
                    Some(d) => d.clone(),
                    None => ensure_deck_by_name(&*repo, deck_name).await?,
                };
                let card = repo.add_card(deck_obj.id, front, back, hint, &tags).await?;
                if suspended {
                    repo.set_suspended(card.id, true).await?;
                }
                n += 1;
            }
            println!("imported {n}");
        }
    }
    Ok(())
}

/// Recreates decks by name and appends their cards; returns the card count.
pub async fn import_bundle<R: Repository + ?Sized>(repo: &R, bundle: ExportBundle) -> Result<usize> {
    let mut ids: HashMap<Uuid, Deck> = HashMap::new();
    for d in bundle.decks {
        let target = match resolve_deck(repo, &d.name).await {
            Ok(existing) => existing,
            Err(_) => repo.create_deck(&d.name, d.subject.as_deref()).await?,
        };
        ids.insert(d.id, target);
    }
    let mut n = 0usize;
    for c in bundle.cards {
        let deck = ids
            .get(&c.deck_id)
            .ok_or_else(|| anyhow!("card {} refers to unknown deck {}", c.id, c.deck_id))?;
        let card = repo
            .add_card(deck.id, &c.front, &c.back, c.hint.as_deref(), &c.tags)
            .await?;
        if c.suspended {
            repo.set_suspended(card.id, true).await?;
        }
        n += 1;
    }
    Ok(n)
}

async fn ask_cmd(tutor: &TutorService, cmd: AskCmd) -> Result<()> {
    let res = tutor
        .retrieve(&QueryRequest {
            question_text: cmd.question,
            subject: cmd.subject,
        })
        .await?;
    println!("[{}] {}", res.source_topic, res.answer_context);
    Ok(())
}

async fn quiz_cmd(tutor: &TutorService, cmd: QuizCmd) -> Result<()> {
    match cmd {
        QuizCmd::Generate {
            topic,
            difficulty,
            count,
        } => {
            let req = QuizRequest {
                topic,
                difficulty: Some(difficulty),
                num_questions: count,
            };
            let quiz = tutor.generate_quiz(&req).await?.quiz;
            if quiz.is_empty() {
                println!("no questions available");
            }
            for (i, q) in quiz.iter().enumerate() {
                println!("\n{}. [{}] {}", i + 1, q.topic_or_default(), q.prompt);
                for (letter, text) in &q.choices {
                    println!("   {letter}) {text}");
                }
            }
        }
        QuizCmd::Analyze { path } => {
            let data = std::fs::read_to_string(&path)?;
            let results: Vec<QuizResult> = serde_json::from_str(&data)?;
            let out = tutor.analyze(&AnalysisRequest { results }).await?;
            println!("{}", out.feedback);
        }
    }
    Ok(())
}

// ===== Helpers =====
fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| anyhow!("invalid uuid"))
}

#[derive(Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: u32,
    pub decks: Vec<Deck>,
    pub cards: Vec<Card>,
}
