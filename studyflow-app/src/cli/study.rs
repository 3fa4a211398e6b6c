use anyhow::Result;
use chrono::Utc;
use std::io::{BufRead, Write};
use studyflow_core::{
    Card, Deck, Difficulty, Repository, Review, SessionRecord, StudySessionProgress,
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Show,
    Rate(Difficulty),
    Next,
    Previous,
    Jump(usize),
    Quit,
    Help,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim().to_lowercase();
    if let Some(rest) = line.strip_prefix('j') {
        if let Ok(n) = rest.trim().parse::<usize>() {
            return Input::Jump(n);
        }
    }
    match line.as_str() {
        "" | "s" | "show" => Input::Show,
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Previous,
        "q" | "quit" => Input::Quit,
        other => Difficulty::parse(other).map(Input::Rate).unwrap_or(Input::Help),
    }
}

const HELP: &str = "[enter=show, 1=Hard, 2=Medium, 3=Easy, n=next, p=prev, j <n>=jump, q=quit]";

/// `[#####-----] 50% (1/2)`
pub fn progress_bar(p: &StudySessionProgress, width: usize) -> String {
    let pct = p.completion_percentage();
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:.0}% ({}/{})",
        "#".repeat(filled.min(width)),
        "-".repeat(width - filled.min(width)),
        pct,
        p.rated_count(),
        p.total_cards()
    )
}

pub fn summary_line(p: &StudySessionProgress) -> String {
    format!(
        "easy={} medium={} hard={} correct={} incorrect={} complete={:.0}%",
        p.easy_count(),
        p.medium_count(),
        p.hard_count(),
        p.correct_count(),
        p.incorrect_count(),
        p.completion_percentage()
    )
}

#[derive(Debug, Clone)]
pub struct StudyOutcome {
    pub progress: StudySessionProgress,
    pub reviews_saved: usize,
    pub finished: bool,
}

fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}

/// Drives one study session over `cards`, owning the only copy of its
/// progress. Each rating is stored as a review; the final snapshot is stored
/// as a session record when at least one card was rated.
pub async fn run_session<R: BufRead, W: Write>(
    repo: &dyn Repository,
    deck: &Deck,
    cards: &[Card],
    input: &mut R,
    out: &mut W,
) -> Result<StudyOutcome> {
    let started_at = Utc::now();
    let mut progress = StudySessionProgress::initial(cards.len() as i64, deck.subject.clone())?;
    let mut reviews_saved = 0usize;
    let mut finished = false;

    if cards.is_empty() {
        writeln!(out, "no cards to study")?;
        return Ok(StudyOutcome {
            progress,
            reviews_saved,
            finished,
        });
    }

    info!(deck = %deck.name, cards = cards.len(), "study session started");
    writeln!(out, "{HELP}")?;
    let mut show_question = true;

    loop {
        let idx = progress.current_index();
        let card = &cards[idx];
        if show_question {
            writeln!(out, "\n[{}/{}] {}", idx + 1, cards.len(), progress_bar(&progress, 20))?;
            writeln!(out, "Q: {}", card.front)?;
            if let Some(d) = progress.rating_for(&card.rating_key()) {
                writeln!(out, "(rated {})", d.as_str())?;
            }
            show_question = false;
        }

        let Some(line) = read_line(input, out, "> ")? else {
            break;
        };
        let before = progress.clone();
        match parse_input(&line) {
            Input::Show => {
                writeln!(out, "A: {}", card.back)?;
                if let Some(h) = &card.hint {
                    writeln!(out, "hint: {}", h)?;
                }
            }
            Input::Rate(d) => {
                progress = progress.rate_card(card.rating_key(), d);
                repo.insert_review(&Review::new(card.id, d, Utc::now())).await?;
                reviews_saved += 1;
                debug!(card = %card.id, difficulty = d.as_str(), "card rated");
                if progress.is_complete() {
                    finished = true;
                    break;
                }
                if progress.is_last() {
                    let left = progress.total_cards() - progress.rated_count();
                    writeln!(out, "last card; {left} unrated, use p or j <n>")?;
                } else {
                    progress = progress.next_card();
                }
            }
            Input::Next => progress = progress.next_card(),
            Input::Previous => progress = progress.previous_card(),
            Input::Jump(n) => match n.checked_sub(1).map(|i| progress.try_jump_to_card(i)) {
                Some(Ok(p)) => progress = p,
                _ => writeln!(out, "no card {n}; choose 1..={}", cards.len())?,
            },
            Input::Quit => break,
            Input::Help => writeln!(out, "{HELP}")?,
        }
        show_question = progress.current_index() != before.current_index();
    }

    writeln!(out, "\n{}", summary_line(&progress))?;
    if progress.rated_count() > 0 {
        let record = SessionRecord::new(deck.id, started_at, progress.clone());
        repo.save_session(&record).await?;
    }
    info!(
        deck = %deck.name,
        rated = progress.rated_count(),
        finished,
        "study session ended"
    );

    Ok(StudyOutcome {
        progress,
        reviews_saved,
        finished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use studyflow_core::repo::memory::MemoryRepo;

    async fn deck_with_cards(repo: &MemoryRepo, n: usize) -> (Deck, Vec<Card>) {
        let deck = repo.create_deck("Cells", Some("Biology")).await.unwrap();
        let mut cards = Vec::new();
        for i in 0..n {
            let c = repo
                .add_card(deck.id, &format!("q{i}"), &format!("a{i}"), None, &[])
                .await
                .unwrap();
            cards.push(c);
        }
        (deck, cards)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("\n"), Input::Show);
        assert_eq!(parse_input("3"), Input::Rate(Difficulty::Easy));
        assert_eq!(parse_input("Hard"), Input::Rate(Difficulty::Hard));
        assert_eq!(parse_input("j 4"), Input::Jump(4));
        assert_eq!(parse_input("j4"), Input::Jump(4));
        assert_eq!(parse_input("n"), Input::Next);
        assert_eq!(parse_input("jump"), Input::Help);
    }

    #[test]
    fn bar_reflects_completion() {
        let p = StudySessionProgress::initial(4, None)
            .unwrap()
            .rate_card("a", Difficulty::Easy);
        assert_eq!(progress_bar(&p, 8), "[##------] 25% (1/4)");
    }

    #[tokio::test]
    async fn rating_every_card_finishes_and_persists() {
        let repo = MemoryRepo::new();
        let (deck, cards) = deck_with_cards(&repo, 3).await;
        let mut input = Cursor::new("\n3\n1\n2\n");
        let mut out = Vec::new();

        let outcome = run_session(&repo, &deck, &cards, &mut input, &mut out)
            .await
            .unwrap();

        assert!(outcome.finished);
        assert_eq!(outcome.reviews_saved, 3);
        let p = &outcome.progress;
        assert_eq!((p.easy_count(), p.medium_count(), p.hard_count()), (1, 1, 1));
        assert_eq!(p.correct_count(), 2);
        assert_eq!(p.completion_percentage(), 100.0);

        assert_eq!(repo.list_reviews().await.unwrap().len(), 3);
        let sessions = repo.list_sessions(Some(deck.id)).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].progress.subject(), Some("Biology"));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("A: a0"));
        assert!(text.contains("complete=100%"));
    }

    #[tokio::test]
    async fn invalid_jump_is_refused_and_quit_keeps_partial_progress() {
        let repo = MemoryRepo::new();
        let (deck, cards) = deck_with_cards(&repo, 2).await;
        let mut input = Cursor::new("j 9\nj 2\n1\nq\n");
        let mut out = Vec::new();

        let outcome = run_session(&repo, &deck, &cards, &mut input, &mut out)
            .await
            .unwrap();

        assert!(!outcome.finished);
        assert_eq!(outcome.progress.current_index(), 1);
        assert_eq!(outcome.progress.rating_for(&cards[1].rating_key()), Some(Difficulty::Hard));
        assert_eq!(outcome.progress.completion_percentage(), 50.0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("no card 9; choose 1..=2"));
        assert!(text.contains("last card; 1 unrated"));
        assert_eq!(repo.list_sessions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_deck_has_nothing_to_study() {
        let repo = MemoryRepo::new();
        let (deck, cards) = deck_with_cards(&repo, 0).await;
        let mut out = Vec::new();
        let outcome = run_session(&repo, &deck, &cards, &mut Cursor::new(""), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.progress.total_cards(), 0);
        assert!(repo.list_sessions(None).await.unwrap().is_empty());
    }
}
