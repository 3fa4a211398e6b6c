use chrono::Utc;
use studyflow_core::{
    repo::memory::MemoryRepo, CoreError, Difficulty, Repository, Review, SessionRecord,
    StudySessionProgress,
};

#[tokio::test]
async fn deck_names_are_unique_ignoring_case() {
    let repo = MemoryRepo::new();
    repo.create_deck("Biology", Some("Science")).await.unwrap();
    let err = repo.create_deck("biology", None).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict("deck name already exists"));
}

#[tokio::test]
async fn deleting_a_deck_drops_its_cards_reviews_and_sessions() {
    let repo = MemoryRepo::new();
    let deck = repo.create_deck("Physics", None).await.unwrap();
    let card = repo
        .add_card(deck.id, "F = ?", "m * a", None, &["mechanics".into()])
        .await
        .unwrap();
    repo.insert_review(&Review::new(card.id, Difficulty::Easy, Utc::now()))
        .await
        .unwrap();
    let progress = StudySessionProgress::initial(1, None)
        .unwrap()
        .rate_card(card.rating_key(), Difficulty::Easy);
    repo.save_session(&SessionRecord::new(deck.id, Utc::now(), progress))
        .await
        .unwrap();

    repo.delete_deck(deck.id).await.unwrap();

    assert!(repo.list_cards(None).await.unwrap().is_empty());
    assert!(repo.list_reviews().await.unwrap().is_empty());
    assert!(repo.list_sessions(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn reviews_require_a_known_card() {
    let repo = MemoryRepo::new();
    let err = repo
        .insert_review(&Review::new(uuid::Uuid::new_v4(), Difficulty::Hard, Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("card"));
}

#[tokio::test]
async fn sessions_round_trip_with_progress() {
    let repo = MemoryRepo::new();
    let deck = repo.create_deck("Chem", Some("Chemistry")).await.unwrap();
    let progress = StudySessionProgress::initial(3, deck.subject.clone())
        .unwrap()
        .rate_card("x", Difficulty::Medium)
        .next_card();
    let rec = SessionRecord::new(deck.id, Utc::now(), progress.clone());
    repo.save_session(&rec).await.unwrap();

    let listed = repo.list_sessions(Some(deck.id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].progress, progress);
}
