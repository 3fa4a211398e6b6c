use studyflow_core::{CoreError, Difficulty, StudySessionProgress};

fn start(n: i64) -> StudySessionProgress {
    StudySessionProgress::initial(n, Some("Chemistry".into())).unwrap()
}

#[test]
fn initial_state_is_blank() {
    for n in [0, 1, 3, 250] {
        let p = start(n);
        assert_eq!(p.current_index(), 0);
        assert!(p.ratings().is_empty());
        assert_eq!(p.easy_count(), 0);
        assert_eq!(p.medium_count(), 0);
        assert_eq!(p.hard_count(), 0);
        assert_eq!(p.correct_count(), 0);
        assert_eq!(p.incorrect_count(), 0);
        assert_eq!(p.completion_percentage(), 0.0);
        assert_eq!(p.subject(), Some("Chemistry"));
        assert_eq!(p.total_cards(), n as usize);
    }
}

#[test]
fn negative_card_count_fails() {
    assert_eq!(
        StudySessionProgress::initial(-5, None).unwrap_err(),
        CoreError::InvalidArgument("total cards must not be negative")
    );
}

#[test]
fn rating_is_idempotent() {
    let once = start(4).rate_card("c1", Difficulty::Easy);
    let twice = once.rate_card("c1", Difficulty::Easy);
    assert_eq!(once, twice);
    assert_eq!(twice.easy_count(), 1);
    assert_eq!(twice.correct_count(), 1);
}

#[test]
fn rating_is_idempotent_mid_session() {
    let mid = start(5)
        .rate_card("c1", Difficulty::Hard)
        .next_card()
        .rate_card("c2", Difficulty::Medium)
        .next_card()
        .previous_card()
        .rate_card("c1", Difficulty::Easy)
        .jump_to_card(3);

    for (id, d) in [
        ("c1", Difficulty::Easy),
        ("c2", Difficulty::Hard),
        ("c4", Difficulty::Medium),
    ] {
        let once = mid.rate_card(id, d);
        let twice = once.rate_card(id, d);
        assert_eq!(once, twice);
        assert_eq!(twice.current_index(), 3);
    }
}

#[test]
fn rating_a_new_card_on_a_full_session_is_ignored() {
    let full = start(2)
        .rate_card("c1", Difficulty::Easy)
        .next_card()
        .rate_card("c2", Difficulty::Hard);
    assert!(full.is_complete());

    let extra = full.rate_card("c3", Difficulty::Medium);
    assert_eq!(extra, full);
    assert_eq!(extra.rate_card("c3", Difficulty::Medium), full);
    assert_eq!(extra.medium_count(), 0);
    assert_eq!(extra.rated_count(), 2);
}

#[test]
fn rerating_replaces_previous_contribution() {
    let p = start(4)
        .rate_card("c1", Difficulty::Easy)
        .rate_card("c1", Difficulty::Hard);
    assert_eq!(p.ratings().len(), 1);
    assert_eq!(p.rating_for("c1"), Some(Difficulty::Hard));
    assert_eq!(p.easy_count(), 0);
    assert_eq!(p.hard_count(), 1);
    assert_eq!(p.correct_count(), 0);
    assert_eq!(p.incorrect_count(), 1);
    assert_eq!(p.completion_percentage(), 25.0);
}

#[test]
fn transitions_leave_previous_snapshot_untouched() {
    let before = start(3);
    let after = before.rate_card("a", Difficulty::Medium).next_card();
    assert_eq!(before.current_index(), 0);
    assert!(before.ratings().is_empty());
    assert_eq!(after.current_index(), 1);
    assert_eq!(after.medium_count(), 1);
}

#[test]
fn completion_tracks_distinct_rated_cards() {
    let mut p = start(8);
    for (i, d) in [Difficulty::Easy, Difficulty::Hard, Difficulty::Medium]
        .into_iter()
        .enumerate()
    {
        p = p.rate_card(format!("card-{i}"), d);
    }
    p = p.rate_card("card-0", Difficulty::Hard);
    assert_eq!(p.completion_percentage(), 3.0 / 8.0 * 100.0);
    assert!(!p.is_complete());
}

#[test]
fn completion_is_zero_without_cards() {
    let p = start(0).rate_card("ghost", Difficulty::Easy);
    assert_eq!(p.completion_percentage(), 0.0);
    assert!(p.ratings().is_empty());
}

#[test]
fn navigation_is_clamped_at_both_ends() {
    let p = start(3);
    assert_eq!(p.previous_card(), p);

    let last = p.jump_to_card(2);
    assert!(last.is_last());
    assert_eq!(last.next_card().current_index(), 2);
    assert_eq!(last.previous_card().current_index(), 1);
}

#[test]
fn jump_accepts_any_index_but_checked_form_rejects() {
    let p = start(3);
    assert_eq!(p.jump_to_card(10).current_index(), 10);
    assert!(matches!(
        p.try_jump_to_card(3),
        Err(CoreError::InvalidArgument(_))
    ));
    assert_eq!(p.try_jump_to_card(1).unwrap().current_index(), 1);
}

#[test]
fn scenario_three_cards_mixed_ratings() {
    let p = start(3)
        .rate_card("0", Difficulty::Easy)
        .rate_card("1", Difficulty::Hard)
        .rate_card("2", Difficulty::Medium);
    assert_eq!(p.easy_count(), 1);
    assert_eq!(p.medium_count(), 1);
    assert_eq!(p.hard_count(), 1);
    assert_eq!(p.correct_count(), 2);
    assert_eq!(p.incorrect_count(), 1);
    assert_eq!(p.completion_percentage(), 100.0);
    assert!(p.is_complete());
}

#[test]
fn scenario_next_card_stops_at_last() {
    let mut p = start(5);
    for _ in 0..5 {
        p = p.next_card();
        assert!(p.current_index() <= 4);
    }
    assert_eq!(p.current_index(), 4);
}

#[test]
fn snapshot_survives_json() {
    let p = start(2)
        .rate_card("x", Difficulty::Easy)
        .next_card();
    let json = serde_json::to_string(&p).unwrap();
    assert!(json.contains("\"completion_percentage\":50.0"));
    let back: StudySessionProgress = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}
