use crate::Card;

pub fn filter_by_text(cards: &[Card], query: &str) -> Vec<Card> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| {
            c.front.to_lowercase().contains(&q)
                || c.back.to_lowercase().contains(&q)
                || c.hint
                    .as_ref()
                    .map(|h| h.to_lowercase().contains(&q))
                    .unwrap_or(false)
                || c.tags.iter().any(|t| t.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

pub fn filter_by_tag(cards: &[Card], tag: &str) -> Vec<Card> {
    let q = tag.trim().to_lowercase();
    cards
        .iter()
        .filter(|c| c.tags.iter().any(|t| t.to_lowercase() == q))
        .cloned()
        .collect()
}

pub fn filter_not_suspended(cards: &[Card]) -> Vec<Card> {
    cards.iter().filter(|c| !c.suspended).cloned().collect()
}

/// Cards for a study session in presentation order (oldest first).
pub fn study_queue(cards: &[Card], tag: Option<&str>, max: usize) -> Vec<Card> {
    let mut pool = filter_not_suspended(cards);
    if let Some(t) = tag {
        pool = filter_by_tag(&pool, t);
    }
    pool.sort_by_key(|c| c.created_at);
    pool.truncate(max);
    pool
}
