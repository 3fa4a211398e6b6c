//! Lexical lookup of lecture material for a free-text question.

use std::collections::HashSet;

use serde::Serialize;

use crate::quiz::{QuestionBank, DEFAULT_TOPIC};

pub const NO_CONTEXT: &str = "No relevant textbook info found.";
pub const DEFAULT_HITS: usize = 2;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "what", "which", "that", "this", "with", "from", "how",
    "why", "who", "when", "does", "did", "not", "its", "into", "than", "then", "there", "their",
    "has", "have", "had", "you", "your", "can", "all", "any", "but",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Retrieval {
    pub context: String,
    pub topic: String,
}

struct Document {
    terms: HashSet<String>,
    text: String,
    topic: String,
}

pub struct KnowledgeBase {
    docs: Vec<Document>,
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

impl KnowledgeBase {
    pub fn from_bank(bank: &QuestionBank) -> Self {
        let docs = bank
            .questions()
            .iter()
            .map(|q| {
                let text = format!("Question: {} Context: {}", q.prompt, q.lecture);
                Document {
                    terms: tokenize(&text),
                    text,
                    topic: q.topic_or_default().to_string(),
                }
            })
            .collect();
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Joins the `n` documents sharing the most terms with `query`.
    pub fn search(&self, query: &str, n: usize) -> Retrieval {
        let wanted = tokenize(query);
        let mut scored: Vec<(usize, usize)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.terms.intersection(&wanted).count(), i))
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable: equal scores keep bank order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(n);

        let Some(&(_, best)) = scored.first() else {
            return Retrieval {
                context: NO_CONTEXT.to_string(),
                topic: DEFAULT_TOPIC.to_string(),
            };
        };
        let context = scored
            .iter()
            .map(|(_, i)| self.docs[*i].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Retrieval {
            context,
            topic: self.docs[best].topic.clone(),
        }
    }
}
