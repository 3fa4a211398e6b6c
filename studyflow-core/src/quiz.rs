//! Practice quizzes drawn from a question bank, and topic-level feedback on
//! submitted answers.

use std::collections::BTreeMap;
use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::CoreError;

pub const DEFAULT_QUIZ_SIZE: usize = 5;
pub const DEFAULT_TOPIC: &str = "General";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub prompt: String,
    pub lecture: String,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "choices_map")]
    pub choices: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub answer: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Question {
    pub fn topic_or_default(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }
}

// Rows exported from spreadsheets may lack a prompt or lecture; those are skipped.
#[derive(Deserialize)]
struct RawQuestion {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    lecture: Option<String>,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default, deserialize_with = "choices_map")]
    choices: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    answer: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl RawQuestion {
    fn into_question(self) -> Option<Question> {
        Some(Question {
            id: self.id,
            prompt: self.prompt?,
            lecture: self.lecture?,
            solution: self.solution,
            subject: self.subject,
            topic: self.topic,
            choices: self.choices,
            answer: self.answer,
            image: self.image,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        let raw: Vec<RawQuestion> = serde_json::from_str(s)
            .map_err(|_| CoreError::InvalidArgument("malformed question bank"))?;
        let total = raw.len();
        let questions: Vec<Question> = raw.into_iter().filter_map(RawQuestion::into_question).collect();
        debug!(total, kept = questions.len(), "question bank parsed");
        Ok(Self { questions })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let data = std::fs::read_to_string(path.as_ref())
            .map_err(|_| CoreError::Storage("question bank unreadable"))?;
        Self::from_json_str(&data)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Samples up to `num_questions` questions whose topic contains `topic`
/// (case-insensitive). Falls back to the whole bank when nothing matches.
pub fn generate_quiz<R: Rng + ?Sized>(
    bank: &QuestionBank,
    topic: &str,
    num_questions: usize,
    rng: &mut R,
) -> Vec<Question> {
    if bank.is_empty() {
        return Vec::new();
    }
    let needle = topic.to_lowercase();
    let matching: Vec<&Question> = bank
        .questions
        .iter()
        .filter(|q| {
            q.topic
                .as_ref()
                .map(|t| t.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect();
    let pool: Vec<&Question> = if matching.is_empty() {
        warn!(topic, "no questions for topic, returning random mix");
        bank.questions.iter().collect()
    } else {
        matching
    };
    let size = num_questions.min(pool.len());
    pool.choose_multiple(rng, size).map(|q| (*q).clone()).collect()
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

/// Outcome of one answered quiz question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub question_id: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    pub is_correct: bool,
}

impl QuizResult {
    pub fn new(question_id: impl Into<String>, topic: impl Into<String>, is_correct: bool) -> Self {
        Self {
            question_id: question_id.into(),
            topic: topic.into(),
            is_correct,
        }
    }
}

/// One feedback sentence per topic, in the order topics first appear.
pub fn analyze_performance(results: &[QuizResult]) -> String {
    if results.is_empty() {
        return "No data to analyze.".to_string();
    }

    // (topic, correct, total)
    let mut per_topic: Vec<(&str, u32, u32)> = Vec::new();
    for r in results {
        let hit = u32::from(r.is_correct);
        match per_topic.iter_mut().find(|(t, _, _)| *t == r.topic) {
            Some(entry) => {
                entry.1 += hit;
                entry.2 += 1;
            }
            None => per_topic.push((r.topic.as_str(), hit, 1)),
        }
    }

    per_topic
        .into_iter()
        .map(|(topic, correct, total)| {
            if correct * 2 < total {
                format!("Weakness detected in {topic}. Review the lecture notes.")
            } else if correct == total {
                format!("Perfect score in {topic}! Moving to advanced mode.")
            } else {
                format!("Good progress in {topic}. Keep practicing.")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    S(String),
    I(i64),
    F(f64),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::S(s) => s,
            StringOrNumber::I(i) => i.to_string(),
            StringOrNumber::F(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(String::from)
}

fn choices_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = BTreeMap::<String, StringOrNumber>::deserialize(d)?;
    Ok(raw.into_iter().map(|(k, v)| (k, String::from(v))).collect())
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(id: &str, topic: Option<&str>) -> Question {
        Question {
            id: id.into(),
            prompt: format!("prompt {id}"),
            lecture: format!("lecture {id}"),
            solution: None,
            subject: None,
            topic: topic.map(String::from),
            choices: BTreeMap::new(),
            answer: None,
            image: None,
        }
    }

    #[test]
    fn load_skips_rows_without_prompt_or_lecture() {
        let json = r#"[
            {"id": 1, "prompt": "What is a cell?", "lecture": "Cells are...", "topic": "biology",
             "choices": {"A": "unit of life", "B": "a rock"}, "answer": 0, "image": null},
            {"id": "2", "prompt": null, "lecture": "orphan lecture"},
            {"id": 3, "prompt": "Orphan prompt"}
        ]"#;
        let bank = QuestionBank::from_json_str(json).unwrap();
        assert_eq!(bank.len(), 1);
        let first = &bank.questions()[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.answer.as_deref(), Some("0"));
        assert_eq!(first.choices.len(), 2);
    }

    #[test]
    fn numeric_choice_values_are_read_as_text() {
        let json = r#"[
            {"id": 1, "prompt": "2 + 2?", "lecture": "Addition.", "choices": {"A": 4, "B": 5.5}, "answer": "A"},
            {"id": 2, "prompt": "Name a gas", "lecture": "Gases.", "choices": {"A": "helium"}}
        ]"#;
        let bank = QuestionBank::from_json_str(json).unwrap();
        assert_eq!(bank.len(), 2);
        let first = &bank.questions()[0];
        assert_eq!(first.choices.get("A").map(String::as_str), Some("4"));
        assert_eq!(first.choices.get("B").map(String::as_str), Some("5.5"));
    }

    #[test]
    fn malformed_bank_is_invalid_argument() {
        let err = QuestionBank::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn quiz_prefers_matching_topic() {
        let bank = QuestionBank::new(vec![
            q("1", Some("Biology")),
            q("2", Some("Physics")),
            q("3", Some("Marine biology")),
            q("4", None),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let quiz = generate_quiz(&bank, "BIOLOGY", 5, &mut rng);
        assert_eq!(quiz.len(), 2);
        assert!(quiz.iter().all(|q| q.topic_or_default().to_lowercase().contains("biology")));
    }

    #[test]
    fn quiz_falls_back_to_whole_bank() {
        let bank = QuestionBank::new(vec![q("1", Some("Biology")), q("2", Some("Physics"))]);
        let mut rng = StdRng::seed_from_u64(1);
        let quiz = generate_quiz(&bank, "chemistry", 5, &mut rng);
        assert_eq!(quiz.len(), 2);
    }

    #[test]
    fn quiz_caps_at_requested_size_without_repeats() {
        let bank = QuestionBank::new((0..10).map(|i| q(&i.to_string(), Some("math"))).collect());
        let mut rng = StdRng::seed_from_u64(3);
        let quiz = generate_quiz(&bank, "math", DEFAULT_QUIZ_SIZE, &mut rng);
        assert_eq!(quiz.len(), DEFAULT_QUIZ_SIZE);
        let mut ids: Vec<_> = quiz.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DEFAULT_QUIZ_SIZE);
    }

    #[test]
    fn empty_bank_gives_empty_quiz() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate_quiz(&QuestionBank::default(), "any", 5, &mut rng).is_empty());
    }

    #[test]
    fn feedback_per_topic_in_first_seen_order() {
        let results = vec![
            QuizResult::new("1", "Biology", false),
            QuizResult::new("2", "Biology", false),
            QuizResult::new("3", "Physics", true),
            QuizResult::new("4", "Physics", true),
            QuizResult::new("5", "Chemistry", true),
            QuizResult::new("6", "Chemistry", false),
        ];
        assert_eq!(
            analyze_performance(&results),
            "Weakness detected in Biology. Review the lecture notes. \
             Perfect score in Physics! Moving to advanced mode. \
             Good progress in Chemistry. Keep practicing."
        );
    }

    #[test]
    fn feedback_without_results() {
        assert_eq!(analyze_performance(&[]), "No data to analyze.");
    }

    #[test]
    fn missing_topic_defaults_to_general() {
        let r: QuizResult = serde_json::from_str(r#"{"question_id": "9", "is_correct": true}"#).unwrap();
        assert_eq!(r.topic, DEFAULT_TOPIC);
    }
}
