//! Request and response bodies shared by the tutor client and the HTTP API.

use serde::{Deserialize, Serialize};
use studyflow_core::{Question, QuizResult, DEFAULT_QUIZ_SIZE};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn online() -> Self {
        Self {
            status: "Online".into(),
            message: "AI Tutor Backend is running".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question_text: String,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextResponse {
    pub answer_context: String,
    pub source_topic: String,
    pub confidence_score: f32,
}

fn default_difficulty() -> Option<String> {
    Some("Medium".into())
}

fn default_quiz_size() -> usize {
    DEFAULT_QUIZ_SIZE
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Option<String>,
    #[serde(default = "default_quiz_size")]
    pub num_questions: usize,
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            difficulty: default_difficulty(),
            num_questions: DEFAULT_QUIZ_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizResponse {
    pub quiz: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub results: Vec<QuizResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}
