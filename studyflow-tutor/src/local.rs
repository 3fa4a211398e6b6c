use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use studyflow_core::{
    analyze_performance, generate_quiz, KnowledgeBase, QuestionBank, DEFAULT_HITS,
};
use tracing::debug;

use crate::dto::{
    AnalysisRequest, ContextResponse, FeedbackResponse, HealthResponse, QueryRequest,
    QuizRequest, QuizResponse,
};
use crate::TutorError;

/// Fixed score reported with every retrieval.
pub const CONFIDENCE: f32 = 0.95;

/// In-process tutor backed by a question bank.
pub struct LocalTutor {
    bank: QuestionBank,
    knowledge: KnowledgeBase,
    rng: Mutex<StdRng>,
}

impl LocalTutor {
    pub fn new(bank: QuestionBank) -> Self {
        Self::with_rng(bank, StdRng::from_os_rng())
    }

    pub fn with_seed(bank: QuestionBank, seed: u64) -> Self {
        Self::with_rng(bank, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bank: QuestionBank, rng: StdRng) -> Self {
        let knowledge = KnowledgeBase::from_bank(&bank);
        debug!(questions = bank.len(), "local tutor ready");
        Self {
            bank,
            knowledge,
            rng: Mutex::new(rng),
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse::online()
    }

    pub fn retrieve(&self, req: &QueryRequest) -> Result<ContextResponse, TutorError> {
        if req.question_text.trim().is_empty() {
            return Err(TutorError::InvalidRequest("question text must not be empty"));
        }
        let hit = self.knowledge.search(&req.question_text, DEFAULT_HITS);
        Ok(ContextResponse {
            answer_context: hit.context,
            source_topic: hit.topic,
            confidence_score: CONFIDENCE,
        })
    }

    pub fn generate_quiz(&self, req: &QuizRequest) -> QuizResponse {
        let mut rng = self.rng.lock();
        QuizResponse {
            quiz: generate_quiz(&self.bank, &req.topic, req.num_questions, &mut *rng),
        }
    }

    pub fn analyze(&self, req: &AnalysisRequest) -> FeedbackResponse {
        FeedbackResponse {
            feedback: analyze_performance(&req.results),
        }
    }
}
