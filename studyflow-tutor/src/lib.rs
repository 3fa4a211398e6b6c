//! The tutor capability: either a remote backend reached over HTTP or an
//! in-process one over a local question bank. Chosen once at start-up and
//! handed to whoever needs it.

pub mod dto;
pub mod error;
pub mod http;
pub mod local;

pub use dto::*;
pub use error::TutorError;
pub use http::{HttpTutor, TutorConfig, DEFAULT_TIMEOUT};
pub use local::LocalTutor;

pub enum TutorService {
    Http(HttpTutor),
    Local(LocalTutor),
}

impl TutorService {
    pub fn kind(&self) -> &'static str {
        match self {
            TutorService::Http(_) => "http",
            TutorService::Local(_) => "local",
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, TutorError> {
        match self {
            TutorService::Http(t) => t.health().await,
            TutorService::Local(t) => Ok(t.health()),
        }
    }

    pub async fn retrieve(&self, req: &QueryRequest) -> Result<ContextResponse, TutorError> {
        match self {
            TutorService::Http(t) => t.retrieve(req).await,
            TutorService::Local(t) => t.retrieve(req),
        }
    }

    pub async fn generate_quiz(&self, req: &QuizRequest) -> Result<QuizResponse, TutorError> {
        match self {
            TutorService::Http(t) => t.generate_quiz(req).await,
            TutorService::Local(t) => Ok(t.generate_quiz(req)),
        }
    }

    pub async fn analyze(&self, req: &AnalysisRequest) -> Result<FeedbackResponse, TutorError> {
        match self {
            TutorService::Http(t) => t.analyze(req).await,
            TutorService::Local(t) => Ok(t.analyze(req)),
        }
    }
}
