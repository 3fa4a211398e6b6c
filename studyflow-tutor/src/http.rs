use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::dto::{
    AnalysisRequest, ContextResponse, FeedbackResponse, HealthResponse, QueryRequest,
    QuizRequest, QuizResponse,
};
use crate::TutorError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct TutorConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl TutorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for a remote tutor backend.
#[derive(Clone)]
pub struct HttpTutor {
    client: Client,
    config: TutorConfig,
}

impl HttpTutor {
    pub fn new(config: TutorConfig) -> Result<Self, TutorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TutorError::Http)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn classify(&self, e: reqwest::Error) -> TutorError {
        if e.is_timeout() {
            warn!(timeout = ?self.config.timeout, "tutor request timed out");
            TutorError::Timeout(self.config.timeout)
        } else {
            TutorError::Http(e)
        }
    }

    async fn read<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, TutorError> {
        if !response.status().is_success() {
            return Err(TutorError::HttpStatus(response.status()));
        }
        response.json::<T>().await.map_err(|e| self.classify(e))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TutorError> {
        let url = self.url(path);
        debug!(%url, "tutor request");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.read(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse, TutorError> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.read(response).await
    }

    pub async fn retrieve(&self, req: &QueryRequest) -> Result<ContextResponse, TutorError> {
        self.post("/retrieve", req).await
    }

    pub async fn generate_quiz(&self, req: &QuizRequest) -> Result<QuizResponse, TutorError> {
        self.post("/quiz/generate", req).await
    }

    pub async fn analyze(&self, req: &AnalysisRequest) -> Result<FeedbackResponse, TutorError> {
        self.post("/quiz/analyze", req).await
    }
}
