/// Backend Client — talks to the interview backend REST API.
///
/// Two capabilities are consumed by sessions: the topic source (which topics
/// a session covers) and the score sink (durable per-question scores).
/// Both take their bearer token from an injected `CredentialProvider`.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::assessment::models::{Question, Topic};
use crate::credentials::CredentialProvider;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no credentials available for backend call")]
    MissingCredentials,
}

#[async_trait]
pub trait TopicSource: Send + Sync {
    /// Ordered topics for a session. An empty list means no assessment.
    async fn fetch_topics(
        &self,
        session_id: &str,
        credentials: &dyn CredentialProvider,
    ) -> Result<Vec<Topic>, BackendError>;
}

#[async_trait]
pub trait ScoreSink: Send + Sync {
    async fn save_score(
        &self,
        session_id: &str,
        topic_id: i64,
        record: &ScoreRecord,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Serialize)]
struct QuestionMetadata<'a> {
    title: &'a str,
    description: &'a str,
    topic: &'a str,
    difficulty: String,
}

/// Body of the score persistence call. `question` is a JSON *string*, which
/// is what the backend stores verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub question: String,
    pub code: String,
    pub score: u32,
}

impl ScoreRecord {
    pub fn new(question: &Question, code: &str, score: u32) -> Result<Self, serde_json::Error> {
        let metadata = QuestionMetadata {
            title: &question.title,
            description: &question.description,
            topic: &question.topic,
            difficulty: question.difficulty.to_string(),
        };
        Ok(Self {
            question: serde_json::to_string(&metadata)?,
            code: code.to_string(),
            score,
        })
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url: base_url.into(),
        })
    }

    fn token(credentials: &dyn CredentialProvider) -> Result<String, BackendError> {
        credentials
            .bearer_token()
            .ok_or(BackendError::MissingCredentials)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TopicSource for BackendClient {
    async fn fetch_topics(
        &self,
        session_id: &str,
        credentials: &dyn CredentialProvider,
    ) -> Result<Vec<Topic>, BackendError> {
        let url = format!("{}/interview/get-dsa-questions/{session_id}/", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(Self::token(credentials)?)
            .send()
            .await?;
        let topics: Vec<Topic> = Self::check_status(response).await?.json().await?;
        debug!("Fetched {} topics for session {session_id}", topics.len());
        Ok(topics)
    }
}

#[async_trait]
impl ScoreSink for BackendClient {
    async fn save_score(
        &self,
        session_id: &str,
        topic_id: i64,
        record: &ScoreRecord,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/interview/add-dsa-scores/{session_id}/{topic_id}/",
            self.base_url
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(Self::token(credentials)?)
            .json(record)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
