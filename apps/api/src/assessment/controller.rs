//! Session Controller — the single logical actor that owns one session.
//!
//! Flow for start: fetch topics → generate questions (≤3, with fallback) →
//!                 build `AssessmentSession` → spawn countdown.
//!
//! Every mutation runs synchronously under the session lock. External calls
//! (evaluation, persistence) are awaited with the lock released; their
//! admission was already recorded in session state, so a concurrent duplicate
//! is rejected before it reaches the network.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::assessment::evaluator::{grade_submission, run_sample, CodeEvaluator};
use crate::assessment::generator::QuestionGenerator;
use crate::assessment::models::{FinalSummary, Language, Question, RunResult, Submission};
use crate::assessment::session::{
    AssessmentSession, RunAdmission, SelectedQuestion, SessionError, SessionSettings,
    SessionSnapshot,
};
use crate::assessment::timer::{log_summary, spawn_countdown};
use crate::backend_client::{ScoreRecord, ScoreSink, TopicSource};
use crate::credentials::CredentialProvider;
use crate::errors::AppError;

/// Collaborators a session needs, injected at start.
#[derive(Clone)]
pub struct SessionDeps {
    pub topics: Arc<dyn TopicSource>,
    pub generator: QuestionGenerator,
    pub evaluator: Arc<dyn CodeEvaluator>,
    pub scores: Arc<dyn ScoreSink>,
}

pub struct SessionController {
    session_id: String,
    session: Arc<Mutex<AssessmentSession>>,
    evaluator: Arc<dyn CodeEvaluator>,
    scores: Arc<dyn ScoreSink>,
    credentials: Arc<dyn CredentialProvider>,
    countdown: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Resolves topics, generates questions and starts the countdown.
    ///
    /// Errors here are start-flow errors: nothing is created, and calling
    /// `start` again is the retry.
    pub async fn start(
        session_id: &str,
        settings: SessionSettings,
        deps: &SessionDeps,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Arc<Self>, AppError> {
        info!("Loading DSA topics for session {session_id}");
        let topics = deps
            .topics
            .fetch_topics(session_id, credentials.as_ref())
            .await
            .map_err(|e| AppError::Backend(format!("Failed to fetch DSA topics: {e}")))?;

        if topics.is_empty() {
            return Err(AppError::NotFound(format!(
                "No DSA topics found for session {session_id}"
            )));
        }

        let questions = deps.generator.generate_set(&topics).await;
        let session = AssessmentSession::new(session_id, questions, settings)?;
        info!(
            "Session {session_id} started: {} questions, {}s on the clock",
            session.question_count(),
            settings.time_limit_secs
        );

        let session = Arc::new(Mutex::new(session));
        let countdown = spawn_countdown(session.clone());

        Ok(Arc::new(Self {
            session_id: session_id.to_string(),
            session,
            evaluator: deps.evaluator.clone(),
            scores: deps.scores.clone(),
            credentials,
            countdown: Mutex::new(Some(countdown)),
        }))
    }

    /// Accepts only the credentials the session was started with.
    pub fn authorize(&self, presented: &dyn CredentialProvider) -> Result<(), AppError> {
        let presented = presented.bearer_token().ok_or(AppError::Unauthorized)?;
        match self.credentials.bearer_token() {
            Some(owner) if owner == presented => Ok(()),
            _ => Err(AppError::Forbidden(format!(
                "Session {} belongs to another user",
                self.session_id
            ))),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn select_question(
        &self,
        index: usize,
        language: Language,
    ) -> Result<SelectedQuestion, AppError> {
        Ok(self.session.lock().await.select_question(index, language)?)
    }

    /// One budget-limited run against the sample input.
    pub async fn run_test(
        &self,
        index: usize,
        language: Language,
        code: &str,
    ) -> Result<RunResult, AppError> {
        let admission = self.session.lock().await.begin_run(index)?;
        let question = match admission {
            RunAdmission::Rejected(result) => return Ok(result),
            RunAdmission::Granted {
                question,
                runs_remaining,
            } => {
                debug!("Run admitted for question {index}; {runs_remaining} left");
                question
            }
        };

        let result = run_sample(self.evaluator.as_ref(), &question, language, code).await;

        if self.session.lock().await.is_closed() {
            info!(
                "Discarding run result for question {index}: session {} closed",
                self.session_id
            );
            return Err(SessionError::Closed.into());
        }
        Ok(result)
    }

    /// Grades every test case, records the submission locally, then persists
    /// the score. The close check and the local record happen under one lock
    /// acquisition, so a discarded submission is never persisted and a
    /// recorded one always is. Persistence failures are logged, never fatal.
    pub async fn submit(
        &self,
        index: usize,
        language: Language,
        code: String,
    ) -> Result<Submission, AppError> {
        let question = self.session.lock().await.begin_submit(index)?;

        let graded =
            match grade_submission(self.evaluator.as_ref(), &question, language, &code).await {
                Ok(graded) => graded,
                Err(e) => {
                    let mut session = self.session.lock().await;
                    if let Err(abort_err) = session.abort_submit(index) {
                        warn!("Could not reopen question {index}: {abort_err}");
                    }
                    return Err(SessionError::from(e).into());
                }
            };

        let submission = {
            let mut session = self.session.lock().await;
            if session.is_closed() {
                info!(
                    "Discarding submission for question {index}: session {} closed",
                    self.session_id
                );
                return Err(SessionError::Closed.into());
            }
            let submission = session
                .complete_submit(index, language, code, graded)?
                .clone();
            info!(
                "Question {index} of session {} scored {}/10 ({}/{} tests); total {}",
                self.session_id,
                submission.score,
                submission.passed_count,
                submission.total_count,
                session.total_score()
            );
            submission
        };

        self.persist_score(&question, &submission.code, submission.score)
            .await;
        Ok(submission)
    }

    async fn persist_score(&self, question: &Question, code: &str, score: u32) {
        let record = match ScoreRecord::new(question, code, score) {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not serialize score record for '{}': {e}", question.title);
                return;
            }
        };

        match self
            .scores
            .save_score(
                &self.session_id,
                question.topic_id,
                &record,
                self.credentials.as_ref(),
            )
            .await
        {
            Ok(()) => info!(
                "Saved score {score} for topic {} in session {}",
                question.topic_id, self.session_id
            ),
            Err(e) => warn!(
                "Failed to save score for topic {} in session {}: {e}",
                question.topic_id, self.session_id
            ),
        }
    }

    /// When the session was finalized, if it has been.
    pub async fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.summary().map(|s| s.timestamp)
    }

    /// Closes the session. Idempotent; the countdown is cancelled on the
    /// first call and the summary is logged once.
    pub async fn finalize(&self) -> FinalSummary {
        let (summary, first_time) = {
            let mut session = self.session.lock().await;
            let first_time = session.summary().is_none();
            (session.finalize(Utc::now()), first_time)
        };

        if let Some(handle) = self.countdown.lock().await.take() {
            handle.abort();
        }
        if first_time {
            log_summary(&summary);
        }
        summary
    }
}
