//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::assessment::evaluator::{CodeEvaluator, EvaluationError, Verdict};
use crate::assessment::models::{Language, TestCase, Topic};
use crate::backend_client::{BackendError, ScoreRecord, ScoreSink, TopicSource};
use crate::credentials::CredentialProvider;
use crate::llm_client::{CompletionService, LlmError};

/// Replies with queued responses in order; `Err(())` simulates a failed
/// call. An exhausted queue behaves like an empty completion.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, ()>>>,
    prompts: Mutex<Vec<String>>,
    always_fail: bool,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, ()>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            always_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.always_fail {
            return Err(LlmError::Api {
                status: 503,
                message: "scripted outage".to_string(),
            });
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(LlmError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

/// Evaluator with separate queues for runs and checks. Optionally gated:
/// each check waits for one semaphore permit after being counted.
pub struct ScriptedEvaluator {
    runs: Mutex<VecDeque<Result<String, ()>>>,
    checks: Mutex<VecDeque<Result<String, ()>>>,
    run_calls: AtomicUsize,
    check_calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedEvaluator {
    pub fn new(runs: Vec<Result<String, ()>>, checks: Vec<Result<String, ()>>) -> Self {
        Self {
            runs: Mutex::new(runs.into()),
            checks: Mutex::new(checks.into()),
            run_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn with_verdicts(verdicts: &[&str]) -> Self {
        Self::new(vec![], verdicts.iter().map(|v| Ok(v.to_string())).collect())
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn run_count(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeEvaluator for ScriptedEvaluator {
    async fn run(
        &self,
        _language: Language,
        _code: &str,
        _input: &str,
    ) -> Result<String, EvaluationError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.runs.lock().unwrap().pop_front();
        match next {
            Some(Ok(output)) => Ok(output),
            _ => Err(EvaluationError::Unavailable("scripted run failure".to_string())),
        }
    }

    async fn check(
        &self,
        _language: Language,
        _code: &str,
        _test_case: &TestCase,
    ) -> Result<Verdict, EvaluationError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate semaphore closed")
                .forget();
        }
        let next = self.checks.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(Verdict::from_response(&text)),
            _ => Err(EvaluationError::Unavailable("scripted check failure".to_string())),
        }
    }
}

pub struct StaticTopics {
    topics: Option<Vec<Topic>>,
}

impl StaticTopics {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self {
            topics: Some(topics),
        }
    }

    pub fn failing() -> Self {
        Self { topics: None }
    }
}

#[async_trait]
impl TopicSource for StaticTopics {
    async fn fetch_topics(
        &self,
        _session_id: &str,
        credentials: &dyn CredentialProvider,
    ) -> Result<Vec<Topic>, BackendError> {
        credentials
            .bearer_token()
            .ok_or(BackendError::MissingCredentials)?;
        self.topics.clone().ok_or(BackendError::Status {
            status: 500,
            message: "scripted outage".to_string(),
        })
    }
}

/// Records every save attempt as `(session_id, topic_id, record)`.
/// Optionally gated: each save waits for one permit after being counted.
#[derive(Default)]
pub struct RecordingScoreSink {
    saved: Mutex<Vec<(String, i64, ScoreRecord)>>,
    attempts: AtomicUsize,
    fail: bool,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingScoreSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, i64, ScoreRecord)> {
        self.saved.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreSink for RecordingScoreSink {
    async fn save_score(
        &self,
        session_id: &str,
        topic_id: i64,
        record: &ScoreRecord,
        _credentials: &dyn CredentialProvider,
    ) -> Result<(), BackendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate semaphore closed")
                .forget();
        }
        if self.fail {
            return Err(BackendError::Status {
                status: 502,
                message: "scripted outage".to_string(),
            });
        }
        self.saved
            .lock()
            .unwrap()
            .push((session_id.to_string(), topic_id, record.clone()));
        Ok(())
    }
}
