//! Code evaluation — pluggable, trait-based executor for runs and submissions.
//!
//! Default: `LlmEvaluator`, which prompts the completion service to behave
//! like an interpreter. A sandboxed runtime can implement `CodeEvaluator`
//! instead without touching the session logic.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::assessment::models::{Language, Question, RunResult, TestCase, TestResult};
use crate::assessment::prompts::{fill_template, CHECK_PROMPT_TEMPLATE, RUN_PROMPT_TEMPLATE};
use crate::assessment::scoring::{compute_score, is_pass_verdict, outputs_match, ScoringError};
use crate::llm_client::prompts::EXECUTION_SYSTEM;
use crate::llm_client::{CompletionService, LlmError};

pub const RUN_FAILED_MESSAGE: &str = "Failed to execute code";
pub const TEST_FAILED_MESSAGE: &str = "Test execution failed";

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("evaluator backend failed: {0}")]
    Llm(#[from] LlmError),

    #[error("evaluator unavailable: {0}")]
    Unavailable(String),
}

/// Pass/fail for a single test case, keeping the raw message as diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

impl Verdict {
    /// Classifies a free-text `PASS` / `FAIL: <reason>` answer.
    pub fn from_response(text: &str) -> Self {
        Self {
            passed: is_pass_verdict(text),
            message: text.trim().to_string(),
        }
    }
}

#[async_trait]
pub trait CodeEvaluator: Send + Sync {
    /// Executes `code` on `input` and returns the raw program output.
    async fn run(&self, language: Language, code: &str, input: &str)
        -> Result<String, EvaluationError>;

    /// Executes `code` on one test case and judges it.
    async fn check(
        &self,
        language: Language,
        code: &str,
        test_case: &TestCase,
    ) -> Result<Verdict, EvaluationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmEvaluator — default implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmEvaluator {
    completion: Arc<dyn CompletionService>,
}

impl LlmEvaluator {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl CodeEvaluator for LlmEvaluator {
    async fn run(
        &self,
        language: Language,
        code: &str,
        input: &str,
    ) -> Result<String, EvaluationError> {
        let prompt = fill_template(
            RUN_PROMPT_TEMPLATE,
            &[("language", language.as_str()), ("code", code), ("input", input)],
        );
        Ok(self.completion.complete(&prompt, EXECUTION_SYSTEM).await?)
    }

    async fn check(
        &self,
        language: Language,
        code: &str,
        test_case: &TestCase,
    ) -> Result<Verdict, EvaluationError> {
        let prompt = fill_template(
            CHECK_PROMPT_TEMPLATE,
            &[
                ("language", language.as_str()),
                ("code", code),
                ("input", test_case.input.as_str()),
                ("expected", test_case.expected_output.as_str()),
            ],
        );
        let text = self.completion.complete(&prompt, EXECUTION_SYSTEM).await?;
        if text.trim().is_empty() {
            return Err(EvaluationError::Unavailable(
                "empty verdict from completion service".to_string(),
            ));
        }
        Ok(Verdict::from_response(&text))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Run / submit drivers
// ────────────────────────────────────────────────────────────────────────────

/// Runs `code` against the question's sample input. Never fails: evaluator
/// errors become a non-output result.
pub async fn run_sample(
    evaluator: &dyn CodeEvaluator,
    question: &Question,
    language: Language,
    code: &str,
) -> RunResult {
    match evaluator.run(language, code, &question.sample_input).await {
        Ok(output) => {
            let output = output.trim().to_string();
            let matches = outputs_match(&output, &question.sample_output);
            debug!("Run for '{}' finished (matches={matches})", question.title);
            RunResult {
                is_output: true,
                message: output,
                expected: Some(question.sample_output.clone()),
                matches: Some(matches),
            }
        }
        Err(e) => {
            warn!("Run for '{}' failed: {e}", question.title);
            RunResult::rejected(RUN_FAILED_MESSAGE)
        }
    }
}

/// Test results and score for one submission.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub test_results: Vec<TestResult>,
    pub passed_count: usize,
    pub total_count: usize,
    pub score: u32,
    pub all_passed: bool,
}

/// Checks every test case in order, one evaluator call each, then scores.
/// Evaluator errors count as a failed test; only a question without test
/// cases is an error.
pub async fn grade_submission(
    evaluator: &dyn CodeEvaluator,
    question: &Question,
    language: Language,
    code: &str,
) -> Result<GradedSubmission, ScoringError> {
    if question.test_cases.is_empty() {
        return Err(ScoringError::NoTestCases);
    }

    let mut test_results = Vec::with_capacity(question.test_cases.len());
    for test_case in &question.test_cases {
        let result = match evaluator.check(language, code, test_case).await {
            Ok(verdict) => TestResult {
                passed: verdict.passed,
                message: verdict.message,
                description: test_case.description.clone(),
            },
            Err(e) => {
                warn!(
                    "Test '{}' for '{}' could not be evaluated: {e}",
                    test_case.description, question.title
                );
                TestResult {
                    passed: false,
                    message: TEST_FAILED_MESSAGE.to_string(),
                    description: test_case.description.clone(),
                }
            }
        };
        test_results.push(result);
    }

    let passed_count = test_results.iter().filter(|r| r.passed).count();
    let total_count = test_results.len();
    let score = compute_score(passed_count, total_count)?;

    Ok(GradedSubmission {
        test_results,
        passed_count,
        total_count,
        score,
        all_passed: passed_count == total_count,
    })
}
