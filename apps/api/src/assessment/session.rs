//! Timed assessment session — the pure state machine behind a DSA interview.
//!
//! No I/O happens here. External calls are split into an admission step
//! (`begin_run`, `begin_submit`) that reserves budget/state under the
//! controller's lock, and a completion step (`complete_submit`) that applies
//! the result only if the session is still open.
//!
//! `total_score` is always recomputed from `submissions`; it is never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::assessment::evaluator::GradedSubmission;
use crate::assessment::models::{
    Difficulty, FinalSummary, Language, Question, QuestionState, RunResult, SessionStatus,
    Submission, SubmissionSummary,
};
use crate::assessment::scoring::{ScoringError, MAX_QUESTION_SCORE};
use crate::assessment::templates::{code_template, format_clock};

pub const NO_RUNS_LEFT_MESSAGE: &str = "No runs left for this question";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,

    #[error("a session needs at least one question")]
    NoQuestions,

    #[error("question {index} does not exist (session has {count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("question {0} is already being submitted")]
    SubmissionInFlight(usize),

    #[error("question {0} has already been submitted")]
    AlreadySubmitted(usize),

    #[error("question {0} has no submission in flight")]
    NotSubmitting(usize),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub time_limit_secs: u32,
    pub runs_per_question: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: 30 * 60,
            runs_per_question: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Session already closed; nothing changed.
    Ignored,
    Running { remaining: u32 },
    /// This tick reached zero and closed the session.
    Expired(FinalSummary),
}

/// Result of asking for a run.
#[derive(Debug, Clone)]
pub enum RunAdmission {
    /// Budget reserved; the caller must now execute against `question`.
    Granted {
        question: Question,
        runs_remaining: u32,
    },
    /// Budget exhausted; no external call may be made.
    Rejected(RunResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub sample_input: String,
    pub sample_output: String,
    pub hints: Vec<String>,
    pub test_case_count: usize,
    pub state: QuestionState,
    pub runs_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub time_remaining: u32,
    pub time_limit: u32,
    /// `time_remaining` as `MM:SS`.
    pub clock: String,
    pub current_index: usize,
    pub total_score: u32,
    pub max_score: u32,
    pub questions: Vec<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<FinalSummary>,
}

/// What the editor should show after selecting a question.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedQuestion {
    pub question: QuestionView,
    pub language: Language,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

#[derive(Debug)]
pub struct AssessmentSession {
    session_id: String,
    time_limit: u32,
    time_remaining: u32,
    status: SessionStatus,
    questions: Vec<Question>,
    current_index: usize,
    submissions: BTreeMap<usize, Submission>,
    runs_remaining: Vec<u32>,
    question_states: Vec<QuestionState>,
    summary: Option<FinalSummary>,
}

impl AssessmentSession {
    /// Starts an `Active` session. `questions` must be non-empty.
    pub fn new(
        session_id: impl Into<String>,
        questions: Vec<Question>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        let count = questions.len();
        Ok(Self {
            session_id: session_id.into(),
            time_limit: settings.time_limit_secs,
            time_remaining: settings.time_limit_secs,
            status: SessionStatus::Active,
            questions,
            current_index: 0,
            submissions: BTreeMap::new(),
            runs_remaining: vec![settings.runs_per_question; count],
            question_states: vec![QuestionState::NotSubmitted; count],
            summary: None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn total_score(&self) -> u32 {
        self.submissions.values().map(|s| s.score).sum()
    }

    pub fn max_score(&self) -> u32 {
        self.questions.len() as u32 * MAX_QUESTION_SCORE
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(SessionError::QuestionOutOfRange {
                index,
                count: self.questions.len(),
            })
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    // ── Timer ───────────────────────────────────────────────────────────────

    /// One second of countdown. Reaching zero closes and finalizes the
    /// session; ticks after that are ignored.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.is_closed() {
            return TickOutcome::Ignored;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            TickOutcome::Expired(self.finalize(now))
        } else {
            TickOutcome::Running {
                remaining: self.time_remaining,
            }
        }
    }

    // ── Run ─────────────────────────────────────────────────────────────────

    /// Reserves one run for `index`. The budget is decremented here, before
    /// the external call, so it is spent whether or not the call succeeds.
    pub fn begin_run(&mut self, index: usize) -> Result<RunAdmission, SessionError> {
        self.ensure_active()?;
        self.check_index(index)?;

        let runs = &mut self.runs_remaining[index];
        if *runs == 0 {
            return Ok(RunAdmission::Rejected(RunResult::rejected(
                NO_RUNS_LEFT_MESSAGE,
            )));
        }
        *runs -= 1;

        Ok(RunAdmission::Granted {
            question: self.questions[index].clone(),
            runs_remaining: *runs,
        })
    }

    // ── Submit ──────────────────────────────────────────────────────────────

    /// `NotSubmitted → Submitting`. Rejects a second submit while one is in
    /// flight or after the question was submitted.
    pub fn begin_submit(&mut self, index: usize) -> Result<Question, SessionError> {
        self.ensure_active()?;
        self.check_index(index)?;

        match self.question_states[index] {
            QuestionState::Submitting => Err(SessionError::SubmissionInFlight(index)),
            QuestionState::Submitted => Err(SessionError::AlreadySubmitted(index)),
            QuestionState::NotSubmitted => {
                self.question_states[index] = QuestionState::Submitting;
                Ok(self.questions[index].clone())
            }
        }
    }

    /// `Submitting → NotSubmitted`, for a submission that could not be graded.
    pub fn abort_submit(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_index(index)?;
        if self.question_states[index] != QuestionState::Submitting {
            return Err(SessionError::NotSubmitting(index));
        }
        self.question_states[index] = QuestionState::NotSubmitted;
        Ok(())
    }

    /// `Submitting → Submitted`, recording the graded submission.
    ///
    /// Returns `Closed` (and records nothing) if the session closed while
    /// grading was in flight.
    pub fn complete_submit(
        &mut self,
        index: usize,
        language: Language,
        code: String,
        graded: GradedSubmission,
    ) -> Result<&Submission, SessionError> {
        self.ensure_active()?;
        self.check_index(index)?;
        if self.question_states[index] != QuestionState::Submitting {
            return Err(SessionError::NotSubmitting(index));
        }

        let question = &self.questions[index];
        let submission = Submission {
            question_index: index,
            topic_id: question.topic_id,
            topic: question.topic.clone(),
            title: question.title.clone(),
            code,
            language,
            test_results: graded.test_results,
            passed_count: graded.passed_count,
            total_count: graded.total_count,
            score: graded.score,
            all_passed: graded.all_passed,
        };

        self.question_states[index] = QuestionState::Submitted;
        self.submissions.insert(index, submission);
        Ok(&self.submissions[&index])
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Moves to `index` and returns what the editor should show: the
    /// submitted code if there is one, otherwise the language template.
    /// Allowed on a closed session so results stay reviewable.
    pub fn select_question(
        &mut self,
        index: usize,
        language: Language,
    ) -> Result<SelectedQuestion, SessionError> {
        self.check_index(index)?;
        self.current_index = index;

        let submission = self.submissions.get(&index).cloned();
        let (language, code) = match &submission {
            Some(sub) => (sub.language, sub.code.clone()),
            None => (language, code_template(language).to_string()),
        };

        Ok(SelectedQuestion {
            question: self.question_view(index),
            language,
            code,
            submission,
        })
    }

    // ── Finalization ────────────────────────────────────────────────────────

    /// Closes the session and returns its summary. Idempotent: later calls
    /// return the first summary unchanged.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> FinalSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        self.status = SessionStatus::Closed;
        let summary = FinalSummary {
            session_id: self.session_id.clone(),
            total_score: self.total_score(),
            max_score: self.max_score(),
            attempted: self.submissions.len(),
            total: self.questions.len(),
            time_used: self.time_limit - self.time_remaining,
            time_limit: self.time_limit,
            submissions: self.submissions.values().map(SubmissionSummary::from).collect(),
            timestamp: now,
        };
        self.summary = Some(summary.clone());
        summary
    }

    pub fn summary(&self) -> Option<&FinalSummary> {
        self.summary.as_ref()
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    fn question_view(&self, index: usize) -> QuestionView {
        let q = &self.questions[index];
        QuestionView {
            index,
            title: q.title.clone(),
            description: q.description.clone(),
            difficulty: q.difficulty,
            topic: q.topic.clone(),
            sample_input: q.sample_input.clone(),
            sample_output: q.sample_output.clone(),
            hints: q.hints.clone(),
            test_case_count: q.test_cases.len(),
            state: self.question_states[index],
            runs_remaining: self.runs_remaining[index],
            score: self.submissions.get(&index).map(|s| s.score),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            status: self.status,
            time_remaining: self.time_remaining,
            time_limit: self.time_limit,
            clock: format_clock(self.time_remaining),
            current_index: self.current_index,
            total_score: self.total_score(),
            max_score: self.max_score(),
            questions: (0..self.questions.len())
                .map(|i| self.question_view(i))
                .collect(),
            summary: self.summary.clone(),
        }
    }
}

// Inspection helpers used by tests.
#[cfg(test)]
impl AssessmentSession {
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn runs_remaining(&self, index: usize) -> Option<u32> {
        self.runs_remaining.get(index).copied()
    }

    pub fn question_state(&self, index: usize) -> Option<QuestionState> {
        self.question_states.get(index).copied()
    }

    pub fn submission(&self, index: usize) -> Option<&Submission> {
        self.submissions.get(&index)
    }
}
