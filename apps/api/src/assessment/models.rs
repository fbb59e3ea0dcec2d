use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(alias = "python")]
    Python,
    #[serde(rename = "C++", alias = "cpp", alias = "c++", alias = "Cpp")]
    Cpp,
    #[serde(alias = "java")]
    Java,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Cpp, Language::Java];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::Java => "Java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic assigned to the session by the interview backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    pub description: String,
}

/// One coding problem. Immutable once generated.
///
/// Invariants: `title` and `description` are non-empty and there is at least
/// one test case. Both the generated and the fallback path uphold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub topic_id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub title: String,
    pub description: String,
    pub sample_input: String,
    pub sample_output: String,
    pub hints: Vec<String>,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    NotSubmitted,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// Outcome of one budget-limited run against the sample input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub is_output: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Trimmed output equals trimmed expected output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<bool>,
}

impl RunResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_output: false,
            message: message.into(),
            expected: None,
            matches: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub passed: bool,
    pub message: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub question_index: usize,
    pub topic_id: i64,
    pub topic: String,
    pub title: String,
    pub code: String,
    pub language: Language,
    pub test_results: Vec<TestResult>,
    pub passed_count: usize,
    pub total_count: usize,
    /// 0–10; 10 exactly when every test passed.
    pub score: u32,
    pub all_passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub topic_id: i64,
    pub question_index: usize,
    pub topic: String,
    pub title: String,
    pub code: String,
    pub score: u32,
    pub passed: bool,
    pub tests_passed: usize,
    pub total_tests: usize,
}

impl From<&Submission> for SubmissionSummary {
    fn from(sub: &Submission) -> Self {
        Self {
            topic_id: sub.topic_id,
            question_index: sub.question_index,
            topic: sub.topic.clone(),
            title: sub.title.clone(),
            code: sub.code.clone(),
            score: sub.score,
            passed: sub.all_passed,
            tests_passed: sub.passed_count,
            total_tests: sub.total_count,
        }
    }
}

/// End-of-session report produced exactly once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    pub session_id: String,
    pub total_score: u32,
    pub max_score: u32,
    pub attempted: usize,
    pub total: usize,
    pub time_used: u32,
    pub time_limit: u32,
    pub submissions: Vec<SubmissionSummary>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_accepts_backend_casing() {
        let d: Difficulty = serde_json::from_str(r#""easy""#).unwrap();
        assert_eq!(d, Difficulty::Easy);
        let d: Difficulty = serde_json::from_str(r#""Hard""#).unwrap();
        assert_eq!(d, Difficulty::Hard);
        assert!(serde_json::from_str::<Difficulty>(r#""Insane""#).is_err());
    }

    #[test]
    fn test_language_serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), r#""C++""#);
        let lang: Language = serde_json::from_str(r#""cpp""#).unwrap();
        assert_eq!(lang, Language::Cpp);
        let lang: Language = serde_json::from_str(r#""Java""#).unwrap();
        assert_eq!(lang, Language::Java);
    }

    #[test]
    fn test_topic_deserializes_backend_shape() {
        let json = r#"[{"id": 7, "topic": "arrays", "difficulty": "Easy"}]"#;
        let topics: Vec<Topic> = serde_json::from_str(json).unwrap();
        assert_eq!(topics[0].id, 7);
        assert_eq!(topics[0].topic, "arrays");
    }

    #[test]
    fn test_rejected_run_result_omits_expected() {
        let result = RunResult::rejected("No runs left for this question");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_output"], false);
        assert!(json.get("expected").is_none());
    }
}
