//! Question Generator — turns a backend topic into a `Question`.
//!
//! Flow: build prompt → completion call → extract first JSON object →
//!       decode + validate → `Question`.
//!
//! Any failure along that path (call error, no JSON, bad JSON, missing
//! fields, zero test cases) falls back to a locally synthesized question, so
//! session start never aborts because of the model.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::assessment::models::{Question, TestCase, Topic};
use crate::assessment::prompts::{fill_template, QUESTION_PROMPT_TEMPLATE};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{extract_json_object, CompletionService, LlmError};

/// Only the first three topics of a session get a question. Extra topics
/// returned by the backend are ignored on purpose.
pub const MAX_QUESTIONS_PER_SESSION: usize = 3;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("model output is not a valid question object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("generated question is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    title: Option<String>,
    description: Option<String>,
    test_cases: Option<Vec<RawTestCase>>,
    #[serde(default)]
    sample_input: Value,
    #[serde(default)]
    sample_output: Value,
    #[serde(default)]
    hints: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawTestCase {
    #[serde(default)]
    input: Value,
    #[serde(default, alias = "expectedOutput", alias = "expected_output")]
    output: Value,
    #[serde(default)]
    description: Value,
}

/// Models happily emit arrays or numbers where strings were asked for;
/// render those as their JSON text rather than rejecting the question.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_blank(field: Option<String>, name: &'static str) -> Result<String, GenerationError> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(GenerationError::MissingField(name))
}

/// Decodes model output into a `Question` for `topic`.
///
/// Topic, difficulty and topic id always come from the backend topic, never
/// from the model's echo of them.
pub fn parse_generated_question(text: &str, topic: &Topic) -> Result<Question, GenerationError> {
    let object = extract_json_object(text).ok_or(GenerationError::NoJsonObject)?;
    let raw: RawQuestion = serde_json::from_str(object)?;

    let title = non_blank(raw.title, "title")?;
    let description = non_blank(raw.description, "description")?;

    let test_cases: Vec<TestCase> = raw
        .test_cases
        .ok_or(GenerationError::MissingField("testCases"))?
        .iter()
        .enumerate()
        .map(|(i, tc)| {
            let description = value_to_text(&tc.description);
            TestCase {
                input: value_to_text(&tc.input),
                expected_output: value_to_text(&tc.output),
                description: if description.is_empty() {
                    format!("Test case {}", i + 1)
                } else {
                    description
                },
            }
        })
        .collect();

    let first = test_cases
        .first()
        .ok_or(GenerationError::MissingField("testCases"))?;

    let mut sample_input = value_to_text(&raw.sample_input);
    let mut sample_output = value_to_text(&raw.sample_output);
    if sample_input.is_empty() && sample_output.is_empty() {
        sample_input = first.input.clone();
        sample_output = first.expected_output.clone();
    }

    Ok(Question {
        topic_id: topic.id,
        topic: topic.topic.clone(),
        difficulty: topic.difficulty,
        title,
        description,
        sample_input,
        sample_output,
        hints: raw
            .hints
            .iter()
            .map(value_to_text)
            .filter(|h| !h.is_empty())
            .collect(),
        test_cases,
    })
}

/// Locally synthesized question used whenever generation fails.
/// Satisfies every `Question` invariant so nothing downstream special-cases it.
pub fn fallback_question(topic: &Topic) -> Question {
    let label = topic.topic.trim();
    let label = if label.is_empty() { "General" } else { label };

    let mut chars = label.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    let case = |input: &str, output: &str, description: &str| TestCase {
        input: input.to_string(),
        expected_output: output.to_string(),
        description: description.to_string(),
    };

    Question {
        topic_id: topic.id,
        topic: topic.topic.clone(),
        difficulty: topic.difficulty,
        title: format!("{capitalized} Problem"),
        description: format!(
            "Solve a {label} related problem with {} difficulty. Implement the solution function.",
            topic.difficulty
        ),
        sample_input: "sample".to_string(),
        sample_output: "expected".to_string(),
        hints: vec![
            "Consider the problem constraints".to_string(),
            "Think about edge cases".to_string(),
        ],
        test_cases: vec![
            case("test1", "result1", "Basic test case"),
            case("test2", "result2", "Edge case"),
            case("test3", "result3", "Complex case"),
        ],
    }
}

/// Generates questions from topics through the completion service.
#[derive(Clone)]
pub struct QuestionGenerator {
    completion: Arc<dyn CompletionService>,
}

impl QuestionGenerator {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    async fn try_generate(&self, topic: &Topic) -> Result<Question, GenerationError> {
        let difficulty = topic.difficulty.to_string();
        let prompt = fill_template(
            QUESTION_PROMPT_TEMPLATE,
            &[("topic", topic.topic.as_str()), ("difficulty", difficulty.as_str())],
        );
        let text = self.completion.complete(&prompt, JSON_ONLY_SYSTEM).await?;
        parse_generated_question(&text, topic)
    }

    /// Always yields a question: the generated one, or the fallback.
    pub async fn generate(&self, topic: &Topic) -> Question {
        match self.try_generate(topic).await {
            Ok(question) => {
                info!(
                    "Generated question '{}' for topic '{}' ({})",
                    question.title, topic.topic, topic.difficulty
                );
                question
            }
            Err(e) => {
                warn!(
                    "Question generation failed for topic '{}': {e}; using fallback question",
                    topic.topic
                );
                fallback_question(topic)
            }
        }
    }

    /// One question per topic, in topic order, for at most
    /// `MAX_QUESTIONS_PER_SESSION` topics. Calls are sequential.
    pub async fn generate_set(&self, topics: &[Topic]) -> Vec<Question> {
        if topics.len() > MAX_QUESTIONS_PER_SESSION {
            info!(
                "Session has {} topics; generating questions for the first {}",
                topics.len(),
                MAX_QUESTIONS_PER_SESSION
            );
        }

        let mut questions = Vec::with_capacity(topics.len().min(MAX_QUESTIONS_PER_SESSION));
        for topic in topics.iter().take(MAX_QUESTIONS_PER_SESSION) {
            questions.push(self.generate(topic).await);
        }
        questions
    }
}
