// Timed DSA assessment sessions.
// The state machine (session.rs) is pure; controller.rs drives it with the
// external collaborators. All LLM calls go through llm_client.

pub mod controller;
pub mod evaluator;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod templates;
pub mod timer;

#[cfg(test)]
pub mod testing;
