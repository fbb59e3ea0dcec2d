// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for every "pretend to execute this code" call.
pub const EXECUTION_SYSTEM: &str = "You are a strict code execution engine. \
    You reply with program output or a verdict only. \
    Never explain, never describe the code, never add commentary.";
