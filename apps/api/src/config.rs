use anyhow::{Context, Result};

use crate::assessment::session::SessionSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub backend_api_url: String,
    /// Countdown length for every new session, in seconds.
    pub session_time_limit_secs: u32,
    /// Per-question run quota.
    pub runs_per_question: u32,
    /// How long a closed session stays readable before eviction, in seconds.
    pub session_retention_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            backend_api_url: std::env::var("BACKEND_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string())
                .trim_end_matches('/')
                .to_string(),
            session_time_limit_secs: parse_env("SESSION_TIME_LIMIT_SECS", 30 * 60)?,
            runs_per_question: parse_env("RUNS_PER_QUESTION", 3)?,
            session_retention_secs: parse_env("SESSION_RETENTION_SECS", 60 * 60)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            time_limit_secs: self.session_time_limit_secs,
            runs_per_question: self.runs_per_question,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
