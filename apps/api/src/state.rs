use crate::assessment::controller::SessionDeps;
use crate::assessment::registry::SessionRegistry;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Live sessions keyed by the externally supplied session id.
    pub sessions: SessionRegistry,
    /// Topic source, question generator, evaluator and score sink handed to
    /// every new session.
    pub deps: SessionDeps,
}
