use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::assessment::controller::SessionController;

const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Live sessions by externally supplied id. Sessions share nothing else.
///
/// Closed sessions stay readable (snapshot, repeated finalize) for the
/// retention window, then `evict_closed` drops them.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<SessionController>>>>,
    retention: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl SessionRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionController>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Registers `controller` unless another start for the same id won the
    /// race; the loser is finalized and the existing controller returned.
    pub async fn insert_or_existing(
        &self,
        session_id: &str,
        controller: Arc<SessionController>,
    ) -> Arc<SessionController> {
        let existing = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(session_id) {
                Some(existing) => existing.clone(),
                None => {
                    sessions.insert(session_id.to_string(), controller.clone());
                    return controller;
                }
            }
        };

        info!("Session {session_id} was started concurrently; keeping the first one");
        controller.finalize().await;
        existing
    }

    /// Drops sessions closed longer than the retention window before `now`.
    /// Returns how many were removed.
    pub async fn evict_closed(&self, now: DateTime<Utc>) -> usize {
        let retention = chrono::Duration::from_std(self.retention)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));

        let entries: Vec<(String, Arc<SessionController>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, controller)| (id.clone(), controller.clone()))
            .collect();

        let mut expired = Vec::new();
        for (id, controller) in entries {
            if let Some(closed_at) = controller.closed_at().await {
                if closed_at + retention <= now {
                    expired.push((id, controller));
                }
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for (id, controller) in expired {
            // Only remove the exact controller inspected above.
            if sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &controller))
            {
                sessions.remove(&id);
                removed += 1;
            }
        }
        info!("Evicted {removed} closed sessions");
        removed
    }

    /// Background sweep calling `evict_closed` every `every`.
    pub fn spawn_eviction(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = registry.evict_closed(Utc::now()).await;
                debug!("Eviction sweep removed {removed} sessions");
            }
        })
    }
}
