// Session registry - Owns every live dashboard session
use crate::application::session::{SessionDeps, SessionHandle, SessionSettings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound on how often the reaper sweeps; shorter idle timeouts sweep
/// at the timeout itself.
const REAP_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionRegistry {
    deps: SessionDeps,
    settings: SessionSettings,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(deps: SessionDeps, settings: SessionSettings) -> Self {
        Self {
            deps,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, user_id: &str, position: Option<(f64, f64)>) -> SessionHandle {
        let handle =
            SessionHandle::spawn(user_id, position, self.deps.clone(), self.settings.clone()).await;
        self.sessions.write().await.insert(handle.id(), handle.clone());
        tracing::info!("Opened session {} for {}", handle.id(), user_id);
        handle
    }

    /// Sessions whose actor has already stopped are dropped on lookup. A
    /// successful lookup counts as client activity.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(&id).cloned()?;
        if handle.is_closed() {
            self.sessions.write().await.remove(&id);
            return None;
        }
        handle.touch();
        Some(handle)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(handle) => {
                handle.shutdown();
                tracing::info!("Closed session {}", id);
                true
            }
            None => false,
        }
    }

    /// Shut down and forget sessions idle past the timeout, and any whose
    /// actor already stopped. Returns how many were dropped.
    pub async fn reap_idle(&self) -> usize {
        let timeout = self.settings.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| {
            if handle.is_closed() {
                return false;
            }
            if handle.idle_for() >= timeout {
                handle.shutdown();
                tracing::info!("Closed idle session {}", id);
                return false;
            }
            true
        });
        before - sessions.len()
    }

    /// Sweep for idle sessions in the background until the registry is dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let every = self.settings.idle_timeout.min(REAP_INTERVAL);
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let reaped = registry.reap_idle().await;
                if reaped > 0 {
                    tracing::debug!("Reaped {} idle sessions", reaped);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn shutdown_all(&self) {
        let mut sessions = self.sessions.write().await;
        for (_, handle) in sessions.drain() {
            handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::SessionCommand;
    use crate::application::test_support::Fixture;

    #[tokio::test(start_paused = true)]
    async fn test_create_get_remove() {
        let fixture = Fixture::new();
        let registry = SessionRegistry::new(fixture.deps(), fixture.settings.clone());

        let session = registry.create("alice", None).await;
        assert_eq!(registry.len().await, 1);
        let found = registry.get(session.id()).await.unwrap();
        assert_eq!(found.user_id(), "alice");

        assert!(registry.remove(session.id()).await);
        assert!(session.is_closed());
        assert!(registry.get(session.id()).await.is_none());
        assert!(!registry.remove(session.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_is_pruned() {
        let fixture = Fixture::new();
        let registry = SessionRegistry::new(fixture.deps(), fixture.settings.clone());

        let session = registry.create("bob", Some((1.0, 2.0))).await;
        session.shutdown();
        assert!(registry.get(session.id()).await.is_none());
        assert_eq!(registry.len().await, 0);

        registry.create("carol", None).await;
        registry.shutdown_all().await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_session_is_reaped() {
        let fixture = Fixture::new();
        let registry = Arc::new(SessionRegistry::new(fixture.deps(), fixture.settings.clone()));
        let reaper = registry.spawn_reaper();

        let session = registry.create("ghost", None).await;
        tokio::time::sleep(fixture.settings.idle_timeout + REAP_INTERVAL).await;

        assert_eq!(registry.len().await, 0);
        assert!(session.is_closed());
        assert!(registry.get(session.id()).await.is_none());

        let fetches = fixture.readings.calls().len();
        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        assert_eq!(fixture.readings.calls().len(), fetches);
        reaper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_session_outlives_idle_timeout() {
        let fixture = Fixture::new();
        let registry = Arc::new(SessionRegistry::new(fixture.deps(), fixture.settings.clone()));
        let reaper = registry.spawn_reaper();
        let timeout = fixture.settings.idle_timeout;

        let session = registry.create("dana", None).await;
        for _ in 0..4 {
            tokio::time::sleep(timeout / 2).await;
            session.send(SessionCommand::DismissError).unwrap();
        }
        assert_eq!(registry.len().await, 1);
        assert!(!session.is_closed());

        reaper.abort();
        tokio::time::sleep(timeout).await;
        assert_eq!(registry.reap_idle().await, 1);
        assert!(session.is_closed());
    }
}
