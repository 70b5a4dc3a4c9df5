//! The registry of live display sessions.

use pmobackend::SignageBackend;
use pmoschedule::ResolveRequest;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::session::{DisplaySession, SessionId, SessionOptions};

/// How often the sweeper looks for idle sessions.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

type SessionMap = Arc<RwLock<HashMap<SessionId, Arc<DisplaySession>>>>;

/// Shared map of live sessions, with idle eviction.
///
/// A display that navigates away without a `DELETE` (a killed kiosk
/// browser, a dropped network) would otherwise leak its playback timer
/// forever; the background sweeper closes any session nobody has polled or
/// streamed within the TTL. Clones share the same map.
#[derive(Clone, Debug)]
pub struct SessionRegistry {
    sessions: SessionMap,
    _sweeper: Option<Arc<DropGuard>>,
}

impl SessionRegistry {
    /// Creates the registry; `ttl = None` disables eviction (tests,
    /// short-lived tools).
    pub fn new(ttl: Option<Duration>) -> Self {
        let sessions: SessionMap = Arc::new(RwLock::new(HashMap::new()));
        let sweeper = ttl.map(|ttl| {
            let cancel = CancellationToken::new();
            tokio::spawn(sweep(sessions.clone(), ttl, cancel.clone()));
            Arc::new(cancel.drop_guard())
        });
        Self {
            sessions,
            _sweeper: sweeper,
        }
    }

    /// Opens a new session and registers it.
    pub async fn open(
        &self,
        backend: Arc<dyn SignageBackend>,
        request: ResolveRequest,
        options: SessionOptions,
    ) -> Arc<DisplaySession> {
        let session = DisplaySession::open(backend, request, options).await;
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session.clone());
        session
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: &SessionId) -> Option<Arc<DisplaySession>> {
        let session = self.sessions.read().await.get(id).cloned();
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    /// Removes and closes a session. Returns whether it existed.
    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// Closes every live session; used on server shutdown.
    pub async fn close_all(&self) {
        let sessions: Vec<Arc<DisplaySession>> =
            self.sessions.write().await.drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.close().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

async fn sweep(sessions: SessionMap, ttl: Duration, cancel: CancellationToken) {
    let period = SWEEP_PERIOD.min(ttl);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let expired: Vec<Arc<DisplaySession>> = {
            let mut map = sessions.write().await;
            let ids: Vec<SessionId> = map
                .iter()
                .filter(|(_, session)| session.idle_for() >= ttl)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter().filter_map(|id| map.remove(&id)).collect()
        };
        for session in expired {
            tracing::info!(session = %session.id(), "evicting idle display session");
            session.close().await;
        }
    }
}
