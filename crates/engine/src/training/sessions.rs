//! Pending training sessions, at most one per actor

use bazaar_core::{ActorId, TrainingSession};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Sessions with an idle TTL and a capacity bound
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: HashMap<ActorId, TrainingSession>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    fn is_expired(&self, session: &TrainingSession, now: DateTime<Utc>) -> bool {
        now - session.started_at > self.ttl
    }

    /// Open a session, returning the one it replaced (expired or not)
    pub fn open(&mut self, session: TrainingSession, now: DateTime<Utc>) -> Option<TrainingSession> {
        let previous = self.sessions.remove(&session.actor);

        if self.sessions.len() >= self.max_entries {
            self.purge_expired(now);
        }

        // still full, drop the oldest
        if self.sessions.len() >= self.max_entries {
            if let Some(oldest) = self
                .sessions
                .values()
                .min_by_key(|s| s.started_at)
                .map(|s| s.actor)
            {
                debug!("Session store full, evicting session of {}", oldest);
                self.sessions.remove(&oldest);
            }
        }

        self.sessions.insert(session.actor, session);
        previous
    }

    /// Live session of an actor, if any
    pub fn get(&self, actor: ActorId, now: DateTime<Utc>) -> Option<&TrainingSession> {
        self.sessions
            .get(&actor)
            .filter(|s| !self.is_expired(s, now))
    }

    /// Remove and return an actor's session. Expired sessions are dropped
    /// and reported as absent.
    pub fn take(&mut self, actor: ActorId, now: DateTime<Utc>) -> Option<TrainingSession> {
        let session = self.sessions.remove(&actor)?;
        if self.is_expired(&session, now) {
            debug!("Training session of {} expired", actor);
            return None;
        }
        Some(session)
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now - s.started_at <= ttl);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
