//! Keyed conversation session store with idle eviction.

use super::model::ConversationSession;
use crate::extraction::Channel;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedMutexGuard, RwLock};

/// Idle limits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub text: Duration,
    pub voice: Duration,
}

impl SessionTtl {
    /// Same limit for every channel.
    pub fn uniform(max_idle: Duration) -> Self {
        Self {
            text: max_idle,
            voice: max_idle,
        }
    }

    pub fn for_channel(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Text => self.text,
            Channel::Voice => self.voice,
        }
    }
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self {
            text: Duration::from_secs(60 * 60),
            voice: Duration::from_secs(15 * 60),
        }
    }
}

/// Exclusive read-modify-write access to one session.
///
/// Holding a lease blocks other checkouts of the same key until it is
/// committed or dropped. Dropping without commit discards the changes.
pub struct SessionLease {
    session: ConversationSession,
    _guard: OwnedMutexGuard<()>,
}

impl SessionLease {
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConversationSession {
        &mut self.session
    }

    pub fn key(&self) -> &str {
        &self.session.key
    }
}

/// In-memory store of conversation sessions.
///
/// `get`, `put`, `remove` and `sweep` are each atomic. Read-modify-write
/// sequences for one key go through [`SessionStore::checkout`] and
/// [`SessionStore::commit`], which serialize per key.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    max_history: usize,
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    /// Returns a copy of the session for `key`.
    pub async fn get(&self, key: &str) -> Option<ConversationSession> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Stores `session` under its key, replacing any previous value.
    pub async fn put(&self, session: ConversationSession) {
        self.sessions
            .write()
            .await
            .insert(session.key.clone(), session);
    }

    pub async fn remove(&self, key: &str) -> Option<ConversationSession> {
        let removed = self.sessions.write().await.remove(key);
        self.drop_idle_lock(key);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Waits for exclusive access to `key` and returns a copy of its session,
    /// creating a fresh one for `channel` if none exists.
    pub async fn checkout(&self, key: &str, channel: Channel) -> SessionLease {
        let lock = self.lock_for(key);
        let guard = lock.lock_owned().await;

        let session = match self.get(key).await {
            Some(existing) => existing,
            None => {
                tracing::debug!(key, %channel, "[SessionStore] new session");
                ConversationSession::new(key, channel, self.max_history)
            }
        };

        SessionLease {
            session,
            _guard: guard,
        }
    }

    /// Writes the leased session back and releases the key.
    pub async fn commit(&self, lease: SessionLease) {
        let SessionLease { session, _guard } = lease;
        self.put(session).await;
    }

    /// Removes sessions idle longer than their channel's TTL.
    pub async fn sweep(&self, ttl: &SessionTtl) -> usize {
        self.sweep_at(Utc::now(), ttl).await
    }

    /// [`SessionStore::sweep`] against an explicit clock. Idempotent.
    ///
    /// Sessions with a lease outstanding (or being acquired) are skipped.
    pub async fn sweep_at(&self, now: DateTime<Utc>, ttl: &SessionTtl) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());

        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.is_idle(now, ttl.for_channel(s.channel)))
            .map(|s| s.key.clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if let Some(lock) = locks.get(&key) {
                if Arc::strong_count(lock) > 1 {
                    tracing::debug!(key = %key, "[SessionStore] skipping leased session");
                    continue;
                }
                locks.remove(&key);
            }
            sessions.remove(&key);
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(
                removed,
                remaining = sessions.len(),
                "[SessionStore] swept idle sessions"
            );
        }
        removed
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn drop_idle_lock(&self, key: &str) {
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
