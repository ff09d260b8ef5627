//! Session manager for channel conversations.
//!
//! Sessions are created lazily on first access, discarded (not appended to)
//! once they have been idle longer than the policy timeout, and capped at
//! `max_turns` turns with FIFO eviction.
//!
//! Each channel's session sits behind its own `tokio::sync::Mutex`. The
//! `DashMap` only hands out `Arc` clones of those mutexes, so no map guard is
//! ever held across an `.await`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use docbot_types::chat::{MessageRole, Session, SessionPolicy, Turn};
use docbot_types::error::SessionError;

/// Owns all channel sessions and their expiry/eviction rules.
pub struct SessionManager {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    policy: SessionPolicy,
}

/// Exclusive handle on one channel's session.
///
/// While a `ChannelSession` is alive no other task can read-modify-write the
/// same channel. The dispatcher holds one for a whole pipeline run, which
/// keeps messages from one channel strictly ordered.
pub struct ChannelSession {
    guard: OwnedMutexGuard<Session>,
    policy: SessionPolicy,
}

impl ChannelSession {
    pub fn channel_id(&self) -> &str {
        &self.guard.channel_id
    }

    /// Read access to the underlying session.
    pub fn session(&self) -> &Session {
        &self.guard
    }

    /// Replace the session with an empty one if it has expired at `now`.
    ///
    /// Returns `true` when the stale session was discarded.
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.guard.is_expired(now, self.policy.timeout) {
            return false;
        }
        debug!(
            channel = %self.guard.channel_id,
            discarded_turns = self.guard.len(),
            "session expired, starting fresh"
        );
        let channel_id = self.guard.channel_id.clone();
        *self.guard = Session::new(channel_id, now);
        true
    }

    /// Append a turn at `now`, evicting the oldest turns past the cap.
    ///
    /// An expired session is discarded first. Returns the number of evicted turns.
    pub fn append_at(&mut self, role: MessageRole, text: impl Into<String>, now: DateTime<Utc>) -> usize {
        self.refresh_at(now);
        self.push_at(role, text, now)
    }

    /// Append a turn at `now` without an expiry check.
    ///
    /// For callers that already checked expiry when they took the lock.
    pub fn push_at(&mut self, role: MessageRole, text: impl Into<String>, now: DateTime<Utc>) -> usize {
        let turn = Turn {
            role,
            text: text.into(),
            timestamp: now,
        };
        let evicted = self.guard.push_turn(turn, self.policy.max_turns);
        if evicted > 0 {
            debug!(channel = %self.guard.channel_id, evicted, "evicted oldest turns");
        }
        evicted
    }

    /// Record a completed user/assistant exchange.
    ///
    /// Expiry is judged when the message arrives, not here: a slow pipeline
    /// run must not discard the history it was given.
    pub fn commit_exchange_at(&mut self, user_text: &str, assistant_text: &str, now: DateTime<Utc>) {
        self.push_at(MessageRole::User, user_text, now);
        self.push_at(MessageRole::Assistant, assistant_text, now);
    }

    /// Ordered copy of the current turns.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.guard.turns()
    }
}

impl SessionManager {
    /// Create a manager applying `policy` to every session.
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Acquire exclusive access to a channel's session, creating it if absent.
    pub async fn lock(&self, channel_id: &str) -> Result<ChannelSession, SessionError> {
        self.lock_at(channel_id, Utc::now()).await
    }

    pub async fn lock_at(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ChannelSession, SessionError> {
        validate_channel(channel_id)?;

        loop {
            let slot = self.slot(channel_id, now);
            let guard = Arc::clone(&slot).lock_owned().await;

            // The sweeper may have dropped this slot while we were waiting;
            // a guard on an orphaned slot would fork the channel's history.
            let still_current = self
                .sessions
                .get(channel_id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &slot));
            if still_current {
                return Ok(ChannelSession {
                    guard,
                    policy: self.policy,
                });
            }
        }
    }

    /// Return the live session for a channel, replacing it with an empty one
    /// if it is absent or expired.
    pub async fn get_or_create(&self, channel_id: &str) -> Result<Session, SessionError> {
        self.get_or_create_at(channel_id, Utc::now()).await
    }

    pub async fn get_or_create_at(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let mut channel = self.lock_at(channel_id, now).await?;
        channel.refresh_at(now);
        Ok(channel.session().clone())
    }

    /// Append one turn to a channel's session.
    pub async fn append_turn(
        &self,
        channel_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<(), SessionError> {
        self.append_turn_at(channel_id, role, text, Utc::now()).await
    }

    pub async fn append_turn_at(
        &self,
        channel_id: &str,
        role: MessageRole,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let mut channel = self.lock_at(channel_id, now).await?;
        channel.append_at(role, text, now);
        Ok(())
    }

    /// Read-only view of a channel's turns. Never creates or resets a session;
    /// an expired session reads as empty.
    pub async fn snapshot(&self, channel_id: &str) -> Result<Vec<Turn>, SessionError> {
        self.snapshot_at(channel_id, Utc::now()).await
    }

    pub async fn snapshot_at(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Turn>, SessionError> {
        validate_channel(channel_id)?;

        let Some(slot) = self.sessions.get(channel_id).map(|e| Arc::clone(e.value())) else {
            return Ok(Vec::new());
        };

        let session = slot.lock().await;
        if session.is_expired(now, self.policy.timeout) {
            Ok(Vec::new())
        } else {
            Ok(session.turns())
        }
    }

    /// Drop every idle session that has expired at `now`.
    ///
    /// Sessions currently locked by a pipeline are left alone. Returns the
    /// number of sessions removed.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let timeout = self.policy.timeout;
        let mut removed = 0;
        self.sessions.retain(|_, slot| {
            let keep = match slot.try_lock() {
                Ok(session) => !session.is_expired(now, timeout),
                Err(_) => true,
            };
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "swept expired sessions");
        }
        removed
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    /// Number of tracked sessions (including logically expired ones not yet swept).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn slot(&self, channel_id: &str, now: DateTime<Utc>) -> Arc<Mutex<Session>> {
        let entry = self
            .sessions
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(channel_id, now))));
        Arc::clone(entry.value())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

fn validate_channel(channel_id: &str) -> Result<(), SessionError> {
    if channel_id.trim().is_empty() {
        return Err(SessionError::InvalidChannel);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn texts(turns: &[Turn]) -> Vec<String> {
        turns.iter().map(|t| t.text.clone()).collect()
    }

    #[tokio::test]
    async fn commit_after_timeout_keeps_history_checked_on_arrival() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("C1", MessageRole::User, "q0", t0()).await.unwrap();
        mgr.append_turn_at("C1", MessageRole::Assistant, "a0", t0()).await.unwrap();

        let arrived = t0() + TimeDelta::minutes(29);
        let mut channel = mgr.lock_at("C1", arrived).await.unwrap();
        assert!(!channel.refresh_at(arrived));
        // The run finishes after the window would have closed.
        channel.commit_exchange_at("q1", "a1", t0() + TimeDelta::minutes(31));
        assert_eq!(texts(&channel.snapshot()), vec!["q0", "a0", "q1", "a1"]);
    }

    #[tokio::test]
    async fn get_or_create_starts_empty() {
        let mgr = SessionManager::default();
        let session = mgr.get_or_create_at("C1", t0()).await.unwrap();
        assert!(session.is_empty());
        assert_eq!(session.channel_id, "C1");
        assert_eq!(mgr.len(), 1);
    }

    #[tokio::test]
    async fn empty_channel_is_rejected() {
        let mgr = SessionManager::default();
        assert_eq!(
            mgr.get_or_create("").await.unwrap_err(),
            SessionError::InvalidChannel
        );
        assert_eq!(
            mgr.append_turn("   ", MessageRole::User, "hi").await.unwrap_err(),
            SessionError::InvalidChannel
        );
        assert_eq!(mgr.snapshot("").await.unwrap_err(), SessionError::InvalidChannel);
        assert!(mgr.is_empty());
    }

    #[tokio::test]
    async fn twenty_first_turn_evicts_the_first() {
        let mgr = SessionManager::default();
        // 21 messages within five minutes.
        for i in 1..=21 {
            let at = t0() + TimeDelta::seconds(i * 10);
            mgr.append_turn_at("C1", MessageRole::User, &format!("turn {i}"), at)
                .await
                .unwrap();
        }

        let turns = mgr.snapshot_at("C1", t0() + TimeDelta::minutes(5)).await.unwrap();
        assert_eq!(turns.len(), 20);
        let expected: Vec<String> = (2..=21).map(|i| format!("turn {i}")).collect();
        assert_eq!(texts(&turns), expected);
    }

    #[tokio::test]
    async fn turn_count_never_exceeds_cap() {
        let mgr = SessionManager::new(SessionPolicy::new(5, TimeDelta::minutes(30)));
        for i in 0..37 {
            mgr.append_turn_at("C1", MessageRole::Assistant, &i.to_string(), t0())
                .await
                .unwrap();
            let len = mgr.snapshot_at("C1", t0()).await.unwrap().len();
            assert!(len <= 5);
        }
        assert_eq!(
            texts(&mgr.snapshot_at("C1", t0()).await.unwrap()),
            vec!["32", "33", "34", "35", "36"]
        );
    }

    #[tokio::test]
    async fn expired_session_is_replaced() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("C1", MessageRole::User, "old topic", t0())
            .await
            .unwrap();

        let later = t0() + TimeDelta::minutes(31);
        let session = mgr.get_or_create_at("C1", later).await.unwrap();
        assert!(session.is_empty());
        assert_eq!(session.created_at, later);
    }

    #[tokio::test]
    async fn session_within_window_keeps_turns() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("C1", MessageRole::User, "q", t0()).await.unwrap();
        mgr.append_turn_at("C1", MessageRole::Assistant, "a", t0()).await.unwrap();

        let session = mgr
            .get_or_create_at("C1", t0() + TimeDelta::minutes(29))
            .await
            .unwrap();
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn append_after_expiry_discards_stale_turns() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("C1", MessageRole::User, "stale", t0()).await.unwrap();
        let later = t0() + TimeDelta::hours(2);
        mgr.append_turn_at("C1", MessageRole::User, "fresh", later).await.unwrap();
        assert_eq!(texts(&mgr.snapshot_at("C1", later).await.unwrap()), vec!["fresh"]);
    }

    #[tokio::test]
    async fn snapshot_does_not_mutate() {
        let mgr = SessionManager::default();

        // Unknown channel: empty, and no session is created.
        assert!(mgr.snapshot_at("C9", t0()).await.unwrap().is_empty());
        assert!(mgr.is_empty());

        // Expired channel: reads as empty but the stored session is untouched.
        mgr.append_turn_at("C1", MessageRole::User, "q", t0()).await.unwrap();
        let later = t0() + TimeDelta::minutes(45);
        assert!(mgr.snapshot_at("C1", later).await.unwrap().is_empty());
        let channel = mgr.lock_at("C1", later).await.unwrap();
        assert_eq!(channel.session().len(), 1);
        assert_eq!(channel.session().last_activity, t0());
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("C1", MessageRole::User, "one", t0()).await.unwrap();
        mgr.append_turn_at("C2", MessageRole::User, "two", t0()).await.unwrap();
        mgr.append_turn_at("C2", MessageRole::User, "three", t0()).await.unwrap();

        assert_eq!(mgr.snapshot_at("C1", t0()).await.unwrap().len(), 1);
        assert_eq!(mgr.snapshot_at("C2", t0()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn lock_excludes_other_writers() {
        let mgr = Arc::new(SessionManager::default());
        let held = mgr.lock("C1").await.unwrap();

        let contender = {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move {
                tokio::time::timeout(Duration::from_millis(50), mgr.lock("C1"))
                    .await
                    .is_ok()
            })
        };
        assert!(!contender.await.unwrap(), "second lock should block");

        // Other channels are not blocked.
        assert!(
            tokio::time::timeout(Duration::from_millis(50), mgr.lock("C2"))
                .await
                .is_ok()
        );
        drop(held);
        assert!(mgr.lock("C1").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_respect_cap() {
        let mgr = Arc::new(SessionManager::default());
        let mut handles = Vec::new();
        for i in 0..64 {
            let mgr = Arc::clone(&mgr);
            handles.push(tokio::spawn(async move {
                mgr.append_turn("C1", MessageRole::User, &format!("m{i}"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let turns = mgr.snapshot("C1").await.unwrap();
        assert_eq!(turns.len(), 20);
        let mut unique = texts(&turns);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 20, "no append was lost or duplicated");
    }

    #[tokio::test]
    async fn commit_exchange_appends_user_then_assistant() {
        let mgr = SessionManager::default();
        let mut channel = mgr.lock_at("C1", t0()).await.unwrap();
        channel.commit_exchange_at("question", "answer", t0());
        let turns = channel.snapshot();
        assert_eq!(turns[0].role, MessageRole::User);
        assert_eq!(turns[1].role, MessageRole::Assistant);
        assert_eq!(texts(&turns), vec!["question", "answer"]);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_idle_sessions() {
        let mgr = SessionManager::default();
        mgr.append_turn_at("old", MessageRole::User, "x", t0()).await.unwrap();
        mgr.append_turn_at("busy", MessageRole::User, "x", t0()).await.unwrap();
        let now = t0() + TimeDelta::minutes(40);
        mgr.append_turn_at("fresh", MessageRole::User, "x", now).await.unwrap();

        let busy = mgr.lock_at("busy", now).await.unwrap();
        assert_eq!(mgr.sweep_expired_at(now), 1);
        assert_eq!(mgr.len(), 2);
        drop(busy);

        assert_eq!(mgr.sweep_expired_at(now), 1);
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.snapshot_at("fresh", now).await.unwrap().len(), 1);
    }
}
