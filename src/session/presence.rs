//! Absence heuristic: last heartbeat per (session, player), classified against
//! three escalating deadlines.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::util::id::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    Online,
    Away,
    Warned,
    Forfeit,
}

#[derive(Debug, Clone, Copy)]
pub struct PresencePolicy {
    pub timeout: Duration,
    pub grace: Duration,
    pub final_grace: Duration,
}

impl PresencePolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: settings.presence_timeout,
            grace: settings.presence_grace,
            final_grace: settings.presence_final_grace,
        }
    }

    pub fn classify(&self, absent: Duration) -> PresenceState {
        let warned_at = self.timeout + self.grace;
        if absent >= warned_at + self.final_grace {
            PresenceState::Forfeit
        } else if absent >= warned_at {
            PresenceState::Warned
        } else if absent >= self.timeout {
            PresenceState::Away
        } else {
            PresenceState::Online
        }
    }
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Clone)]
pub struct PresenceTracker {
    last_seen: Arc<DashMap<(String, PlayerId), Instant>>,
    policy: PresencePolicy,
}

impl PresenceTracker {
    pub fn new(policy: PresencePolicy) -> Self {
        Self { last_seen: Arc::new(DashMap::new()), policy }
    }

    pub fn heartbeat(&self, session_id: &str, player: PlayerId) {
        self.heartbeat_at(session_id, player, Instant::now());
    }

    pub fn heartbeat_at(&self, session_id: &str, player: PlayerId, at: Instant) {
        self.last_seen.insert((session_id.to_string(), player), at);
    }

    /// Players never seen are treated as online.
    pub fn evaluate(&self, session_id: &str, player: PlayerId, now: Instant) -> PresenceState {
        match self.last_seen.get(&(session_id.to_string(), player)) {
            Some(seen) => self.policy.classify(now.saturating_duration_since(*seen)),
            None => PresenceState::Online,
        }
    }

    pub fn forget(&self, session_id: &str, player: PlayerId) {
        self.last_seen.remove(&(session_id.to_string(), player));
    }

    pub fn forget_session(&self, session_id: &str) {
        self.last_seen.retain(|(id, _), _| id != session_id);
    }
}
