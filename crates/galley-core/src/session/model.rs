//! Conversation session model.

use crate::extraction::Channel;
use crate::order::{OrderId, OrderLine};
use crate::room::Room;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Represents the role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The guest.
    User,
    /// The engine's reply.
    Assistant,
    /// System-generated context.
    System,
}

/// A single turn in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Per-conversation state for one caller or texter.
///
/// Values of this type are copies: the [`SessionStore`](super::SessionStore)
/// owns the stored session and callers hand back an updated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Call identifier (voice) or phone number (text).
    pub key: String,
    pub channel: Channel,
    /// Resolved once, then cached for the session.
    pub room: Option<Room>,
    turns: VecDeque<Turn>,
    max_history: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Orders placed through this conversation (association only).
    pub order_ids: Vec<OrderId>,
    /// Lines understood before the room was known.
    pub draft: Vec<OrderLine>,
    /// Preparation requests gathered with the draft.
    #[serde(default)]
    pub draft_instructions: Vec<String>,
    /// Consecutive turns where nothing was understood.
    pub misunderstood_turns: u32,
}

impl ConversationSession {
    pub fn new(key: impl Into<String>, channel: Channel, max_history: usize) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            channel,
            room: None,
            turns: VecDeque::new(),
            max_history: max_history.max(1),
            created_at: now,
            last_activity: now,
            order_ids: Vec::new(),
            draft: Vec::new(),
            draft_instructions: Vec::new(),
            misunderstood_turns: 0,
        }
    }

    /// Appends a turn, dropping the oldest beyond the history window.
    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        let now = Utc::now();
        self.turns.push_back(Turn {
            role,
            text: text.into(),
            at: now,
        });
        while self.turns.len() > self.max_history {
            self.turns.pop_front();
        }
        self.last_activity = now;
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been idle for longer than `max_idle` at `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> bool {
        match now.signed_duration_since(self.last_activity).to_std() {
            Ok(idle) => idle > max_idle,
            // last_activity in the future
            Err(_) => false,
        }
    }

    pub fn room_number(&self) -> Option<&str> {
        self.room.as_ref().map(|r| r.number.as_str())
    }
}
