//! Conversation session module.
//!
//! - `model`: per-conversation state (`ConversationSession`, `Turn`)
//! - `store`: keyed store with per-key leases and idle sweep (`SessionStore`)

mod model;
mod store;

pub use model::{ConversationSession, Turn, TurnRole};
pub use store::{SessionLease, SessionStore, SessionTtl};
