//! Application layer for Galley.
//!
//! Coordinates the core domain (catalog, extraction, sessions, lifecycle)
//! with outbound collaborators to implement order intake and fulfillment.

pub mod intake_service;
pub mod notification;

pub use intake_service::{Collaborators, OrderIntakeService, Utterance, UtteranceReply};
pub use notification::{DispatchReport, MessageTemplates, NotificationDispatcher};
