//! Notification domain module.
//!
//! The lifecycle emits [`NotificationIntent`]s; the dispatcher in the
//! application layer renders and sends them and appends
//! [`NotificationRecord`]s to the log.

mod messenger;
mod model;
mod repository;

pub use messenger::OutboundMessenger;
pub use model::{Audience, DeliveryOutcome, NotificationIntent, NotificationRecord};
pub use repository::NotificationLogRepository;
