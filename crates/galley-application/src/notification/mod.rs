//! Notification application services.
//!
//! Renders [`NotificationIntent`](galley_core::notification::NotificationIntent)s
//! with templates, resolves recipients and fans messages out.

mod dispatcher;
mod templates;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use templates::MessageTemplates;
