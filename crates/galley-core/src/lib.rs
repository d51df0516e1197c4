pub mod catalog;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod notification;
pub mod order;
pub mod room;
pub mod session;

// Re-export common error type
pub use error::{GalleyError, Result};
