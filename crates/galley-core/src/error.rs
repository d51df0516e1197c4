//! Error types for the Galley engine.

use crate::notification::Audience;
use thiserror::Error;

/// A shared error type for the entire Galley engine.
///
/// Extraction and matching never produce errors: "nothing understood" is an
/// empty extraction. Everything here is either a state-machine rejection, a
/// collaborator failure, or a configuration problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalleyError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Requested status is not an allowed successor of the current one
    #[error("Invalid transition for order '{order_id}': {from} -> {to}")]
    InvalidTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Order payload rejected before reaching storage
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Catalog could not be (re)loaded; the previous snapshot stays in use
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// No recipient could be resolved for an audience
    #[error("No recipient resolved for audience '{audience}'")]
    RecipientUnresolved { audience: String },

    /// Outbound messaging failed for one recipient
    #[error("Messaging failure for '{recipient}': {message}")]
    Messaging { recipient: String, message: String },

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Language-model provider failure
    #[error("Language model error: {0}")]
    LanguageModel(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GalleyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NotFound error for an order
    pub fn order_not_found(id: impl Into<String>) -> Self {
        Self::not_found("Order", id)
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidOrder error
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::InvalidOrder(message.into())
    }

    /// Creates a Messaging error
    pub fn messaging(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Messaging {
            recipient: recipient.into(),
            message: message.into(),
        }
    }

    /// Creates a RecipientUnresolved error
    pub fn recipient_unresolved(audience: Audience) -> Self {
        Self::RecipientUnresolved {
            audience: audience.to_string(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an InvalidTransition error
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Check if this is a RecipientUnresolved error
    pub fn is_recipient_unresolved(&self) -> bool {
        matches!(self, Self::RecipientUnresolved { .. })
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Whether the caller should apologize and flag the conversation for staff
    /// rather than ask the guest to rephrase.
    pub fn needs_staff(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Io { .. } | Self::Internal(_) | Self::Config(_)
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GalleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for GalleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GalleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for GalleyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, GalleyError>`.
pub type Result<T> = std::result::Result<T, GalleyError>;
