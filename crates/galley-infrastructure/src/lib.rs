pub mod config_service;
pub mod logging_messenger;
pub mod memory_store;
pub mod paths;
pub mod toml_catalog_repository;

pub use crate::config_service::ConfigService;
pub use crate::logging_messenger::{LoggingMessenger, OutboxEntry};
pub use crate::memory_store::InMemoryStore;
pub use crate::paths::GalleyPaths;
pub use crate::toml_catalog_repository::TomlCatalogRepository;
