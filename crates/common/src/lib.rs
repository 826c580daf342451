//! PaperDraft Common Library
//!
//! Shared code for the PaperDraft platform including:
//! - Database models and repository patterns
//! - LLM client abstraction
//! - Object storage client
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use llm::LlmClient;
pub use storage::Storage;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default LLM chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
