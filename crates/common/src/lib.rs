//! PaperCompass Common Library
//! 
//! Shared code for the PaperCompass services including:
//! - Configuration management
//! - Error types and handling
//! - Account store (users, search history, password resets)
//! - Password hashing and session tokens
//! - Natural-language keyword expansion client
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod expansion;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use expansion::KeywordExpander;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default administrator account seeded into a fresh store
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Default administrator password seeded into a fresh store
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
