//! Shared library for the RhythMatch backend
//!
//! This library contains the ambient plumbing used by the HTTP service:
//! - Environment configuration
//! - Error taxonomy and HTTP mapping
//! - Session tokens and password hashing
//! - Database connection pooling

pub mod auth;
pub mod config;
pub mod database;
pub mod error;

// Re-export commonly used types
pub use auth::{AuthService, Claims, SessionToken};
pub use config::Config;
pub use error::{AppError, Result};
