//! Configuration management for the green-room service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the room service.

pub mod app;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, DirectorySettings, ServiceSettings};
