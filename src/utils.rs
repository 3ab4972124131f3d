//! Utility functions for the room service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a fresh opaque session token for a new user
pub fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
