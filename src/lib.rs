//! Green Room - Matchmaking microservice for rhythm-game play rooms
//!
//! This crate provides room-based matchmaking: users create or join
//! short-lived rooms tied to a song, play a round together, and submit
//! their results. The core is the room lifecycle state machine with
//! concurrency-safe bounded-capacity joining.

pub mod config;
pub mod error;
pub mod metrics;
pub mod results;
pub mod room;
pub mod service;
pub mod store;
pub mod types;
pub mod user;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, RoomServiceError};
pub use types::*;

// Re-export key components
pub use results::ResultAggregator;
pub use room::{RoomEngine, RoomEngineStats};
pub use store::{InMemoryRoomStore, RoomStore};
pub use user::UserDirectory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
