//! Error types for the room service
//!
//! This module defines all error types using anyhow for consistent error
//! handling throughout the application.

use crate::types::{RoomId, RoomStatus, UserId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific room-service scenarios
#[derive(Debug, thiserror::Error)]
pub enum RoomServiceError {
    #[error("User not found: {identifier}")]
    UserNotFound { identifier: String },

    #[error("Room not found: {room_id}")]
    RoomNotFound { room_id: RoomId },

    #[error("User {user_id} is not a member of room {room_id}")]
    MemberNotFound { room_id: RoomId, user_id: UserId },

    #[error("User {user_id} is not the owner of room {room_id}")]
    NotRoomOwner { room_id: RoomId, user_id: UserId },

    #[error("Room {room_id} is {actual}, operation requires {required}")]
    InvalidRoomStatus {
        room_id: RoomId,
        actual: RoomStatus,
        required: RoomStatus,
    },

    #[error("Token already in use")]
    TokenConflict,

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
