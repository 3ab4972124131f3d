//! Common types used throughout the room service
//!
//! Enum fields travel as integers on the wire; internally they are named
//! variants, converted at (de)serialization time.

use serde::{Deserialize, Serialize};

/// Unique identifier for users
pub type UserId = i64;

/// Unique identifier for rooms
pub type RoomId = i64;

/// Identifier for a song ("live")
pub type LiveId = i64;

/// Fixed maximum number of concurrent members per room
pub const MAX_ROOM_MEMBERS: usize = 4;

/// `live_id` wildcard matching every song in listing queries
pub const LIVE_ID_ANY: LiveId = 0;

/// Difficulty a member selects when entering a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum LiveDifficulty {
    Normal,
    Hard,
}

impl From<LiveDifficulty> for i64 {
    fn from(value: LiveDifficulty) -> Self {
        match value {
            LiveDifficulty::Normal => 1,
            LiveDifficulty::Hard => 2,
        }
    }
}

impl TryFrom<i64> for LiveDifficulty {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LiveDifficulty::Normal),
            2 => Ok(LiveDifficulty::Hard),
            other => Err(format!("invalid live difficulty: {}", other)),
        }
    }
}

/// Outcome of a join attempt, delivered as data rather than an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum JoinRoomResult {
    Ok,
    RoomFull,
    Disbanded,
    OtherError,
}

impl From<JoinRoomResult> for i64 {
    fn from(value: JoinRoomResult) -> Self {
        match value {
            JoinRoomResult::Ok => 1,
            JoinRoomResult::RoomFull => 2,
            JoinRoomResult::Disbanded => 3,
            JoinRoomResult::OtherError => 4,
        }
    }
}

impl TryFrom<i64> for JoinRoomResult {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(JoinRoomResult::Ok),
            2 => Ok(JoinRoomResult::RoomFull),
            3 => Ok(JoinRoomResult::Disbanded),
            4 => Ok(JoinRoomResult::OtherError),
            other => Err(format!("invalid join result: {}", other)),
        }
    }
}

/// Lifecycle phase of a room
///
/// Transitions are monotonic: `Waiting -> LiveStart -> Dissolution`, or
/// `Waiting -> Dissolution` when the last member leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum RoomStatus {
    Waiting,
    LiveStart,
    Dissolution,
}

impl From<RoomStatus> for i64 {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Waiting => 1,
            RoomStatus::LiveStart => 2,
            RoomStatus::Dissolution => 3,
        }
    }
}

impl TryFrom<i64> for RoomStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RoomStatus::Waiting),
            2 => Ok(RoomStatus::LiveStart),
            3 => Ok(RoomStatus::Dissolution),
            other => Err(format!("invalid room status: {}", other)),
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomStatus::Waiting => write!(f, "Waiting"),
            RoomStatus::LiveStart => write!(f, "LiveStart"),
            RoomStatus::Dissolution => write!(f, "Dissolution"),
        }
    }
}

/// User profile without the token capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub leader_card_id: i64,
}

/// Listing entry for a waiting room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub live_id: LiveId,
    pub joined_user_count: i64,
    pub max_user_count: i64,
}

/// One member in a room-status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub user_id: UserId,
    pub name: String,
    pub leader_card_id: i64,
    pub select_difficulty: LiveDifficulty,
    pub is_me: bool,
    pub is_host: bool,
}

/// Consistent snapshot of a room and its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub status: RoomStatus,
    pub members: Vec<RoomUser>,
}

/// Submitted result of one member, returned by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultUser {
    pub user_id: UserId,
    pub judge_count_list: Vec<i64>,
    pub score: i64,
}
