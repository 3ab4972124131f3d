//! Room store interface and implementations
//!
//! This module defines the transactional unit-of-work contract the lifecycle
//! engine runs against, with an in-memory reference implementation.

pub mod memory;

pub use memory::InMemoryRoomStore;

use crate::error::Result;
use crate::types::{LiveDifficulty, LiveId, RoomId, RoomStatus, UserId};
use chrono::{DateTime, Utc};

/// Durable user row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub token: String,
    pub leader_card_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Durable room row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: RoomId,
    pub live_id: LiveId,
    pub owner_id: UserId,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

/// Durable membership row; result columns stay unset until the member
/// submits, and are always written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub difficulty: LiveDifficulty,
    pub judge_count_list: Option<Vec<i64>>,
    pub score: Option<i64>,
}

/// Trait for stores that can open transactional units of work
pub trait RoomStore: Send + Sync {
    /// Begin a serializable transaction
    ///
    /// Writes become visible to other transactions only at `commit`;
    /// dropping the transaction without committing rolls everything back.
    fn begin(&self) -> Result<Box<dyn StoreTx + '_>>;
}

/// One atomic unit of work against the store
pub trait StoreTx {
    /// Insert a new user; fails with `RoomServiceError::TokenConflict` if
    /// the token is already taken.
    fn insert_user(&mut self, name: &str, token: &str, leader_card_id: i64) -> Result<UserId>;

    fn user_by_token(&mut self, token: &str) -> Result<Option<UserRecord>>;

    fn user_by_id(&mut self, user_id: UserId) -> Result<Option<UserRecord>>;

    /// Overwrite mutable profile fields; returns false if no user matched
    fn update_user(&mut self, token: &str, name: &str, leader_card_id: i64) -> Result<bool>;

    /// Insert a room in `Waiting` with the given owner, returning its id
    fn insert_room(&mut self, live_id: LiveId, owner_id: UserId) -> Result<RoomId>;

    fn room(&mut self, room_id: RoomId) -> Result<Option<RoomRecord>>;

    /// Waiting rooms matching `live_id` (`LIVE_ID_ANY` matches all), each
    /// with its current member count
    fn waiting_rooms(&mut self, live_id: LiveId) -> Result<Vec<(RoomRecord, usize)>>;

    fn set_room_status(&mut self, room_id: RoomId, status: RoomStatus) -> Result<()>;

    fn set_room_owner(&mut self, room_id: RoomId, owner_id: UserId) -> Result<()>;

    /// Members of a room, ordered by user id
    fn members(&mut self, room_id: RoomId) -> Result<Vec<MemberRecord>>;

    /// Exclusive read of a room's membership set
    ///
    /// The join path counts through this method so that the count and the
    /// following insert are atomic against concurrent joiners. A SQL-backed
    /// store maps this to `SELECT ... FOR UPDATE`; the in-memory store's
    /// transaction mutex already serializes it.
    fn members_for_update(&mut self, room_id: RoomId) -> Result<Vec<MemberRecord>>;

    fn insert_member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        difficulty: LiveDifficulty,
    ) -> Result<()>;

    /// Delete a membership row; returns false if it did not exist
    fn remove_member(&mut self, room_id: RoomId, user_id: UserId) -> Result<bool>;

    /// Write a member's judge counts and score together; returns false if
    /// the membership row does not exist
    fn record_result(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        judge_counts: &[i64],
        score: i64,
    ) -> Result<bool>;

    /// Apply all staged writes atomically
    fn commit(self: Box<Self>) -> Result<()>;
}
