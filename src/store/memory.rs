//! In-memory room store implementation
//!
//! Transactions hold the store mutex for their lifetime and mutate a staged
//! copy of the tables, so concurrent units of work are fully serialized and
//! an uncommitted transaction leaves the store untouched.

use crate::error::{Result, RoomServiceError};
use crate::store::{MemberRecord, RoomRecord, RoomStore, StoreTx, UserRecord};
use crate::types::{LiveDifficulty, LiveId, RoomId, RoomStatus, UserId, LIVE_ID_ANY};
use crate::utils::current_timestamp;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// All tables of the store
///
/// BTreeMap keys make iteration order deterministic: membership scans come
/// back ordered by `(room_id, user_id)`.
#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    token_index: HashMap<String, UserId>,
    rooms: BTreeMap<RoomId, RoomRecord>,
    members: BTreeMap<(RoomId, UserId), MemberRecord>,
    next_user_id: UserId,
    next_room_id: RoomId,
}

/// In-memory room store
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    tables: Mutex<Tables>,
}

impl InMemoryRoomStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn begin(&self) -> Result<Box<dyn StoreTx + '_>> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| RoomServiceError::InternalError {
                message: "Failed to acquire store lock".to_string(),
            })?;

        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

/// A unit of work over a staged copy of the tables
struct MemoryTx<'a> {
    guard: MutexGuard<'a, Tables>,
    staged: Tables,
}

impl MemoryTx<'_> {
    fn room_members(&self, room_id: RoomId) -> Vec<MemberRecord> {
        self.staged
            .members
            .range((room_id, UserId::MIN)..=(room_id, UserId::MAX))
            .map(|(_, member)| member.clone())
            .collect()
    }
}

impl StoreTx for MemoryTx<'_> {
    fn insert_user(&mut self, name: &str, token: &str, leader_card_id: i64) -> Result<UserId> {
        if self.staged.token_index.contains_key(token) {
            return Err(RoomServiceError::TokenConflict.into());
        }

        self.staged.next_user_id += 1;
        let id = self.staged.next_user_id;

        self.staged.users.insert(
            id,
            UserRecord {
                id,
                name: name.to_string(),
                token: token.to_string(),
                leader_card_id,
                created_at: current_timestamp(),
            },
        );
        self.staged.token_index.insert(token.to_string(), id);

        Ok(id)
    }

    fn user_by_token(&mut self, token: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .staged
            .token_index
            .get(token)
            .and_then(|id| self.staged.users.get(id))
            .cloned())
    }

    fn user_by_id(&mut self, user_id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.staged.users.get(&user_id).cloned())
    }

    fn update_user(&mut self, token: &str, name: &str, leader_card_id: i64) -> Result<bool> {
        let Some(id) = self.staged.token_index.get(token).copied() else {
            return Ok(false);
        };

        let user = self
            .staged
            .users
            .get_mut(&id)
            .ok_or_else(|| RoomServiceError::InternalError {
                message: format!("token index points at missing user {}", id),
            })?;

        user.name = name.to_string();
        user.leader_card_id = leader_card_id;
        Ok(true)
    }

    fn insert_room(&mut self, live_id: LiveId, owner_id: UserId) -> Result<RoomId> {
        self.staged.next_room_id += 1;
        let id = self.staged.next_room_id;

        self.staged.rooms.insert(
            id,
            RoomRecord {
                id,
                live_id,
                owner_id,
                status: RoomStatus::Waiting,
                created_at: current_timestamp(),
            },
        );

        Ok(id)
    }

    fn room(&mut self, room_id: RoomId) -> Result<Option<RoomRecord>> {
        Ok(self.staged.rooms.get(&room_id).cloned())
    }

    fn waiting_rooms(&mut self, live_id: LiveId) -> Result<Vec<(RoomRecord, usize)>> {
        let rooms = self
            .staged
            .rooms
            .values()
            .filter(|room| room.status == RoomStatus::Waiting)
            .filter(|room| live_id == LIVE_ID_ANY || room.live_id == live_id)
            .cloned()
            .collect::<Vec<_>>();

        Ok(rooms
            .into_iter()
            .map(|room| {
                let count = self.room_members(room.id).len();
                (room, count)
            })
            .collect())
    }

    fn set_room_status(&mut self, room_id: RoomId, status: RoomStatus) -> Result<()> {
        let room = self
            .staged
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        room.status = status;
        Ok(())
    }

    fn set_room_owner(&mut self, room_id: RoomId, owner_id: UserId) -> Result<()> {
        let room = self
            .staged
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        room.owner_id = owner_id;
        Ok(())
    }

    fn members(&mut self, room_id: RoomId) -> Result<Vec<MemberRecord>> {
        Ok(self.room_members(room_id))
    }

    fn members_for_update(&mut self, room_id: RoomId) -> Result<Vec<MemberRecord>> {
        // The transaction already holds the store mutex, so the plain read
        // is exclusive here; the separate method keeps the contract point a
        // row-locking store would need.
        Ok(self.room_members(room_id))
    }

    fn insert_member(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        difficulty: LiveDifficulty,
    ) -> Result<()> {
        self.staged.members.insert(
            (room_id, user_id),
            MemberRecord {
                room_id,
                user_id,
                difficulty,
                judge_count_list: None,
                score: None,
            },
        );
        Ok(())
    }

    fn remove_member(&mut self, room_id: RoomId, user_id: UserId) -> Result<bool> {
        Ok(self.staged.members.remove(&(room_id, user_id)).is_some())
    }

    fn record_result(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        judge_counts: &[i64],
        score: i64,
    ) -> Result<bool> {
        let Some(member) = self.staged.members.get_mut(&(room_id, user_id)) else {
            return Ok(false);
        };

        member.judge_count_list = Some(judge_counts.to_vec());
        member.score = Some(score);
        Ok(true)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
