//! Room lifecycle engine implementation
//!
//! Every operation runs as a single transaction against the room store, so
//! partial application of a multi-step transition is never observable. The
//! join path re-counts membership through the store's exclusive read, which
//! makes the capacity check and the insert atomic against concurrent
//! joiners.

use crate::error::{Result, RoomServiceError};
use crate::metrics::MetricsCollector;
use crate::results::ResultAggregator;
use crate::store::RoomStore;
use crate::types::{
    JoinRoomResult, LiveDifficulty, LiveId, RoomId, RoomInfo, RoomSnapshot, RoomStatus, RoomUser,
    UserId, LIVE_ID_ANY, MAX_ROOM_MEMBERS,
};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Statistics about engine operations
#[derive(Debug, Clone, Default)]
pub struct RoomEngineStats {
    /// Total number of rooms created
    pub rooms_created: u64,
    /// Total number of accepted joins (the creator's implicit membership
    /// is not counted)
    pub players_joined: u64,
    /// Total number of games started
    pub games_started: u64,
    /// Total number of results recorded
    pub results_recorded: u64,
    /// Total number of rooms that reached `Dissolution`
    pub rooms_dissolved: u64,
    /// Current number of rooms still in `Waiting`
    pub waiting_rooms: usize,
}

/// The room lifecycle engine
#[derive(Clone)]
pub struct RoomEngine {
    /// Shared relational store, one unit of work per operation
    store: Arc<dyn RoomStore>,
    /// Engine statistics
    stats: Arc<RwLock<RoomEngineStats>>,
    /// Metrics collector for recording operation outcomes
    metrics: Arc<MetricsCollector>,
}

impl RoomEngine {
    /// Create an engine with a private metrics collector
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self::with_metrics(store, Arc::new(MetricsCollector::default()))
    }

    /// Create an engine that records into a shared metrics collector
    pub fn with_metrics(store: Arc<dyn RoomStore>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            store,
            stats: Arc::new(RwLock::new(RoomEngineStats::default())),
            metrics,
        }
    }

    /// Create a room in `Waiting` with the creator as its only member
    pub fn create_room(
        &self,
        owner_id: UserId,
        live_id: LiveId,
        difficulty: LiveDifficulty,
    ) -> Result<RoomId> {
        let mut tx = self.store.begin()?;

        if tx.user_by_id(owner_id)?.is_none() {
            return Err(RoomServiceError::UserNotFound {
                identifier: owner_id.to_string(),
            }
            .into());
        }

        let room_id = tx.insert_room(live_id, owner_id)?;
        tx.insert_member(room_id, owner_id, difficulty)?;
        tx.commit()?;

        self.update_stats(|stats| stats.rooms_created += 1)?;
        self.metrics.record_room_created();

        info!(
            "Created room {} (live_id: {}, owner: {})",
            room_id, live_id, owner_id
        );
        Ok(room_id)
    }

    /// List waiting rooms for a song, or all waiting rooms for the wildcard
    ///
    /// Unsynchronized read; listings may lag concurrent joins slightly.
    pub fn list_rooms(&self, live_id: LiveId) -> Result<Vec<RoomInfo>> {
        let mut tx = self.store.begin()?;
        let rooms = tx.waiting_rooms(live_id)?;

        debug!(
            "Listed {} waiting rooms (live_id: {})",
            rooms.len(),
            live_id
        );

        Ok(rooms
            .into_iter()
            .map(|(room, count)| RoomInfo {
                room_id: room.id,
                live_id: room.live_id,
                joined_user_count: count as i64,
                max_user_count: MAX_ROOM_MEMBERS as i64,
            })
            .collect())
    }

    /// Attempt to join a waiting room
    ///
    /// Join failures are expected outcomes, so they are returned as data
    /// rather than raised. The member count is taken through the store's
    /// exclusive read and the insert happens in the same transaction, so
    /// two concurrent joiners can never both pass the capacity check.
    pub fn join_room(
        &self,
        room_id: RoomId,
        user_id: UserId,
        difficulty: LiveDifficulty,
    ) -> Result<JoinRoomResult> {
        let mut tx = self.store.begin()?;

        let Some(room) = tx.room(room_id)? else {
            debug!("Join rejected: room {} does not exist", room_id);
            return self.finish_join(JoinRoomResult::OtherError);
        };

        if room.status != RoomStatus::Waiting {
            debug!(
                "Join rejected: room {} is {} (user: {})",
                room_id, room.status, user_id
            );
            return self.finish_join(JoinRoomResult::Disbanded);
        }

        let members = tx.members_for_update(room_id)?;

        if members.iter().any(|member| member.user_id == user_id) {
            debug!(
                "Join rejected: user {} already in room {}",
                user_id, room_id
            );
            return self.finish_join(JoinRoomResult::OtherError);
        }

        if members.len() >= MAX_ROOM_MEMBERS {
            debug!("Join rejected: room {} is full", room_id);
            return self.finish_join(JoinRoomResult::RoomFull);
        }

        tx.insert_member(room_id, user_id, difficulty)?;
        tx.commit()?;

        self.update_stats(|stats| stats.players_joined += 1)?;
        info!("User {} joined room {}", user_id, room_id);
        self.finish_join(JoinRoomResult::Ok)
    }

    /// Consistent snapshot of a room and its members
    pub fn room_status(&self, room_id: RoomId, requester: UserId) -> Result<RoomSnapshot> {
        let mut tx = self.store.begin()?;

        let room = tx
            .room(room_id)?
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        let mut members = Vec::new();
        for member in tx.members(room_id)? {
            let user = tx.user_by_id(member.user_id)?.ok_or_else(|| {
                RoomServiceError::InternalError {
                    message: format!(
                        "membership of room {} references missing user {}",
                        room_id, member.user_id
                    ),
                }
            })?;

            members.push(RoomUser {
                user_id: user.id,
                name: user.name,
                leader_card_id: user.leader_card_id,
                select_difficulty: member.difficulty,
                is_me: member.user_id == requester,
                is_host: member.user_id == room.owner_id,
            });
        }

        Ok(RoomSnapshot {
            status: room.status,
            members,
        })
    }

    /// Start the game; owner-only, from `Waiting` only
    pub fn start_room(&self, actor: UserId, room_id: RoomId) -> Result<()> {
        let mut tx = self.store.begin()?;

        let room = tx
            .room(room_id)?
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        if room.owner_id != actor {
            return Err(RoomServiceError::NotRoomOwner {
                room_id,
                user_id: actor,
            }
            .into());
        }

        if room.status != RoomStatus::Waiting {
            return Err(RoomServiceError::InvalidRoomStatus {
                room_id,
                actual: room.status,
                required: RoomStatus::Waiting,
            }
            .into());
        }

        tx.set_room_status(room_id, RoomStatus::LiveStart)?;
        tx.commit()?;

        self.update_stats(|stats| stats.games_started += 1)?;
        self.metrics.record_game_started();

        info!("Room {} started by owner {}", room_id, actor);
        Ok(())
    }

    /// Record the caller's result and dissolve the room
    ///
    /// The first finisher ends the room for everyone; later finishers hit a
    /// room already in `Dissolution` and still get their result recorded.
    /// Only a finish on a room that never started is an error.
    pub fn finish_room(
        &self,
        actor: UserId,
        room_id: RoomId,
        judge_counts: &[i64],
        score: i64,
    ) -> Result<()> {
        let mut tx = self.store.begin()?;

        let room = tx
            .room(room_id)?
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        if room.status == RoomStatus::Waiting {
            return Err(RoomServiceError::InvalidRoomStatus {
                room_id,
                actual: room.status,
                required: RoomStatus::LiveStart,
            }
            .into());
        }

        ResultAggregator::record(&mut *tx, room_id, actor, judge_counts, score)?;

        let dissolved_now = room.status != RoomStatus::Dissolution;
        if dissolved_now {
            tx.set_room_status(room_id, RoomStatus::Dissolution)?;
        }
        tx.commit()?;

        self.update_stats(|stats| {
            stats.results_recorded += 1;
            if dissolved_now {
                stats.rooms_dissolved += 1;
            }
        })?;
        self.metrics.record_result_submitted();
        if dissolved_now {
            self.metrics.record_room_dissolved("finished");
            info!("Room {} finished by user {}, dissolving", room_id, actor);
        } else {
            debug!(
                "Late result for dissolved room {} from user {}",
                room_id, actor
            );
        }

        Ok(())
    }

    /// Leave a waiting room
    ///
    /// Removing the last member dissolves the room; if the owner leaves
    /// while others remain, ownership transfers to the remaining member
    /// with the lowest user id.
    pub fn leave_room(&self, room_id: RoomId, member_id: UserId) -> Result<()> {
        let mut tx = self.store.begin()?;

        let room = tx
            .room(room_id)?
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        if room.status != RoomStatus::Waiting {
            return Err(RoomServiceError::InvalidRoomStatus {
                room_id,
                actual: room.status,
                required: RoomStatus::Waiting,
            }
            .into());
        }

        if !tx.remove_member(room_id, member_id)? {
            return Err(RoomServiceError::MemberNotFound {
                room_id,
                user_id: member_id,
            }
            .into());
        }

        let remaining = tx.members(room_id)?;
        let dissolved = remaining.is_empty();

        if dissolved {
            tx.set_room_status(room_id, RoomStatus::Dissolution)?;
        } else if room.owner_id == member_id {
            // members come back ordered by user id
            let heir = remaining[0].user_id;
            tx.set_room_owner(room_id, heir)?;
            info!(
                "Ownership of room {} transferred from {} to {}",
                room_id, member_id, heir
            );
        }
        tx.commit()?;

        if dissolved {
            self.update_stats(|stats| stats.rooms_dissolved += 1)?;
            self.metrics.record_room_dissolved("abandoned");
            info!("Room {} dissolved: last member {} left", room_id, member_id);
        } else {
            info!("User {} left room {}", member_id, room_id);
        }

        Ok(())
    }

    /// Engine statistics, with the waiting-room gauge freshly computed
    pub fn get_stats(&self) -> Result<RoomEngineStats> {
        let mut stats = self
            .stats
            .read()
            .map_err(|_| RoomServiceError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?
            .clone();

        let mut tx = self.store.begin()?;
        stats.waiting_rooms = tx.waiting_rooms(LIVE_ID_ANY)?.len();
        Ok(stats)
    }

    fn update_stats(&self, apply: impl FnOnce(&mut RoomEngineStats)) -> Result<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| RoomServiceError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;

        apply(&mut stats);
        Ok(())
    }

    fn finish_join(&self, outcome: JoinRoomResult) -> Result<JoinRoomResult> {
        self.metrics.record_join_outcome(outcome);
        Ok(outcome)
    }
}
