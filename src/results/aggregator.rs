//! Result aggregator implementation
//!
//! Results are written inside the finish transition's transaction and read
//! back by polling once the room has dissolved. Members that have not
//! submitted yet are simply omitted from the read, so a shorter list means
//! "still aggregating".

use crate::error::{Result, RoomServiceError};
use crate::store::{RoomStore, StoreTx};
use crate::types::{ResultUser, RoomId, RoomStatus, UserId};
use std::sync::Arc;

/// Records and serves per-member performance results
pub struct ResultAggregator {
    store: Arc<dyn RoomStore>,
}

impl ResultAggregator {
    /// Create an aggregator over the shared store
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// Write one member's result inside an open transaction
    ///
    /// Judge counts are an ordered sequence (one count per judgment tier)
    /// and round-trip exactly; they are always stored together with the
    /// score.
    pub fn record(
        tx: &mut dyn StoreTx,
        room_id: RoomId,
        user_id: UserId,
        judge_counts: &[i64],
        score: i64,
    ) -> Result<()> {
        if !tx.record_result(room_id, user_id, judge_counts, score)? {
            return Err(RoomServiceError::MemberNotFound { room_id, user_id }.into());
        }
        Ok(())
    }

    /// Results submitted so far for a dissolved room, ordered by user id
    pub fn results_for(&self, room_id: RoomId) -> Result<Vec<ResultUser>> {
        let mut tx = self.store.begin()?;

        let room = tx
            .room(room_id)?
            .ok_or(RoomServiceError::RoomNotFound { room_id })?;

        if room.status != RoomStatus::Dissolution {
            return Err(RoomServiceError::InvalidRoomStatus {
                room_id,
                actual: room.status,
                required: RoomStatus::Dissolution,
            }
            .into());
        }

        Ok(tx
            .members(room_id)?
            .into_iter()
            .filter_map(|member| {
                let judge_count_list = member.judge_count_list?;
                let score = member.score?;
                Some(ResultUser {
                    user_id: member.user_id,
                    judge_count_list,
                    score,
                })
            })
            .collect())
    }
}
