//! Concurrent join stress tests
//!
//! These tests validate the engine's core concurrency property: the
//! capacity check and the membership insert are atomic against concurrent
//! joiners, so a room never exceeds its fixed capacity no matter how many
//! joins race.

use crate::fixtures::TestSystem;
use axum::http::StatusCode;
use green_room::types::{JoinRoomResult, LiveDifficulty, UserId, MAX_ROOM_MEMBERS};
use serde_json::json;
use std::thread;

#[test]
fn test_concurrent_joins_respect_capacity() {
    let system = TestSystem::new();
    let (_, owner) = system.user("owner");
    let room_id = system
        .engine
        .create_room(owner, 1, LiveDifficulty::Normal)
        .unwrap();

    // 12 joiners race for the 3 remaining seats
    let joiners: Vec<UserId> = (0..12)
        .map(|i| system.user(&format!("joiner{}", i)).1)
        .collect();

    let handles: Vec<_> = joiners
        .into_iter()
        .map(|user_id| {
            let engine = system.engine.clone();
            thread::spawn(move || {
                engine
                    .join_room(room_id, user_id, LiveDifficulty::Normal)
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<JoinRoomResult> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let accepted = outcomes
        .iter()
        .filter(|&&outcome| outcome == JoinRoomResult::Ok)
        .count();
    let bounced = outcomes
        .iter()
        .filter(|&&outcome| outcome == JoinRoomResult::RoomFull)
        .count();

    assert_eq!(accepted, MAX_ROOM_MEMBERS - 1);
    assert_eq!(bounced, outcomes.len() - accepted);

    let snapshot = system.engine.room_status(room_id, owner).unwrap();
    assert_eq!(snapshot.members.len(), MAX_ROOM_MEMBERS);
}

#[test]
fn test_concurrent_joins_across_rooms_stay_isolated() {
    let system = TestSystem::new();
    let (_, owner_a) = system.user("owner-a");
    let (_, owner_b) = system.user("owner-b");

    let room_a = system
        .engine
        .create_room(owner_a, 1, LiveDifficulty::Normal)
        .unwrap();
    let room_b = system
        .engine
        .create_room(owner_b, 2, LiveDifficulty::Normal)
        .unwrap();

    let joiners: Vec<UserId> = (0..10)
        .map(|i| system.user(&format!("joiner{}", i)).1)
        .collect();

    let handles: Vec<_> = joiners
        .into_iter()
        .enumerate()
        .map(|(i, user_id)| {
            let engine = system.engine.clone();
            let room_id = if i % 2 == 0 { room_a } else { room_b };
            thread::spawn(move || {
                (
                    room_id,
                    engine
                        .join_room(room_id, user_id, LiveDifficulty::Normal)
                        .unwrap(),
                )
            })
        })
        .collect();

    let outcomes: Vec<(i64, JoinRoomResult)> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    for room_id in [room_a, room_b] {
        let accepted = outcomes
            .iter()
            .filter(|(id, outcome)| *id == room_id && *outcome == JoinRoomResult::Ok)
            .count();
        assert_eq!(accepted, MAX_ROOM_MEMBERS - 1);

        let snapshot = system.engine.room_status(room_id, 1).unwrap();
        assert_eq!(snapshot.members.len(), MAX_ROOM_MEMBERS);
    }
}

#[tokio::test]
async fn test_concurrent_joins_over_http() {
    let system = TestSystem::new();
    let (owner_token, _) = system.user("owner");

    let (_, body) = system
        .post(
            "/room/create",
            Some(&owner_token),
            json!({ "live_id": 3, "select_difficulty": 1 }),
        )
        .await;
    let room_id = body["room_id"].as_i64().unwrap();

    let tokens: Vec<String> = (0..8)
        .map(|i| system.user(&format!("racer{}", i)).0)
        .collect();

    let requests = tokens.iter().map(|token| {
        system.post(
            "/room/join",
            Some(token),
            json!({ "room_id": room_id, "select_difficulty": 1 }),
        )
    });

    let responses = futures::future::join_all(requests).await;

    let mut accepted = 0;
    let mut bounced = 0;
    for (status, body) in responses {
        assert_eq!(status, StatusCode::OK);
        match body["join_room_result"].as_i64().unwrap() {
            1 => accepted += 1,
            2 => bounced += 1,
            other => panic!("unexpected join outcome: {}", other),
        }
    }

    assert_eq!(accepted, MAX_ROOM_MEMBERS - 1);
    assert_eq!(bounced, 8 - accepted);
}
