//! Room lifecycle integration tests against the engine

use crate::fixtures::TestSystem;
use green_room::types::{JoinRoomResult, LiveDifficulty, RoomStatus};

#[tokio::test]
async fn test_results_accumulate_as_members_finish() {
    let system = TestSystem::new();

    let (_, alice) = system.user("alice");
    let (_, bob) = system.user("bob");
    let (_, carol) = system.user("carol");

    let room_id = system
        .engine
        .create_room(alice, 9, LiveDifficulty::Hard)
        .unwrap();
    system
        .engine
        .join_room(room_id, bob, LiveDifficulty::Normal)
        .unwrap();
    system
        .engine
        .join_room(room_id, carol, LiveDifficulty::Hard)
        .unwrap();
    system.engine.start_room(alice, room_id).unwrap();

    // results are not readable while the game is live
    assert!(system.aggregator.results_for(room_id).is_err());

    // polling sees a growing list as members finish one by one
    system
        .engine
        .finish_room(carol, room_id, &[9, 1], 70000)
        .unwrap();
    assert_eq!(system.aggregator.results_for(room_id).unwrap().len(), 1);

    system
        .engine
        .finish_room(alice, room_id, &[10, 0], 90000)
        .unwrap();
    system
        .engine
        .finish_room(bob, room_id, &[8, 2], 60000)
        .unwrap();

    let results = system.aggregator.results_for(room_id).unwrap();
    assert_eq!(results.len(), 3);

    // ordered by user id
    assert_eq!(results[0].user_id, alice);
    assert_eq!(results[1].user_id, bob);
    assert_eq!(results[2].user_id, carol);
}

#[tokio::test]
async fn test_join_after_finish_reports_disbanded() {
    let system = TestSystem::new();

    let (_, alice) = system.user("alice");
    let (_, late) = system.user("late");

    let room_id = system
        .engine
        .create_room(alice, 2, LiveDifficulty::Normal)
        .unwrap();
    system.engine.start_room(alice, room_id).unwrap();
    system
        .engine
        .finish_room(alice, room_id, &[5], 1000)
        .unwrap();

    assert_eq!(
        system
            .engine
            .join_room(room_id, late, LiveDifficulty::Normal)
            .unwrap(),
        JoinRoomResult::Disbanded
    );
}

#[tokio::test]
async fn test_member_can_rejoin_after_leaving() {
    let system = TestSystem::new();

    let (_, alice) = system.user("alice");
    let (_, bob) = system.user("bob");

    let room_id = system
        .engine
        .create_room(alice, 2, LiveDifficulty::Normal)
        .unwrap();

    system
        .engine
        .join_room(room_id, bob, LiveDifficulty::Normal)
        .unwrap();
    system.engine.leave_room(room_id, bob).unwrap();

    assert_eq!(
        system
            .engine
            .join_room(room_id, bob, LiveDifficulty::Hard)
            .unwrap(),
        JoinRoomResult::Ok
    );

    let snapshot = system.engine.room_status(room_id, bob).unwrap();
    let me = snapshot
        .members
        .iter()
        .find(|member| member.user_id == bob)
        .unwrap();
    assert_eq!(me.select_difficulty, LiveDifficulty::Hard);
}

#[tokio::test]
async fn test_listing_follows_membership_changes() {
    let system = TestSystem::new();

    let (_, alice) = system.user("alice");
    let (_, bob) = system.user("bob");

    let room_id = system
        .engine
        .create_room(alice, 4, LiveDifficulty::Normal)
        .unwrap();

    assert_eq!(system.engine.list_rooms(4).unwrap()[0].joined_user_count, 1);

    system
        .engine
        .join_room(room_id, bob, LiveDifficulty::Normal)
        .unwrap();
    assert_eq!(system.engine.list_rooms(4).unwrap()[0].joined_user_count, 2);

    system.engine.leave_room(room_id, bob).unwrap();
    assert_eq!(system.engine.list_rooms(4).unwrap()[0].joined_user_count, 1);

    // dissolving the room removes it from the listing
    system.engine.leave_room(room_id, alice).unwrap();
    assert!(system.engine.list_rooms(4).unwrap().is_empty());
}

#[tokio::test]
async fn test_ownership_chain_across_successive_leaves() {
    let system = TestSystem::new();

    let (_, alice) = system.user("alice");
    let (_, bob) = system.user("bob");
    let (_, carol) = system.user("carol");

    let room_id = system
        .engine
        .create_room(alice, 1, LiveDifficulty::Normal)
        .unwrap();
    system
        .engine
        .join_room(room_id, bob, LiveDifficulty::Normal)
        .unwrap();
    system
        .engine
        .join_room(room_id, carol, LiveDifficulty::Normal)
        .unwrap();

    // owner leaves twice in a row; each time the lowest remaining id
    // inherits and can start the game
    system.engine.leave_room(room_id, alice).unwrap();
    system.engine.leave_room(room_id, bob).unwrap();

    let snapshot = system.engine.room_status(room_id, carol).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Waiting);
    assert!(snapshot.members[0].is_host);
    assert_eq!(snapshot.members[0].user_id, carol);

    system.engine.start_room(carol, room_id).unwrap();
}
