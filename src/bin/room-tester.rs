//! Room tester - scripted lifecycle scenario against an in-process engine
//!
//! Drives the full room lifecycle (create, join to capacity, start, finish,
//! results) and prints every outcome, for smoke-testing the engine without
//! a running server.

use anyhow::Result;
use clap::Parser;
use green_room::results::ResultAggregator;
use green_room::room::RoomEngine;
use green_room::store::InMemoryRoomStore;
use green_room::types::{JoinRoomResult, LiveDifficulty, UserId};
use green_room::user::UserDirectory;
use std::sync::Arc;

/// Green Room scenario tester
#[derive(Parser)]
#[command(
    name = "room-tester",
    version,
    about = "Drives a scripted room lifecycle against an in-process engine"
)]
struct Args {
    /// Song id for the test room
    #[arg(long, default_value_t = 5)]
    live_id: i64,

    /// Number of players attempting to participate (first one creates)
    #[arg(long, default_value_t = 6)]
    players: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let store = Arc::new(InMemoryRoomStore::new());
    let directory = UserDirectory::new(store.clone());
    let engine = RoomEngine::new(store.clone());
    let aggregator = ResultAggregator::new(store);

    println!("Setting up {} players...", args.players);
    let mut players: Vec<(String, UserId)> = Vec::new();
    for i in 1..=args.players {
        let name = format!("player-{}", i);
        let token = directory.create(&name, 1000 + i as i64)?;
        let profile = directory
            .resolve(&token)
            .ok()
            .flatten()
            .expect("created user must resolve");
        players.push((name, profile.id));
    }

    let (owner_name, owner_id) = players[0].clone();
    let room_id = engine.create_room(owner_id, args.live_id, LiveDifficulty::Hard)?;
    println!(
        "{} created room {} for live {}",
        owner_name, room_id, args.live_id
    );

    let mut members = vec![owner_id];
    for (name, user_id) in players.iter().skip(1) {
        let outcome = engine.join_room(room_id, *user_id, LiveDifficulty::Normal)?;
        println!("{} join -> {:?}", name, outcome);
        if outcome == JoinRoomResult::Ok {
            members.push(*user_id);
        }
    }

    let listing = engine.list_rooms(args.live_id)?;
    println!(
        "Listing for live {}: {} room(s), occupancy {}/{}",
        args.live_id, listing.len(), listing[0].joined_user_count, listing[0].max_user_count
    );

    // A non-owner must not be able to start the game
    if members.len() > 1 {
        match engine.start_room(members[1], room_id) {
            Err(e) => println!("non-owner start rejected: {}", e),
            Ok(()) => println!("non-owner start unexpectedly succeeded!"),
        }
    }

    engine.start_room(owner_id, room_id)?;
    println!("{} started room {}", owner_name, room_id);

    for (i, member) in members.iter().enumerate() {
        let judge_counts = vec![40 - i as i64, 5 + i as i64, i as i64];
        let score = 100_000 - (i as i64) * 1_500;
        engine.finish_room(*member, room_id, &judge_counts, score)?;
        println!(
            "member {} finished (judges {:?}, score {})",
            member, judge_counts, score
        );
    }

    println!("Results for room {}:", room_id);
    for result in aggregator.results_for(room_id)? {
        println!(
            "  user {}: judges {:?}, score {}",
            result.user_id, result.judge_count_list, result.score
        );
    }

    let stats = engine.get_stats()?;
    println!(
        "Engine stats: {} room(s) created, {} join(s), {} game(s) started, {} result(s)",
        stats.rooms_created, stats.players_joined, stats.games_started, stats.results_recorded
    );

    Ok(())
}
