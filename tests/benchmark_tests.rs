//! Performance benchmarks for the tick path

use bincode::{deserialize, serialize};
use server::game::Game;
use server::lobby::{JoinRequest, Lobby, Outbox};
use shared::{Difficulty, Packet};
use std::time::{Duration, Instant};

/// Benchmarks raw physics stepping of a single match
#[test]
fn benchmark_game_step() {
    let mut game = Game::with_seed(u32::MAX, Difficulty::Medium, 42);
    let start_time = Instant::now();

    let iterations = 100_000u64;
    let start = Instant::now();

    for tick in 0..iterations {
        game.step(start_time + Duration::from_millis(tick * 16));
    }

    let duration = start.elapsed();
    println!(
        "Game step: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks a full lobby tick with many busy rooms
#[test]
fn benchmark_lobby_tick_many_rooms() {
    let mut lobby = Lobby::new();
    let mut outbox = Outbox::new();
    let now = Instant::now();

    let rooms = 200u32;
    for room in 0..rooms {
        for seat in 0..3 {
            lobby.join(
                room * 3 + seat,
                JoinRequest {
                    room: Some(format!("room-{}", room)),
                    win_score: Some(u32::MAX),
                    ..JoinRequest::default()
                },
                now,
                &mut outbox,
            );
        }
    }
    assert_eq!(lobby.room_count(), rooms as usize);

    let ticks = 600u64;
    let start = Instant::now();

    for tick in 0..ticks {
        let mut outbox = Outbox::new();
        lobby.tick(now + Duration::from_millis(tick * 16), &mut outbox);
        assert!(outbox.len() >= rooms as usize);
    }

    let duration = start.elapsed();
    println!(
        "Lobby tick: {} rooms x {} ticks in {:?} ({:.2} μs/tick)",
        rooms,
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64
    );

    // Ten seconds of game time for 200 rooms should take well under 5 seconds
    assert!(duration.as_secs() < 5);
}

/// Benchmarks encoding and decoding of the per-tick snapshot packet
#[test]
fn benchmark_snapshot_serialization() {
    let game = Game::with_seed(10, Difficulty::Hard, 7);
    let packet = Packet::GameState(game.snapshot());

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = serialize(&packet).unwrap();
        let _: Packet = deserialize(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot serialization: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    let size = serialize(&packet).unwrap().len();
    println!("Snapshot packet size: {} bytes", size);
    assert!(size < 128);

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
