//! Performance benchmarks for the hot paths of a match

use pong_server::game::MatchState;
use pong_shared::{Command, CommandDecoder, LineBuffer, PlayerId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// Benchmarks the per-tick physics step, restarting the match whenever it ends
#[test]
fn benchmark_simulation_step() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut state = MatchState::new(&mut rng);
    let mut matches = 1;

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        // Keep the right paddle moving so both kinds of bounce happen
        let command = if (i / 40) % 2 == 0 { Command::Up } else { Command::Down };
        state.move_paddle(PlayerId::Right, command);

        state.step(&mut rng).unwrap();
        state.clear_sound_event();

        if state.is_finished() {
            state = MatchState::new(&mut rng);
            matches += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Simulation step: {} ticks over {} matches in {:?} ({:.2} ns/tick)",
        iterations,
        matches,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // A 60 Hz server needs one tick per 16ms; this is 100k ticks
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks encoding a state snapshot into its JSON line
#[test]
fn benchmark_state_encoding() {
    let mut rng = StdRng::seed_from_u64(42);
    let state = MatchState::new(&mut rng);

    let iterations = 50_000;
    let start = Instant::now();
    let mut total_bytes = 0;

    for _ in 0..iterations {
        let line = state.snapshot().encode_line().unwrap();
        total_bytes += line.len();
    }

    let duration = start.elapsed();
    println!(
        "State encoding: {} snapshots ({} bytes) in {:?} ({:.2} μs/snapshot)",
        iterations,
        total_bytes,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks parsing a stream of state lines arriving in uneven chunks
#[test]
fn benchmark_state_parsing() {
    let mut rng = StdRng::seed_from_u64(42);
    let line = MatchState::new(&mut rng).snapshot().encode_line().unwrap();
    let stream = line.repeat(10_000);

    let start = Instant::now();
    let mut buffer = LineBuffer::new();
    let mut parsed = 0;

    for chunk in stream.as_bytes().chunks(100) {
        buffer.push(chunk);
        while let Some(state) = buffer.next_state() {
            state.unwrap();
            parsed += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "State parsing: {} lines in {:?} ({:.2} μs/line)",
        parsed,
        duration,
        duration.as_micros() as f64 / parsed as f64
    );

    assert_eq!(parsed, 10_000);
    assert_eq!(buffer.pending_bytes(), 0);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks decoding a noisy command stream
#[test]
fn benchmark_command_decoding() {
    let stream = "UPDOWN?UP  DOWNxx".repeat(20_000);

    let start = Instant::now();
    let mut decoder = CommandDecoder::new();
    let mut ups = 0;
    let mut downs = 0;

    for chunk in stream.as_bytes().chunks(64) {
        decoder.push(chunk);
        while let Some(command) = decoder.next_command() {
            match command {
                Command::Up => ups += 1,
                Command::Down => downs += 1,
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Command decoding: {} bytes in {:?}",
        stream.len(),
        duration
    );

    assert_eq!(ups, 40_000);
    assert_eq!(downs, 40_000);
    assert!(duration.as_millis() < 1000);
}
