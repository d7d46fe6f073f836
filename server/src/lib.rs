//! # Pong Match Server Library
//!
//! This library provides the authoritative server for a two-player Pong match
//! played over TCP. It owns the canonical match state, applies paddle commands
//! from both players, simulates the ball at a fixed tick rate and streams the
//! resulting state to both clients.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Ball movement, bounces, scoring and the win condition are decided here
//! only. Clients render whatever the server last sent them.
//!
//! ### Match Lifecycle
//! The server runs one match round at a time:
//! - Accept exactly two players and send each its id (`0` or `1`)
//! - Count down from 3, then play until a player reaches 10 points
//! - Treat a lost connection as a forfeit in favour of the other player
//! - Keep the result on screen for a grace period, close both connections
//!   and wait for the next two players
//!
//! ### State Broadcasting
//! Every countdown step and every simulation tick is sent to both players as
//! one newline-terminated JSON object. A failed write only affects the
//! recipient it was meant for.
//!
//! ## Architecture Design
//!
//! ### Shared Match State
//! A single `MatchState` behind one `tokio::sync::Mutex` holds paddles, ball,
//! scores, countdown and outcome. Every mutation, from input workers and
//! from the simulation loop, happens under that lock, and broadcasts are built
//! from snapshots taken under it.
//!
//! ### Tasks Per Round
//! Each round spawns one input worker per player plus the simulation loop on
//! the multi-threaded runtime:
//! - **Input Worker**: reads commands and moves that player's paddle
//! - **Simulation Loop**: countdown, physics ticks and broadcasts
//!
//! The orchestrator polls the shared state until the round has an outcome or a
//! player drops, then signals the tasks to stop through a watch channel. A
//! player whose reads or writes fail forfeits the match.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Player seats for one round: accepting, connected flags, broadcasting.
//!
//! ### Game Module (`game`)
//! Match state, paddle clamping and the per-tick physics step.
//!
//! ### Input Module (`input`)
//! The per-player command reader.
//!
//! ### Simulation Module (`simulation`)
//! The fixed-tick loop driving countdown and play.
//!
//! ### Network Module (`network`)
//! The `Server` that binds the listener and runs rounds forever.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pong_server::config::ServerConfig;
//! use pong_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("127.0.0.1", 8080);
//!     let server = Server::bind(&config).await?;
//!
//!     // Accepts two players, plays a round, and repeats forever
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod simulation;
