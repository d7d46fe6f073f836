//! Headless client for poking at a running server from a terminal.
//!
//! Connects, prints the assigned id, follows the state stream and steers its
//! paddle with a simple strategy until the match ends.

use clap::{Parser, ValueEnum};
use log::{info, warn};
use pong_shared::{
    parse_handshake, Command, LineBuffer, PlayerId, StateMessage, PADDLE_HEIGHT,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::interval;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Keep the paddle centered on the ball
    Follow,
    /// Hold "up" forever
    Up,
    /// Hold "down" forever
    Down,
    /// Never send anything
    Idle,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// How the paddle is steered
    #[arg(long, value_enum, default_value = "follow")]
    strategy: Strategy,

    /// Milliseconds between commands
    #[arg(short = 'i', long, default_value = "16")]
    command_interval: u64,

    /// Log every N-th state update
    #[arg(long, default_value = "60")]
    log_every: u64,
}

fn choose_command(strategy: Strategy, me: PlayerId, state: &StateMessage) -> Option<Command> {
    match strategy {
        Strategy::Up => Some(Command::Up),
        Strategy::Down => Some(Command::Down),
        Strategy::Idle => None,
        Strategy::Follow => {
            let paddle = match me {
                PlayerId::Left => state.paddles.left,
                PlayerId::Right => state.paddles.right,
            };
            let center = paddle + PADDLE_HEIGHT / 2;
            if state.ball.y < center - 10 {
                Some(Command::Up)
            } else if state.ball.y > center + 10 {
                Some(Command::Down)
            } else {
                None
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", args.server);

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; 4096];

    let me = loop {
        if let Some(line) = lines.next_line() {
            match parse_handshake(&line) {
                Some(id) => break id,
                None => return Err(format!("unexpected handshake: {:?}", line).into()),
            }
        }
        let len = stream.read(&mut buf).await?;
        if len == 0 {
            return Err("server closed the connection before sending an id".into());
        }
        lines.push(&buf[..len]);
    };
    println!("Playing as player {}", me);

    let mut latest: Option<StateMessage> = None;
    let mut received: u64 = 0;
    let mut ticker = interval(Duration::from_millis(args.command_interval.max(1)));

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => {
                let len = match read {
                    Ok(0) => {
                        info!("Server closed the connection");
                        break;
                    }
                    Ok(len) => len,
                    Err(e) => {
                        warn!("Read failed: {}", e);
                        break;
                    }
                };
                lines.push(&buf[..len]);

                while let Some(parsed) = lines.next_state() {
                    let state = match parsed {
                        Ok(state) => state,
                        Err(e) => {
                            warn!("Skipping malformed state: {}", e);
                            continue;
                        }
                    };
                    received += 1;

                    if state.countdown > 0 {
                        println!("Starting in {}...", state.countdown);
                    } else if received % args.log_every.max(1) == 0 {
                        info!(
                            "Score {}:{}, ball ({}, {}), paddles {} / {}",
                            state.scores[0], state.scores[1],
                            state.ball.x, state.ball.y,
                            state.paddles.left, state.paddles.right
                        );
                    }

                    let finished = latest.as_ref().and_then(StateMessage::winner_id).is_some();
                    if let (Some(winner), false) = (state.winner_id(), finished) {
                        if winner == me {
                            println!("You won {}:{}", state.scores[0], state.scores[1]);
                        } else {
                            println!("You lost {}:{}", state.scores[0], state.scores[1]);
                        }
                    }
                    latest = Some(state);
                }
            }
            _ = ticker.tick() => {
                let command = latest
                    .as_ref()
                    .filter(|state| state.winner.is_none())
                    .and_then(|state| choose_command(args.strategy, me, state));
                if let Some(command) = command {
                    if let Err(e) = stream.write_all(command.as_bytes()).await {
                        warn!("Send failed: {}", e);
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
