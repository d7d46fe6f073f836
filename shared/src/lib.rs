use serde::{Deserialize, Serialize};
use std::fmt;

pub const FIELD_WIDTH: i32 = 800;
pub const FIELD_HEIGHT: i32 = 600;
/// Top wall of the play area; the strip above it holds the score line.
pub const FIELD_TOP: i32 = 60;
pub const PADDLE_HEIGHT: i32 = 100;
pub const PADDLE_STEP: i32 = 10;
pub const PADDLE_MIN_Y: i32 = FIELD_TOP;
pub const PADDLE_MAX_Y: i32 = FIELD_HEIGHT - PADDLE_HEIGHT;
pub const PADDLE_START_Y: i32 = 250;
/// Ball x at or left of this value is in the left paddle's plane.
pub const LEFT_PADDLE_PLANE: i32 = 40;
/// Ball x at or right of this value is in the right paddle's plane.
pub const RIGHT_PADDLE_PLANE: i32 = FIELD_WIDTH - 40;
pub const BALL_RADIUS: i32 = 10;
pub const BALL_SPEED: i32 = 5;
pub const COUNTDOWN_START: u32 = 3;
pub const WINNING_SCORE: u32 = 10;

/// One of the two seats in a match. The first accepted connection is `Left` (id 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    Left,
    Right,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::Left, PlayerId::Right];

    pub fn index(self) -> usize {
        match self {
            PlayerId::Left => 0,
            PlayerId::Right => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerId::Left),
            1 => Some(PlayerId::Right),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            PlayerId::Left => PlayerId::Right,
            PlayerId::Right => PlayerId::Left,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Builds the first line a client receives: its id followed by a newline.
pub fn encode_handshake(player: PlayerId) -> String {
    format!("{}\n", player.index())
}

pub fn parse_handshake(line: &str) -> Option<PlayerId> {
    line.trim()
        .parse::<usize>()
        .ok()
        .and_then(PlayerId::from_index)
}

/// Paddle commands sent by clients as raw ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
}

impl Command {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Command::Up => b"UP",
            Command::Down => b"DOWN",
        }
    }
}

/// Turns the raw command byte stream into commands.
///
/// Clients write commands without a delimiter, so one read may carry several
/// commands or only part of one. Whitespace between commands is skipped and
/// any other unrecognised byte is dropped.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    buffer: Vec<u8>,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn next_command(&mut self) -> Option<Command> {
        loop {
            let skip = self
                .buffer
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            self.buffer.drain(..skip);

            if self.buffer.is_empty() {
                return None;
            }

            for command in [Command::Up, Command::Down] {
                let token = command.as_bytes();
                if self.buffer.starts_with(token) {
                    self.buffer.drain(..token.len());
                    return Some(command);
                }
            }

            // Wait for the rest of a split token
            if Command::Up.as_bytes().starts_with(&self.buffer)
                || Command::Down.as_bytes().starts_with(&self.buffer)
            {
                return None;
            }

            self.buffer.remove(0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEvent {
    WallHit,
    PlatformHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddlePositions {
    #[serde(rename = "0")]
    pub left: i32,
    #[serde(rename = "1")]
    pub right: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallState {
    pub x: i32,
    pub y: i32,
    pub vx: i32,
    pub vy: i32,
}

/// One frame of the server -> client state stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub paddles: PaddlePositions,
    pub ball: BallState,
    pub scores: [u32; 2],
    pub countdown: u32,
    pub winner: Option<u8>,
    pub sound_event: Option<SoundEvent>,
}

impl StateMessage {
    /// Serializes the message as one newline-terminated JSON line.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn winner_id(&self) -> Option<PlayerId> {
        self.winner
            .and_then(|winner| PlayerId::from_index(winner as usize))
    }
}

/// Client-side framing for the newline-delimited stream.
///
/// Reads may end mid-line or carry several lines; `push` whatever arrives and
/// drain complete lines until `None`.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns the next complete non-blank line without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    pub fn next_state(&mut self) -> Option<Result<StateMessage, serde_json::Error>> {
        self.next_line()
            .map(|line| serde_json::from_str::<StateMessage>(&line))
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StateMessage {
        StateMessage {
            paddles: PaddlePositions {
                left: 250,
                right: 60,
            },
            ball: BallState {
                x: 400,
                y: 300,
                vx: -5,
                vy: 5,
            },
            scores: [3, 7],
            countdown: 0,
            winner: None,
            sound_event: Some(SoundEvent::WallHit),
        }
    }

    #[test]
    fn test_player_ids() {
        assert_eq!(PlayerId::Left.index(), 0);
        assert_eq!(PlayerId::Right.index(), 1);
        assert_eq!(PlayerId::Left.opponent(), PlayerId::Right);
        assert_eq!(PlayerId::Right.opponent(), PlayerId::Left);
        assert_eq!(PlayerId::from_index(2), None);
        assert_eq!(PlayerId::Right.to_string(), "1");
    }

    #[test]
    fn test_handshake_line() {
        assert_eq!(encode_handshake(PlayerId::Left), "0\n");
        assert_eq!(encode_handshake(PlayerId::Right), "1\n");
        assert_eq!(parse_handshake("1\n"), Some(PlayerId::Right));
        assert_eq!(parse_handshake(" 0 "), Some(PlayerId::Left));
        assert_eq!(parse_handshake("7"), None);
        assert_eq!(parse_handshake("zero"), None);
    }

    #[test]
    fn test_decoder_single_commands() {
        let mut decoder = CommandDecoder::new();
        decoder.push(b"UP");
        assert_eq!(decoder.next_command(), Some(Command::Up));
        assert_eq!(decoder.next_command(), None);

        decoder.push(b"DOWN");
        assert_eq!(decoder.next_command(), Some(Command::Down));
        assert_eq!(decoder.next_command(), None);
    }

    #[test]
    fn test_decoder_coalesced_commands() {
        let mut decoder = CommandDecoder::new();
        decoder.push(b"UPUPDOWN\nUP");

        let commands: Vec<Command> = std::iter::from_fn(|| decoder.next_command()).collect();
        assert_eq!(
            commands,
            vec![Command::Up, Command::Up, Command::Down, Command::Up]
        );
    }

    #[test]
    fn test_decoder_split_command() {
        let mut decoder = CommandDecoder::new();
        decoder.push(b"DO");
        assert_eq!(decoder.next_command(), None);
        decoder.push(b"W");
        assert_eq!(decoder.next_command(), None);
        decoder.push(b"N");
        assert_eq!(decoder.next_command(), Some(Command::Down));
    }

    #[test]
    fn test_decoder_ignores_garbage() {
        let mut decoder = CommandDecoder::new();
        decoder.push(b"LEFT");
        assert_eq!(decoder.next_command(), None);

        decoder.push(b"xxUPjump");
        assert_eq!(decoder.next_command(), Some(Command::Up));
        assert_eq!(decoder.next_command(), None);

        // "DX" can never become a command, so it must not stall the decoder
        decoder.push(b"DXUP");
        assert_eq!(decoder.next_command(), Some(Command::Up));
    }

    #[test]
    fn test_state_message_schema() {
        let json = serde_json::to_value(sample_state()).unwrap();

        assert_eq!(json["paddles"]["0"], 250);
        assert_eq!(json["paddles"]["1"], 60);
        assert_eq!(json["ball"]["vx"], -5);
        assert_eq!(json["scores"], serde_json::json!([3, 7]));
        assert_eq!(json["countdown"], 0);
        assert!(json["winner"].is_null());
        assert_eq!(json["sound_event"], "wall_hit");

        let mut finished = sample_state();
        finished.winner = Some(1);
        finished.sound_event = Some(SoundEvent::PlatformHit);
        let json = serde_json::to_value(finished).unwrap();
        assert_eq!(json["winner"], 1);
        assert_eq!(json["sound_event"], "platform_hit");
    }

    #[test]
    fn test_encode_line_is_single_line() {
        let line = sample_state().encode_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_state_parse_tolerates_order_and_unknown_fields() {
        let line = r#"{"sound_event":null,"winner":0,"countdown":2,"scores":[1,0],
            "ball":{"vy":5,"vx":5,"y":300,"x":400},"paddles":{"1":250,"0":70},"extra":true}"#;
        let state: StateMessage = serde_json::from_str(line).unwrap();

        assert_eq!(state.paddles.left, 70);
        assert_eq!(state.countdown, 2);
        assert_eq!(state.winner_id(), Some(PlayerId::Left));
        assert_eq!(state.sound_event, None);
    }

    #[test]
    fn test_line_buffer_partial_and_batched_reads() {
        let first = sample_state().encode_line().unwrap();
        let mut second_state = sample_state();
        second_state.scores = [4, 7];
        let second = second_state.encode_line().unwrap();

        let mut stream = Vec::new();
        stream.extend_from_slice(b"0\n");
        stream.extend_from_slice(first.as_bytes());
        stream.extend_from_slice(second.as_bytes());

        let (head, tail) = stream.split_at(10);
        let mut buffer = LineBuffer::new();

        buffer.push(head);
        assert_eq!(buffer.next_line().as_deref(), Some("0"));
        assert!(buffer.next_state().is_none());
        assert!(buffer.pending_bytes() > 0);

        buffer.push(tail);
        assert_eq!(buffer.next_state().unwrap().unwrap(), sample_state());
        assert_eq!(buffer.next_state().unwrap().unwrap(), second_state);
        assert!(buffer.next_state().is_none());
        assert_eq!(buffer.pending_bytes(), 0);
    }

    #[test]
    fn test_line_buffer_skips_blank_lines() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"\n\n1\n");
        assert_eq!(buffer.next_line().as_deref(), Some("1"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_line_buffer_reports_bad_json() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"{not json}\n");
        assert!(buffer.next_state().unwrap().is_err());
    }
}
