//! Authoritative match state and the per-tick ball physics
//!
//! One `MatchState` exists per match round. Input workers and the simulation
//! loop share it through a single mutex (`SharedMatch`); every read and write
//! happens with that lock held.

use crate::error::ServerError;
use log::{debug, info};
use pong_shared::{
    BallState, Command, PaddlePositions, PlayerId, SoundEvent, StateMessage, BALL_SPEED,
    COUNTDOWN_START, FIELD_HEIGHT, FIELD_TOP, FIELD_WIDTH, LEFT_PADDLE_PLANE, PADDLE_HEIGHT,
    PADDLE_MAX_Y, PADDLE_MIN_Y, PADDLE_START_Y, PADDLE_STEP, RIGHT_PADDLE_PLANE, WINNING_SCORE,
};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedMatch = Arc<Mutex<MatchState>>;

/// How a round ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    InProgress,
    Won(PlayerId),
    /// The other player's connection failed; `winner` is the one still connected.
    Forfeited { winner: PlayerId },
}

impl MatchOutcome {
    pub fn winner(self) -> Option<PlayerId> {
        match self {
            MatchOutcome::InProgress => None,
            MatchOutcome::Won(winner) | MatchOutcome::Forfeited { winner } => Some(winner),
        }
    }

    pub fn is_terminal(self) -> bool {
        self != MatchOutcome::InProgress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Countdown,
    Playing,
    Finished,
}

/// Places a ball at the center of the field moving diagonally in a random direction.
pub fn spawn_ball<R: Rng + ?Sized>(rng: &mut R) -> BallState {
    let mut direction = || if rng.gen_bool(0.5) { 1 } else { -1 };
    BallState {
        x: FIELD_WIDTH / 2,
        y: FIELD_HEIGHT / 2,
        vx: BALL_SPEED * direction(),
        vy: BALL_SPEED * direction(),
    }
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub(crate) paddles: [i32; 2],
    pub(crate) ball: BallState,
    pub(crate) scores: [u32; 2],
    pub(crate) countdown: u32,
    pub(crate) outcome: MatchOutcome,
    /// Set during a tick, cleared after that tick's broadcast.
    pub(crate) sound_event: Option<SoundEvent>,
    pub(crate) tick: u64,
}

impl MatchState {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            paddles: [PADDLE_START_Y; 2],
            ball: spawn_ball(rng),
            scores: [0, 0],
            countdown: COUNTDOWN_START,
            outcome: MatchOutcome::InProgress,
            sound_event: None,
            tick: 0,
        }
    }

    pub fn into_shared(self) -> SharedMatch {
        Arc::new(Mutex::new(self))
    }

    pub fn phase(&self) -> Phase {
        if self.outcome.is_terminal() {
            Phase::Finished
        } else if self.countdown > 0 {
            Phase::Countdown
        } else {
            Phase::Playing
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn paddle(&self, player: PlayerId) -> i32 {
        self.paddles[player.index()]
    }

    pub fn ball(&self) -> BallState {
        self.ball
    }

    pub fn sound_event(&self) -> Option<SoundEvent> {
        self.sound_event
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Moves a paddle one step and returns its new position.
    ///
    /// The position always stays within `[PADDLE_MIN_Y, PADDLE_MAX_Y]`.
    /// Commands arriving after the match has finished are ignored.
    pub fn move_paddle(&mut self, player: PlayerId, command: Command) -> i32 {
        let paddle = &mut self.paddles[player.index()];
        if self.outcome.is_terminal() {
            return *paddle;
        }

        let delta = match command {
            Command::Up => -PADDLE_STEP,
            Command::Down => PADDLE_STEP,
        };
        *paddle = (*paddle + delta).clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        *paddle
    }

    /// Advances the pre-match countdown by one step and returns the remaining value.
    pub fn tick_countdown(&mut self) -> u32 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    /// Records a lost connection: the other player wins unless the round already ended.
    ///
    /// Returns true if this call decided the outcome.
    pub fn forfeit(&mut self, loser: PlayerId) -> bool {
        if self.outcome.is_terminal() {
            return false;
        }
        let winner = loser.opponent();
        self.outcome = MatchOutcome::Forfeited { winner };
        info!("Player {} disconnected, player {} wins by forfeit", loser, winner);
        true
    }

    /// Runs one simulation tick: integration, wall and paddle bounces, scoring
    /// and the win check. Does nothing once the match is finished.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), ServerError> {
        if self.outcome.is_terminal() {
            return Ok(());
        }
        self.tick += 1;

        self.ball.x += self.ball.vx;
        self.ball.y += self.ball.vy;

        if self.ball.y <= FIELD_TOP || self.ball.y >= FIELD_HEIGHT {
            self.ball.vy = -self.ball.vy;
            self.sound_event = Some(SoundEvent::WallHit);
        }

        // A wall and a paddle can both be hit in the same tick; the paddle sound wins.
        let left_hit =
            self.ball.x <= LEFT_PADDLE_PLANE && self.paddle_spans(PlayerId::Left, self.ball.y);
        let right_hit =
            self.ball.x >= RIGHT_PADDLE_PLANE && self.paddle_spans(PlayerId::Right, self.ball.y);
        if left_hit || right_hit {
            self.ball.vx = -self.ball.vx;
            self.sound_event = Some(SoundEvent::PlatformHit);
        }

        if self.ball.x < 0 {
            self.award_point(PlayerId::Right, rng);
        } else if self.ball.x > FIELD_WIDTH {
            self.award_point(PlayerId::Left, rng);
        }

        if let Some(winner) = PlayerId::ALL
            .into_iter()
            .find(|player| self.scores[player.index()] >= WINNING_SCORE)
        {
            self.outcome = MatchOutcome::Won(winner);
            info!(
                "Player {} wins {}:{}",
                winner, self.scores[0], self.scores[1]
            );
        }

        self.check_invariants()
    }

    pub fn clear_sound_event(&mut self) {
        self.sound_event = None;
    }

    /// Captures the state in its wire form.
    pub fn snapshot(&self) -> StateMessage {
        StateMessage {
            paddles: PaddlePositions {
                left: self.paddles[0],
                right: self.paddles[1],
            },
            ball: self.ball,
            scores: self.scores,
            countdown: self.countdown,
            winner: self.outcome.winner().map(|winner| winner.index() as u8),
            sound_event: self.sound_event,
        }
    }

    fn paddle_spans(&self, player: PlayerId, y: i32) -> bool {
        let top = self.paddles[player.index()];
        (top..=top + PADDLE_HEIGHT).contains(&y)
    }

    fn award_point<R: Rng + ?Sized>(&mut self, scorer: PlayerId, rng: &mut R) {
        self.scores[scorer.index()] += 1;
        self.ball = spawn_ball(rng);
        debug!(
            "Player {} scores, now {}:{}",
            scorer, self.scores[0], self.scores[1]
        );
    }

    fn check_invariants(&self) -> Result<(), ServerError> {
        let x_ok = (0..=FIELD_WIDTH).contains(&self.ball.x);
        let y_ok = (FIELD_TOP - BALL_SPEED..=FIELD_HEIGHT + BALL_SPEED).contains(&self.ball.y);
        let paddles_ok = self
            .paddles
            .iter()
            .all(|paddle| (PADDLE_MIN_Y..=PADDLE_MAX_Y).contains(paddle));

        if x_ok && y_ok && paddles_ok {
            Ok(())
        } else {
            Err(ServerError::InvariantViolation(format!(
                "tick {}: ball at ({}, {}), paddles {:?}",
                self.tick, self.ball.x, self.ball.y, self.paddles
            )))
        }
    }
}
