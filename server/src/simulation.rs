//! Fixed-tick simulation loop
//!
//! Runs the `Countdown -> Playing -> Finished` state machine for one round.
//! The countdown steps once per `countdown_interval`; play advances one tick
//! per `tick_period` and broadcasts the state after every tick.

use crate::client_manager::ClientManager;
use crate::config::MatchConfig;
use crate::error::ServerError;
use crate::game::{Phase, SharedMatch};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Drives one round until it finishes, the round is shut down, or the
/// simulation detects an invariant violation.
pub async fn run_simulation(
    state: SharedMatch,
    clients: Arc<ClientManager>,
    config: MatchConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let mut rng = StdRng::from_entropy();

    while state.lock().await.phase() == Phase::Countdown {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            _ = sleep(config.countdown_interval) => {}
        }

        let snapshot = {
            let mut state = state.lock().await;
            if state.is_finished() {
                return Ok(());
            }
            let remaining = state.tick_countdown();
            debug!("Countdown: {}", remaining);
            state.snapshot()
        };
        clients.broadcast(&snapshot).await;
    }

    info!("Countdown over, ball in play");

    // A late tick runs as soon as possible; ticks are never skipped or merged.
    let mut ticker = interval(config.tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let (snapshot, finished) = {
            let mut state = state.lock().await;
            if state.is_finished() {
                return Ok(());
            }
            state.step(&mut rng)?;
            let snapshot = state.snapshot();
            state.clear_sound_event();
            (snapshot, state.is_finished())
        };

        clients.broadcast(&snapshot).await;

        if finished {
            debug!("Simulation finished after the winning point");
            return Ok(());
        }
    }
}
