//! Match orchestration: accept two players, play a round, tear it down, repeat

use crate::client_manager::ClientManager;
use crate::config::{MatchConfig, ServerConfig};
use crate::error::ServerError;
use crate::game::{MatchOutcome, MatchState, SharedMatch};
use crate::input::run_input_worker;
use crate::simulation::run_simulation;
use log::{debug, error, info, warn};
use pong_shared::PlayerId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

/// Authoritative match server. Owns the listening socket for its whole life
/// and runs one match round at a time on it.
pub struct Server {
    listener: TcpListener,
    config: MatchConfig,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.socket_addr_string();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", addr);

        Ok(Server {
            listener,
            config: config.match_config.clone(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Plays match rounds forever. A failing round never stops the server.
    pub async fn run(&self) {
        let mut round: u64 = 0;
        loop {
            round += 1;
            info!("Starting round {}", round);
            match self.run_round().await {
                Ok(outcome) => debug!("Round {} finished with {:?}", round, outcome),
                Err(e) => error!("Round {} could not start: {}", round, e),
            }
        }
    }

    /// Runs a single round from accepting players to closing their connections.
    pub async fn run_round(&self) -> Result<MatchOutcome, ServerError> {
        let (clients, readers) =
            ClientManager::accept_players(&self.listener, self.config.write_timeout).await?;
        Ok(self.play_round(clients, readers).await)
    }

    /// Plays one round between two seated players and tears it down.
    ///
    /// A player whose connection is found broken, on either the read or the
    /// write side, forfeits the match to the other one.
    pub async fn play_round<R>(&self, clients: ClientManager, readers: [R; 2]) -> MatchOutcome
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let [left_reader, right_reader] = readers;
        let clients = Arc::new(clients);
        let state = MatchState::new(&mut StdRng::from_entropy()).into_shared();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = vec![
            tokio::spawn(run_input_worker(
                PlayerId::Left,
                left_reader,
                Arc::clone(&state),
                Arc::clone(&clients),
                shutdown_rx.clone(),
            )),
            tokio::spawn(run_input_worker(
                PlayerId::Right,
                right_reader,
                Arc::clone(&state),
                Arc::clone(&clients),
                shutdown_rx.clone(),
            )),
        ];
        let simulation = tokio::spawn(run_simulation(
            Arc::clone(&state),
            Arc::clone(&clients),
            self.config.clone(),
            shutdown_rx,
        ));

        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            poll.tick().await;
            let finished = state.lock().await.is_finished();
            if finished || !clients.all_connected() || simulation.is_finished() {
                break;
            }
        }

        let outcome = {
            let mut state = state.lock().await;
            // A failed broadcast clears the flag without forfeiting
            for player in PlayerId::ALL {
                if !clients.is_connected(player) {
                    state.forfeit(player);
                }
            }
            state.outcome()
        };
        match outcome {
            MatchOutcome::Won(winner) => info!("Player {} won the match", winner),
            MatchOutcome::Forfeited { winner } => {
                info!("Player {} won by forfeit", winner)
            }
            MatchOutcome::InProgress => warn!("Round ended without a winner"),
        }

        if outcome.is_terminal() {
            self.hold_result(&state, &clients).await;
        }

        if shutdown_tx.send(true).is_err() {
            debug!("All round tasks already stopped");
        }
        clients.close().await;

        for worker in workers {
            if let Err(e) = worker.await {
                error!("Input worker panicked: {}", e);
            }
        }
        match simulation.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Round abandoned: {}", e),
            Err(e) => error!("Simulation task panicked: {}", e),
        }

        info!("Round over, connections closed");
        outcome
    }

    /// Keeps re-sending the final state for the grace period so clients can
    /// show the result screen.
    async fn hold_result(&self, state: &SharedMatch, clients: &ClientManager) {
        let deadline = Instant::now() + self.config.grace_period;
        while Instant::now() < deadline {
            let snapshot = state.lock().await.snapshot();
            clients.broadcast(&snapshot).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(self.config.poll_interval.min(remaining)).await;
        }
    }
}
