//! Player connections for a single match round
//!
//! This module handles the server-side half of every player connection:
//! - Accepting exactly two players in arrival order and sending each its id
//! - Tracking whether each player is still connected
//! - Broadcasting serialized match state to both players
//!
//! Reading from a connection is not done here. The read half of every socket
//! goes to that player's input worker, the write half stays in the manager.

use crate::error::ServerError;
use log::{debug, error, info, warn};
use pong_shared::{encode_handshake, PlayerId, StateMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

/// Write side of a player connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Delay before retrying after a failed accept.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// One seated player.
///
/// Writes are serialized by the writer mutex so a broadcast and the final
/// shutdown never interleave on the same socket.
pub struct PlayerConnection {
    pub id: PlayerId,
    pub addr: Option<SocketAddr>,
    writer: Mutex<BoxedWriter>,
    connected: AtomicBool,
}

impl PlayerConnection {
    pub fn new(id: PlayerId, addr: Option<SocketAddr>, writer: BoxedWriter) -> Self {
        Self {
            id,
            addr,
            writer: Mutex::new(writer),
            connected: AtomicBool::new(true),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Clears the connected flag. Returns true if the player was connected before.
    pub fn mark_disconnected(&self) -> bool {
        self.connected.swap(false, Ordering::SeqCst)
    }

    async fn send(&self, data: &[u8], write_timeout: Duration) -> Result<(), ServerError> {
        let mut writer = self.writer.lock().await;
        match timeout(write_timeout, writer.write_all(data)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ServerError::ConnectionLost {
                player: self.id,
                source,
            }),
            Err(_) => Err(ServerError::WriteTimeout {
                player: self.id,
                timeout: write_timeout,
            }),
        }
    }

    /// Delivers one state line, clearing the connected flag on failure.
    async fn deliver(&self, data: &[u8], write_timeout: Duration) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.send(data, write_timeout).await {
            Ok(()) => true,
            Err(e) => {
                if self.mark_disconnected() {
                    warn!("Dropping player {} from broadcasts: {}", self.id, e);
                }
                false
            }
        }
    }
}

/// The two connections of a match round.
pub struct ClientManager {
    players: [PlayerConnection; 2],
    write_timeout: Duration,
}

impl ClientManager {
    pub fn new(players: [PlayerConnection; 2], write_timeout: Duration) -> Self {
        Self {
            players,
            write_timeout,
        }
    }

    /// Waits for two players and sends each its id.
    ///
    /// The first connection becomes player 0, the second player 1. Transient
    /// failures (a failed accept, or a connection that cannot receive its id)
    /// are retried so the same seat can be filled again. Returns the manager
    /// and the read halves, indexed by player id.
    pub async fn accept_players(
        listener: &TcpListener,
        write_timeout: Duration,
    ) -> Result<(Self, [OwnedReadHalf; 2]), ServerError> {
        let (left, left_reader) = Self::accept_player(listener, PlayerId::Left).await?;
        let (right, right_reader) = Self::accept_player(listener, PlayerId::Right).await?;

        Ok((
            Self::new([left, right], write_timeout),
            [left_reader, right_reader],
        ))
    }

    async fn accept_player(
        listener: &TcpListener,
        player: PlayerId,
    ) -> Result<(PlayerConnection, OwnedReadHalf), ServerError> {
        info!("Waiting for player {}...", player);

        loop {
            match Self::seat_player(listener, player).await {
                Ok(seated) => return Ok(seated),
                Err(e) if e.is_transient() => {
                    warn!("{}; waiting for another connection", e);
                    // Back off after a failed accept; a failed handshake retries at once
                    if e.player().is_none() {
                        sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Accepts one connection and sends it the id of `player`.
    async fn seat_player(
        listener: &TcpListener,
        player: PlayerId,
    ) -> Result<(PlayerConnection, OwnedReadHalf), ServerError> {
        let (stream, addr) = listener.accept().await.map_err(ServerError::Accept)?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(encode_handshake(player).as_bytes())
            .await
            .map_err(|source| ServerError::Handshake { player, source })?;

        info!("Player {} joined from {}", player, addr);
        let connection = PlayerConnection::new(player, Some(addr), Box::new(writer));
        Ok((connection, reader))
    }

    pub fn player(&self, player: PlayerId) -> &PlayerConnection {
        &self.players[player.index()]
    }

    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.player(player).is_connected()
    }

    pub fn all_connected(&self) -> bool {
        self.players.iter().all(PlayerConnection::is_connected)
    }

    pub fn mark_disconnected(&self, player: PlayerId) -> bool {
        self.player(player).mark_disconnected()
    }

    /// Sends one state line to every connected player.
    ///
    /// Best effort per recipient: a failed write only marks that player as
    /// disconnected. Returns the number of players that received the line.
    pub async fn broadcast(&self, state: &StateMessage) -> usize {
        let line = match state.encode_line() {
            Ok(line) => line,
            Err(e) => {
                error!("{}", ServerError::from(e));
                return 0;
            }
        };

        let [left, right] = &self.players;
        let (left_ok, right_ok) = tokio::join!(
            left.deliver(line.as_bytes(), self.write_timeout),
            right.deliver(line.as_bytes(), self.write_timeout)
        );

        usize::from(left_ok) + usize::from(right_ok)
    }

    /// Marks both players disconnected and shuts down the write halves.
    pub async fn close(&self) {
        for player in &self.players {
            player.mark_disconnected();
            let mut writer = player.writer.lock().await;
            match timeout(self.write_timeout, writer.shutdown()).await {
                Ok(Ok(())) => debug!("Closed connection to player {}", player.id),
                Ok(Err(e)) => debug!("Closing player {} failed: {}", player.id, e),
                Err(_) => debug!("Closing player {} timed out", player.id),
            }
        }
    }
}
