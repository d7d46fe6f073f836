//! Per-player input worker
//!
//! Each seated player gets one worker that owns the read half of its socket.
//! Recognised commands move that player's paddle under the match lock. A
//! failed or closed read ends the worker and forfeits the match to the
//! opponent; there is no reconnection.

use crate::client_manager::ClientManager;
use crate::error::ServerError;
use crate::game::SharedMatch;
use log::{debug, warn};
use pong_shared::{CommandDecoder, PlayerId};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

const READ_BUFFER_SIZE: usize = 64;

/// Reads commands for `player` until the connection fails or the round shuts down.
///
/// Returns the connection error that ended the worker, or `None` when it was
/// stopped by the shutdown signal.
pub async fn run_input_worker<R>(
    player: PlayerId,
    mut reader: R,
    state: SharedMatch,
    clients: Arc<ClientManager>,
    mut shutdown: watch::Receiver<bool>,
) -> Option<ServerError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = CommandDecoder::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let read = tokio::select! {
            _ = shutdown.changed() => {
                debug!("Input worker for player {} stopped", player);
                return None;
            }
            read = reader.read(&mut buffer) => read,
        };

        let source = match read {
            Ok(0) => io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer"),
            Ok(len) => {
                decoder.push(&buffer[..len]);
                let mut state = state.lock().await;
                while let Some(command) = decoder.next_command() {
                    state.move_paddle(player, command);
                }
                continue;
            }
            Err(e) => e,
        };

        let error = ServerError::ConnectionLost { player, source };
        warn!("{}", error);
        // Outcome first, so anyone who sees the cleared flag also sees the winner
        state.lock().await.forfeit(player);
        clients.mark_disconnected(player);
        return Some(error);
    }
}
