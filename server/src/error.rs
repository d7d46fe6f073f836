//! Failure taxonomy for the match server
//!
//! Only `Bind` ever reaches the process entry point. Everything else is
//! contained in the round that produced it: transient accept failures are
//! retried, connection failures become a forfeit or a cleared connected flag,
//! and invariant violations abandon the current round.

use pong_shared::PlayerId;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to send player id {player}: {source}")]
    Handshake {
        player: PlayerId,
        #[source]
        source: io::Error,
    },

    #[error("connection to player {player} lost: {source}")]
    ConnectionLost {
        player: PlayerId,
        #[source]
        source: io::Error,
    },

    #[error("write to player {player} did not complete within {timeout:?}")]
    WriteTimeout { player: PlayerId, timeout: Duration },

    #[error("failed to encode match state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("simulation invariant violated: {0}")]
    InvariantViolation(String),
}

impl ServerError {
    /// Transient errors are retried in place and never end a round.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServerError::Accept(_) | ServerError::Handshake { .. })
    }

    /// The player whose connection this error is about, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            ServerError::Handshake { player, .. }
            | ServerError::ConnectionLost { player, .. }
            | ServerError::WriteTimeout { player, .. } => Some(*player),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let accept = ServerError::Accept(io::Error::new(io::ErrorKind::Other, "emfile"));
        assert!(accept.is_transient());
        assert_eq!(accept.player(), None);

        // A failed handshake retries the seat immediately, without the accept backoff
        let handshake = ServerError::Handshake {
            player: PlayerId::Left,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "gone"),
        };
        assert!(handshake.is_transient());
        assert_eq!(handshake.player(), Some(PlayerId::Left));

        let lost = ServerError::ConnectionLost {
            player: PlayerId::Right,
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        };
        assert!(!lost.is_transient());
        assert_eq!(lost.player(), Some(PlayerId::Right));

        let invariant = ServerError::InvariantViolation("ball escaped".to_string());
        assert!(!invariant.is_transient());
    }

    #[test]
    fn test_error_messages() {
        let timeout = ServerError::WriteTimeout {
            player: PlayerId::Left,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(
            timeout.to_string(),
            "write to player 0 did not complete within 250ms"
        );

        let lost = ServerError::ConnectionLost {
            player: PlayerId::Right,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "closed by peer"),
        };
        assert_eq!(lost.to_string(), "connection to player 1 lost: closed by peer");
    }
}
