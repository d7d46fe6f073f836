//! Server and match timing configuration.
//!
//! Only the listen address is exposed on the command line. The timings keep
//! their defaults in the binary and are shortened by tests.

use std::time::Duration;

/// Timings that drive one match round.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Target period of one simulation tick (~60 Hz).
    pub tick_period: Duration,
    /// Delay between countdown steps.
    pub countdown_interval: Duration,
    /// How often the orchestrator checks for the end of a round.
    pub poll_interval: Duration,
    /// How long the finished state stays visible before connections close.
    pub grace_period: Duration,
    /// Upper bound for a single state write to one client.
    pub write_timeout: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(16),
            countdown_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            grace_period: Duration::from_secs(5),
            write_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host or interface to bind to (e.g. "localhost" or "0.0.0.0").
    pub host: String,
    pub port: u16,
    pub match_config: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            match_config: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// `host:port` string accepted by the listener.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
