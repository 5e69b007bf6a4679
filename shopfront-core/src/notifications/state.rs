use std::fmt;
use std::time::Duration;

use crate::utils::backoff::BackoffPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        })
    }
}

/// What to do after the connection failed or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterFailure {
    /// Sleep for `delay`, then connect again. `attempt` is 1-based.
    Retry { attempt: u32, delay: Duration },
    /// The retry budget is spent; stay disconnected until told otherwise.
    Exhausted,
}

/// Connection state machine for the push stream.
///
/// ```text
/// disconnected --connect--> connecting --handshake--> connected
///      ^                        |                        |
///      |                        +------ failure ---------+
///      |                                   v
///      +------- budget spent ---------- error ---retry---> connecting
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    policy: BackoffPolicy,
    state: ConnectionState,
    attempts: u32,
}

impl ReconnectMachine {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts made since the last successful handshake.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn connect_requested(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn handshake_succeeded(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
    }

    /// The transport failed to open, errored or was closed by the server.
    pub fn connection_lost(&mut self) -> AfterFailure {
        self.state = ConnectionState::Error;
        match self.policy.next_delay(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                AfterFailure::Retry {
                    attempt: self.attempts,
                    delay,
                }
            }
            None => {
                self.state = ConnectionState::Disconnected;
                AfterFailure::Exhausted
            }
        }
    }

    /// Back to a fresh `Disconnected` with the full budget, for an explicit
    /// user retry or teardown.
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.attempts = 0;
    }
}
