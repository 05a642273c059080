//! Error types for provissh.

use std::time::Duration;

use thiserror::Error;

/// Main error type for provissh operations.
///
/// Anything that surfaces here is a transport-level fault. Expected
/// shortfalls — a default-credential probe being rejected, a bootstrap
/// wizard that never appears, a command producing no output — are values,
/// not errors (see [`SetupOutcome`](crate::bootstrap::SetupOutcome) and
/// [`CommandOutcome`](crate::device::CommandOutcome)).
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connect, authenticate).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Faults on an established shell channel.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Transport layer errors (SSH connection, authentication).
///
/// Recoverable at the orchestrator: a failed connect moves the device to
/// the next phase or marks it failed, never aborting the batch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error, carrying the remote-reported reason.
    #[error("ssh error: {0}")]
    Ssh(#[from] russh::Error),

    /// The server rejected the supplied password.
    #[error("authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// The TCP/SSH connect did not complete within the connect timeout.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
}

/// Faults on the interactive shell channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A session operation was attempted before a connect succeeded.
    #[error("not connected")]
    NotConnected,

    /// The remote end closed the channel mid-session.
    #[error("channel closed by remote")]
    Closed,

    /// SSH protocol error on the channel.
    #[error("channel ssh error: {0}")]
    Ssh(russh::Error),
}

/// Result type alias using provissh's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
