//! Shell stream abstraction for interactive sessions.
//!
//! The remote console speaks no structured protocol — just a character
//! stream behind a PTY — so the only primitives the engine needs are
//! "read whatever is available" and "write a line". [`RemoteShell`] is
//! that seam; the production implementation drives a russh channel and
//! tests substitute a scripted fake.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use crate::error::Result;

/// Canonical line ending expected by the remote shell.
///
/// Every transmitted line is terminated with this two-character sequence;
/// the device echoes responses with it as well, so response cleaning
/// splits on it too.
pub const LINE_ENDING: &str = "\r\n";

/// A timestamped byte fragment read from the channel.
///
/// Ephemeral: chunks are appended to an accumulating transcript and never
/// mutated after the fact.
#[derive(Debug, Clone)]
pub struct RawChunk {
    /// The bytes as delivered by the transport.
    pub data: Bytes,

    /// When the chunk was read.
    pub at: Instant,
}

impl RawChunk {
    /// Wrap freshly read bytes with the current instant.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            at: Instant::now(),
        }
    }
}

/// An interactive remote shell stream.
///
/// `recv` is a bounded poll: it returns `Ok(None)` when no data arrives
/// within `max_wait` (pass [`Duration::ZERO`] for a non-blocking check)
/// and errors only on transport faults. Completion loops sit above this,
/// alternating polls with deliberate sleeps.
pub trait RemoteShell: Send {
    /// Read one available chunk, waiting at most `max_wait`.
    fn recv(
        &mut self,
        max_wait: Duration,
    ) -> impl Future<Output = Result<Option<RawChunk>>> + Send;

    /// Transmit text exactly as given.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Release the shell and its transport. Idempotent and best-effort:
    /// failure paths call this unconditionally.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Transmit a line terminated with the canonical line ending.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send {
        async move { self.send(&format!("{line}{LINE_ENDING}")).await }
    }

    /// Transmit a secret as a line. Implementations that mirror traffic
    /// into a transcript must mask the payload.
    fn send_secret_line(
        &mut self,
        secret: &SecretString,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.send(&format!("{}{LINE_ENDING}", secret.expose_secret()))
                .await
        }
    }
}
