//! Connection seam between the orchestrator and the SSH transport.
//!
//! The orchestrator never talks to russh directly; it asks a [`Dial`]
//! implementation for a connected shell. Production uses [`SshDialer`],
//! tests use scripted fakes, and either way the rest of the engine only
//! ever sees [`RemoteShell`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use russh::{Channel, ChannelMsg};
use russh::client::Msg;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::config::SshConfig;
use super::ssh::SshTransport;
use crate::channel::shell::{LINE_ENDING, RawChunk, RemoteShell};
use crate::error::{ChannelError, Result};
use crate::transcript::{SECRET_MASK, TranscriptSink};

/// Produces connected shells from a connection configuration.
pub trait Dial: Send + Sync {
    /// The shell type this dialer yields.
    type Shell: RemoteShell;

    /// Connect, authenticate, and open the interactive channel.
    fn dial(&self, config: &SshConfig) -> impl Future<Output = Result<Self::Shell>> + Send;
}

/// Production dialer: russh connect + PTY shell channel.
pub struct SshDialer {
    sink: Arc<dyn TranscriptSink>,
}

impl SshDialer {
    /// Create a dialer whose shells mirror their traffic into `sink`.
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self { sink }
    }
}

impl Dial for SshDialer {
    type Shell = SshShell;

    async fn dial(&self, config: &SshConfig) -> Result<SshShell> {
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_channel(config).await?;
        debug!(
            "opened {} shell ({}x{}) on {}",
            config.terminal, config.terminal_width, config.terminal_height, config.host
        );
        Ok(SshShell {
            transport,
            channel,
            read_timeout: config.read_timeout,
            sink: self.sink.clone(),
            closed: false,
        })
    }
}

/// Interactive shell over an open russh channel.
///
/// Owns the transport session together with the channel so that closing
/// one always closes the other.
pub struct SshShell {
    transport: SshTransport,
    channel: Channel<Msg>,
    /// Idle read timeout configured at construction; caps every read on
    /// this channel.
    read_timeout: Duration,
    sink: Arc<dyn TranscriptSink>,
    closed: bool,
}

impl SshShell {
    async fn write(&mut self, text: &str) -> Result<()> {
        self.channel
            .data(text.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

impl RemoteShell for SshShell {
    async fn recv(&mut self, max_wait: Duration) -> Result<Option<RawChunk>> {
        let deadline = Instant::now() + max_wait.min(self.read_timeout);
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(ChannelError::Closed.into()),
                Ok(Some(msg)) => msg,
            };

            match msg {
                ChannelMsg::Data { ref data } => {
                    trace!("recv {} bytes", data.len());
                    self.sink.received(data);
                    return Ok(Some(RawChunk::new(Bytes::copy_from_slice(data))));
                }
                ChannelMsg::ExtendedData { ref data, .. } => {
                    self.sink.received(data);
                    return Ok(Some(RawChunk::new(Bytes::copy_from_slice(data))));
                }
                ChannelMsg::Eof | ChannelMsg::Close => {
                    return Err(ChannelError::Closed.into());
                }
                // Window adjustments, exit statuses and other control
                // messages carry no shell output.
                _ => continue,
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        self.sink.sent(text);
        self.write(text).await
    }

    async fn send_secret_line(&mut self, secret: &SecretString) -> Result<()> {
        self.sink.sent(SECRET_MASK);
        let line = format!("{}{LINE_ENDING}", secret.expose_secret());
        self.write(&line).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.channel.eof().await {
            debug!("channel eof failed during close: {e}");
        }
        if let Err(e) = self.transport.close().await {
            debug!("transport close failed: {e}");
        }
    }
}
