//! Scripted in-memory shell for engine tests.
//!
//! Models a device console as a queue of pending chunks plus ordered
//! send-triggered replies, so collection, handshake and orchestration
//! logic can run against deterministic transcripts without a network.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;

use super::shell::{RawChunk, RemoteShell};
use crate::error::{ChannelError, Result};

/// One send-triggered reply: when a transmitted line contains `needle`,
/// the associated chunks are queued for subsequent reads. Rules are
/// consumed front-to-back, so the same needle may appear twice with
/// different replies (e.g. password then verification).
struct Reply {
    needle: String,
    chunks: Vec<Bytes>,
}

pub(crate) struct ScriptedShell {
    pending: VecDeque<Bytes>,
    replies: Vec<Reply>,
    /// When set, reads never run dry: an endless stream of this chunk.
    repeat: Option<Bytes>,
    /// Fail every recv with a channel-closed error.
    fail_recv: bool,
    /// Everything transmitted, in order.
    pub sent: Vec<String>,
    pub closed: bool,
}

impl ScriptedShell {
    /// A shell that never produces data.
    pub fn idle() -> Self {
        Self {
            pending: VecDeque::new(),
            replies: Vec::new(),
            repeat: None,
            fail_recv: false,
            sent: Vec::new(),
            closed: false,
        }
    }

    /// Queue chunks available before anything is sent.
    pub fn with_pending(chunks: &[&str]) -> Self {
        let mut shell = Self::idle();
        shell
            .pending
            .extend(chunks.iter().map(|c| Bytes::copy_from_slice(c.as_bytes())));
        shell
    }

    /// Add a send-triggered reply rule.
    pub fn on_send(mut self, needle: &str, chunks: &[&str]) -> Self {
        self.replies.push(Reply {
            needle: needle.to_string(),
            chunks: chunks
                .iter()
                .map(|c| Bytes::copy_from_slice(c.as_bytes()))
                .collect(),
        });
        self
    }

    /// Never run dry: every read yields `chunk` once the queue empties.
    pub fn repeating(mut self, chunk: &str) -> Self {
        self.repeat = Some(Bytes::copy_from_slice(chunk.as_bytes()));
        self
    }

    /// Fail all reads with a channel-closed error.
    pub fn broken() -> Self {
        let mut shell = Self::idle();
        shell.fail_recv = true;
        shell
    }
}

impl RemoteShell for ScriptedShell {
    async fn recv(&mut self, _max_wait: Duration) -> Result<Option<RawChunk>> {
        if self.fail_recv {
            return Err(ChannelError::Closed.into());
        }
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(RawChunk::new(chunk)));
        }
        Ok(self.repeat.clone().map(RawChunk::new))
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        self.sent.push(text.to_string());
        if let Some(pos) = self.replies.iter().position(|r| text.contains(&r.needle)) {
            let reply = self.replies.remove(pos);
            self.pending.extend(reply.chunks);
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
