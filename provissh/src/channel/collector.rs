//! Response collection over an unframed byte stream.
//!
//! The remote interleaves command output with a mutable prompt and never
//! signals end-of-response, so the collector offers two primitives: a
//! bounded case-insensitive substring wait (for handshake prompts with
//! known text) and a policy-driven idle-window loop (for command output
//! of unknown shape). Both trade latency for reliability, and every
//! threshold is configuration rather than a constant baked into the
//! algorithm, so operators can tune for slow links.

use std::time::Duration;

use log::{debug, trace};
use memchr::memmem;
use tokio::time::{Instant, sleep};

use super::ansi::strip_ansi;
use super::policy::{CompletionPolicy, CompletionReason};
use super::shell::RemoteShell;
use crate::error::Result;

/// Timing configuration for response collection.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Pause between polls while waiting for a substring.
    pub poll_interval: Duration,

    /// Pause after sending a command before collection starts, giving the
    /// interpreter time to begin executing.
    pub settle_delay: Duration,

    /// Pause between idle-loop read cycles.
    pub cycle_interval: Duration,

    /// Maximum read cycles per response. Bounds total collection time
    /// even under continuous output that never shows a prompt.
    pub max_cycles: u32,

    /// Default bound for substring waits.
    pub substring_wait: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
            cycle_interval: Duration::from_millis(500),
            max_cycles: 20,
            substring_wait: Duration::from_secs(10),
        }
    }
}

/// A completed collection: the ANSI-stripped transcript and the signal
/// that ended it.
#[derive(Debug)]
pub struct Collected {
    pub transcript: String,
    pub reason: CompletionReason,
}

/// Turns non-blocking, possibly-empty reads into completion decisions.
#[derive(Debug, Clone, Default)]
pub struct ResponseCollector {
    config: CollectorConfig,
}

impl ResponseCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Wait up to the configured default for `needle` to appear anywhere
    /// in the accumulated stream, case-insensitively.
    pub async fn wait_for_substring<S: RemoteShell>(
        &self,
        shell: &mut S,
        needle: &str,
    ) -> Result<bool> {
        self.wait_for_substring_within(shell, needle, self.config.substring_wait)
            .await
    }

    /// Wait up to `max_wait` for `needle`, polling and appending as data
    /// arrives. Returns true on match, false on timeout; timeout is an
    /// expected outcome, not an error.
    pub async fn wait_for_substring_within<S: RemoteShell>(
        &self,
        shell: &mut S,
        needle: &str,
        max_wait: Duration,
    ) -> Result<bool> {
        let needle_lower = needle.to_ascii_lowercase();
        let finder = memmem::Finder::new(needle_lower.as_bytes());
        let deadline = Instant::now() + max_wait;

        // Lowercased shadow of the stream so far; the match may span
        // chunk boundaries, so the whole accumulation is searched.
        let mut haystack: Vec<u8> = Vec::new();

        while Instant::now() < deadline {
            if let Some(chunk) = shell.recv(Duration::ZERO).await? {
                let stripped = strip_ansi(&chunk.data);
                haystack.extend(stripped.iter().map(|b| b.to_ascii_lowercase()));
                if finder.find(&haystack).is_some() {
                    trace!("matched {needle:?} after {} bytes", haystack.len());
                    return Ok(true);
                }
            }
            sleep(self.config.poll_interval).await;
        }

        debug!("timed out after {max_wait:?} waiting for {needle:?}");
        Ok(false)
    }

    /// Collect a response until `policy` declares it complete or the
    /// cycle budget runs out.
    ///
    /// One non-blocking read per cycle; data resets the idle counter,
    /// silence increments it, and the policy sees both the transcript and
    /// the idle run after every cycle. Total wait is bounded by
    /// `settle_delay + max_cycles * cycle_interval` regardless of what
    /// the device sends.
    pub async fn collect_until_complete<S: RemoteShell>(
        &self,
        shell: &mut S,
        policy: &mut dyn CompletionPolicy,
    ) -> Result<Collected> {
        sleep(self.config.settle_delay).await;

        // Transcript and idle counter are locals: nothing about one
        // command's collection can leak into the next.
        let mut transcript: Vec<u8> = Vec::new();
        let mut idle_cycles: u32 = 0;
        let mut reason = CompletionReason::CycleBudget;

        for cycle in 0..self.config.max_cycles {
            match shell.recv(Duration::ZERO).await? {
                Some(chunk) => {
                    transcript.extend(strip_ansi(&chunk.data));
                    idle_cycles = 0;
                }
                None => idle_cycles += 1,
            }

            if let Some(r) = policy.check(&transcript, idle_cycles) {
                trace!("complete after {} cycles: {r}", cycle + 1);
                reason = r;
                break;
            }

            sleep(self.config.cycle_interval).await;
        }

        Ok(Collected {
            transcript: String::from_utf8_lossy(&transcript).into_owned(),
            reason,
        })
    }
}
