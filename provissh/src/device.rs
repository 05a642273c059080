//! Device targets and per-device results.

use chrono::{DateTime, Local};
use secrecy::SecretString;
use serde::Serialize;

use crate::channel::policy::CompletionReason;

/// One device to provision: address, credentials, and the ordered command
/// batch to run after authentication.
///
/// Immutable once built by the loading side; consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Hostname or IP address.
    pub address: String,

    /// Administrator username to create and/or authenticate with.
    pub username: String,

    /// Administrator password.
    pub password: SecretString,

    /// Commands to execute in order. May be empty.
    pub commands: Vec<String>,
}

impl DeviceTarget {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password,
            commands: Vec::new(),
        }
    }

    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }
}

/// Terminal status of one device's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceStatus {
    Success,
    Failed,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Result of one command execution.
///
/// Success means "cleaned text is non-empty" — the remote shell exposes
/// no exit status, so an empty response is the only failure signal
/// available, and it is a reportable outcome rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// The command as transmitted (without line ending).
    pub command: String,

    /// Raw transcript collected for this command, ANSI-stripped.
    pub raw: String,

    /// Transcript with echo, prompt lines and blank lines removed.
    pub cleaned: String,

    /// Whether the cleaned transcript is non-empty.
    pub success: bool,

    /// What ended the collection loop.
    pub reason: CompletionReason,

    /// When the outcome was produced.
    pub completed_at: DateTime<Local>,
}

/// Result of one device's full processing pass.
///
/// Produced exactly once per [`DeviceTarget`], in input order, and
/// immutable after production; the reporting side consumes it as-is.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResult {
    /// The device address, echoed from the target.
    pub address: String,

    /// Overall status: `Success` iff the authenticated connect succeeded.
    pub status: DeviceStatus,

    /// Whether the first-boot account-creation handshake ran to
    /// completion on this device.
    pub setup_performed: bool,

    /// Human-readable note: setup outcome, connect failure, or captured
    /// fault.
    pub message: String,

    /// Per-command outcomes in submission order. Empty when the target
    /// carried no commands or the authenticated connect failed.
    pub command_results: Vec<CommandOutcome>,

    /// When processing of this device finished.
    pub finished_at: DateTime<Local>,
}

impl DeviceResult {
    /// Number of commands whose cleaned output was non-empty.
    pub fn successful_commands(&self) -> usize {
        self.command_results.iter().filter(|c| c.success).count()
    }
}
