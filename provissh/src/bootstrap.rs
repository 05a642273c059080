//! First-boot administrator account creation.
//!
//! An unconfigured device greets its first login with a console wizard
//! that demands a local administrator account before anything else works.
//! [`AccountSetup`] drives that wizard as a state machine; a wizard that
//! never appears (the device is already configured, or the prompt text is
//! unrecognized) is a normal outcome, not an error — only transport
//! faults escalate.

use std::time::Duration;

use log::{debug, info};
use secrecy::SecretString;

use crate::channel::ansi::strip_ansi;
use crate::channel::collector::ResponseCollector;
use crate::channel::shell::RemoteShell;
use crate::error::Result;

/// Phrases that identify the first-boot wizard in its opening banner,
/// matched case-insensitively anywhere in the captured text.
const SETUP_INDICATORS: [&str; 3] = ["create a local administrator", "username:", "please create"];

/// Where the handshake currently is — equivalently, which prompt it is
/// waiting on. Terminal outcomes live in [`SetupOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    /// Waiting for the wizard banner after a nudge with a blank line.
    AwaitingSetupPrompt,

    /// Waiting for the `Username:` prompt.
    AwaitingUsernamePrompt,

    /// Username sent; waiting for the `Password:` prompt.
    AwaitingPasswordPrompt,

    /// Password sent; waiting for the `Verify password:` prompt.
    AwaitingVerifyPrompt,

    /// Verification sent; waiting for the success phrase.
    AwaitingConfirmation,
}

/// How the handshake ended.
///
/// `Incomplete` is the expected result on an already-configured device
/// and carries the state the machine stalled in. It never surfaces as an
/// error; the orchestrator folds it into a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The wizard confirmed the account was created.
    Completed,

    /// The wizard never appeared or stalled mid-way.
    Incomplete(SetupState),
}

impl SetupOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Timing configuration for the handshake.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// Read cycles collecting the opening banner.
    pub capture_cycles: u32,

    /// Pause between banner read cycles.
    pub capture_interval: Duration,

    /// Bound for each intermediate prompt wait.
    pub prompt_wait: Duration,

    /// Bound for the final success-phrase wait; account creation takes
    /// the device noticeably longer than prompting does.
    pub confirm_wait: Duration,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            capture_cycles: 5,
            capture_interval: Duration::from_secs(1),
            prompt_wait: Duration::from_secs(5),
            confirm_wait: Duration::from_secs(15),
        }
    }
}

/// Drives the first-boot account-creation wizard on a freshly probed
/// session.
pub struct AccountSetup {
    config: SetupConfig,
    collector: ResponseCollector,
}

impl AccountSetup {
    pub fn new(config: SetupConfig, collector: ResponseCollector) -> Self {
        Self { config, collector }
    }

    /// Run the wizard to completion or to its first stall.
    ///
    /// On `Incomplete(AwaitingSetupPrompt)` no credentials have been
    /// transmitted and the session is left connected for the caller to
    /// disconnect.
    pub async fn run<S: RemoteShell>(
        &self,
        shell: &mut S,
        username: &str,
        password: &SecretString,
    ) -> Result<SetupOutcome> {
        let mut state = SetupState::AwaitingSetupPrompt;
        let mut banner: Vec<u8> = Vec::new();

        loop {
            state = match state {
                SetupState::AwaitingSetupPrompt => {
                    // Nudge the console, then give the banner a few
                    // seconds to trickle in.
                    shell.send_line("").await?;
                    for _ in 0..self.config.capture_cycles {
                        if let Some(chunk) = shell.recv(Duration::ZERO).await? {
                            banner.extend(strip_ansi(&chunk.data));
                        }
                        tokio::time::sleep(self.config.capture_interval).await;
                    }

                    let lower = String::from_utf8_lossy(&banner).to_ascii_lowercase();
                    if !SETUP_INDICATORS.iter().any(|p| lower.contains(p)) {
                        debug!("no setup wizard detected; device appears configured");
                        return Ok(SetupOutcome::Incomplete(state));
                    }
                    SetupState::AwaitingUsernamePrompt
                }

                SetupState::AwaitingUsernamePrompt => {
                    let lower = String::from_utf8_lossy(&banner).to_ascii_lowercase();
                    let mut seen = lower.contains("username:");
                    if !seen {
                        // The banner mentioned setup but the prompt has
                        // not landed yet; nudge once more.
                        shell.send_line("").await?;
                        seen = self
                            .collector
                            .wait_for_substring_within(shell, "Username:", self.config.prompt_wait)
                            .await?;
                    }
                    if !seen {
                        return Ok(SetupOutcome::Incomplete(state));
                    }
                    shell.send_line(username).await?;
                    SetupState::AwaitingPasswordPrompt
                }

                SetupState::AwaitingPasswordPrompt => {
                    if !self
                        .collector
                        .wait_for_substring_within(shell, "Password:", self.config.prompt_wait)
                        .await?
                    {
                        return Ok(SetupOutcome::Incomplete(state));
                    }
                    shell.send_secret_line(password).await?;
                    SetupState::AwaitingVerifyPrompt
                }

                SetupState::AwaitingVerifyPrompt => {
                    if !self
                        .collector
                        .wait_for_substring_within(
                            shell,
                            "Verify password:",
                            self.config.prompt_wait,
                        )
                        .await?
                    {
                        return Ok(SetupOutcome::Incomplete(state));
                    }
                    shell.send_secret_line(password).await?;
                    SetupState::AwaitingConfirmation
                }

                SetupState::AwaitingConfirmation => {
                    if self
                        .collector
                        .wait_for_substring_within(
                            shell,
                            "successfully created",
                            self.config.confirm_wait,
                        )
                        .await?
                    {
                        info!("administrator account '{username}' created");
                        return Ok(SetupOutcome::Completed);
                    }
                    return Ok(SetupOutcome::Incomplete(state));
                }
            };
        }
    }
}
