//! Command execution on an authenticated session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, info};

use crate::channel::collector::{CollectorConfig, ResponseCollector};
use crate::channel::policy::{CompletionPolicy, FirstOf, IdleWindow, PromptMarker};
use crate::channel::shell::{LINE_ENDING, RemoteShell};
use crate::device::CommandOutcome;
use crate::error::Result;

/// Builds the completion policy used for one device's commands.
///
/// Injected so devices with different prompt quirks can be supported
/// without touching the executor itself.
pub type PolicyFactory = Arc<dyn Fn(&str) -> Box<dyn CompletionPolicy> + Send + Sync>;

/// Timing configuration for command execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Pause after authentication before the first command. The remote
    /// interpreter is not ready immediately after login; sending earlier
    /// gets the first command silently dropped or mangled in the echo.
    pub init_delay: Duration,

    /// Pause between commands so one command's trailing prompt cannot
    /// overlap the next command's issuance.
    pub inter_command_delay: Duration,

    /// Consecutive silent read cycles that imply a command has finished.
    pub idle_threshold: u32,

    /// Collection timing shared with the handshake.
    pub collector: CollectorConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            init_delay: Duration::from_secs(3),
            inter_command_delay: Duration::from_millis(500),
            idle_threshold: 3,
            collector: CollectorConfig::default(),
        }
    }
}

/// Drives one command at a time through an authenticated shell, deciding
/// completion with the response collector and normalizing the output.
pub struct CommandRunner {
    config: ExecutorConfig,
    collector: ResponseCollector,
    policy_factory: PolicyFactory,
}

impl CommandRunner {
    /// Runner with the default policy: prompt marker for early exit,
    /// idle window as the backstop.
    pub fn new(config: ExecutorConfig) -> Self {
        let idle_threshold = config.idle_threshold;
        let factory: PolicyFactory = Arc::new(move |host: &str| {
            Box::new(FirstOf::new(vec![
                Box::new(PromptMarker::new(host)),
                Box::new(IdleWindow::new(idle_threshold)),
            ]))
        });
        Self::with_policy_factory(config, factory)
    }

    /// Runner with a caller-supplied completion policy.
    pub fn with_policy_factory(config: ExecutorConfig, policy_factory: PolicyFactory) -> Self {
        let collector = ResponseCollector::new(config.collector.clone());
        Self {
            config,
            collector,
            policy_factory,
        }
    }

    /// Execute `commands` in order on an already-authenticated shell.
    ///
    /// Blank entries are skipped without producing an outcome. A command
    /// that yields nothing is recorded with `success = false` and the
    /// loop continues; only a transport fault escalates, abandoning the
    /// remaining commands.
    pub async fn run<S: RemoteShell>(
        &self,
        shell: &mut S,
        commands: &[String],
        host: &str,
    ) -> Result<Vec<CommandOutcome>> {
        // Let the interpreter finish starting up before the first send.
        tokio::time::sleep(self.config.init_delay).await;

        let total = commands.iter().filter(|c| !c.trim().is_empty()).count();
        let mut outcomes = Vec::with_capacity(total);

        for command in commands {
            let command = command.trim();
            if command.is_empty() {
                continue;
            }

            info!(
                "executing command {}/{} on {host}: {command}",
                outcomes.len() + 1,
                total
            );
            shell.send_line(command).await?;

            let mut policy = (self.policy_factory)(host);
            let collected = self
                .collector
                .collect_until_complete(shell, policy.as_mut())
                .await?;

            let cleaned = clean_response(&collected.transcript, command);
            if cleaned.is_empty() {
                info!("no response received for command: {command}");
            } else {
                debug!("command output ({host} - {command}):\n{cleaned}");
            }

            outcomes.push(CommandOutcome {
                command: command.to_string(),
                raw: collected.transcript,
                success: !cleaned.is_empty(),
                cleaned,
                reason: collected.reason,
                completed_at: Local::now(),
            });

            tokio::time::sleep(self.config.inter_command_delay).await;
        }

        Ok(outcomes)
    }
}

/// Strip shell chrome from a raw transcript.
///
/// Splits on the canonical line ending and drops lines that are blank
/// after trimming, identical to the echoed command, or ending with the
/// prompt character; the remainder is rejoined with plain newlines. An
/// empty result is a normal, reportable outcome.
pub fn clean_response(raw: &str, command: &str) -> String {
    raw.split(LINE_ENDING)
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != command && !line.ends_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::policy::CompletionReason;
    use crate::channel::testing::ScriptedShell;

    #[test]
    fn test_clean_drops_echo_prompt_and_blank_lines() {
        let raw = "ipconfig\r\n\r\nIP Address: 10.0.1.36\r\nSubnet:  255.255.255.0  \r\nCP4-10.0.1.36>";
        assert_eq!(
            clean_response(raw, "ipconfig"),
            "IP Address: 10.0.1.36\nSubnet:  255.255.255.0"
        );
    }

    #[test]
    fn test_clean_of_echo_and_prompt_only_is_empty() {
        assert_eq!(clean_response("ver\r\nCRESTRON>", "ver"), "");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = "ver\r\nCP4 [v2.001.0058]\r\nBuild: Jul 7 2025\r\nCRESTRON>";
        let once = clean_response(raw, "ver");
        assert_eq!(clean_response(&once, "ver"), once);
    }

    #[test]
    fn test_clean_of_empty_is_empty() {
        assert_eq!(clean_response("", "ver"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_collects_ordered_outcomes() {
        let mut shell = ScriptedShell::idle()
            .on_send("ipconfig", &["ipconfig\r\nIP Address: 10.0.1.36\r\nCRESTRON-CP4>"])
            .on_send("ver", &["ver\r\nCP4 [v2.001.0058]\r\nCRESTRON-CP4>"]);
        let runner = CommandRunner::new(ExecutorConfig::default());

        let outcomes = runner
            .run(
                &mut shell,
                &["ipconfig".to_string(), "ver".to_string()],
                "10.0.1.36",
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].command, "ipconfig");
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].cleaned, "IP Address: 10.0.1.36");
        assert_eq!(outcomes[0].reason, CompletionReason::Prompt);
        assert_eq!(outcomes[1].command, "ver");
        assert!(outcomes[1].success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_commands_are_skipped_without_outcomes() {
        let mut shell =
            ScriptedShell::idle().on_send("ver", &["ver\r\nCP4 [v2.001.0058]\r\nCRESTRON>"]);
        let runner = CommandRunner::new(ExecutorConfig::default());

        let outcomes = runner
            .run(
                &mut shell,
                &["".to_string(), "   ".to_string(), "ver".to_string()],
                "10.0.1.36",
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].command, "ver");
        // Only the real command was transmitted.
        assert_eq!(shell.sent, vec![format!("ver{LINE_ENDING}")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_command_is_recorded_not_raised() {
        let mut shell = ScriptedShell::idle();
        let runner = CommandRunner::new(ExecutorConfig::default());

        let outcomes = runner
            .run(&mut shell, &["reboot".to_string()], "10.0.1.36")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].cleaned.is_empty());
        assert_eq!(outcomes[0].reason, CompletionReason::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_and_prompt_only_yields_unsuccessful_outcome() {
        // The device echoes the command and returns its prompt with no
        // output in between; that cleans to nothing and reads as failure.
        let mut shell = ScriptedShell::idle().on_send("beep", &["beep\r\nCRESTRON>"]);
        let runner = CommandRunner::new(ExecutorConfig::default());

        let outcomes = runner
            .run(&mut shell, &["beep".to_string()], "10.0.1.36")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].cleaned.is_empty());
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].reason, CompletionReason::Prompt);
        assert_eq!(outcomes[0].raw, "beep\r\nCRESTRON>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_escalates() {
        let mut shell = ScriptedShell::broken();
        let runner = CommandRunner::new(ExecutorConfig::default());

        let result = runner
            .run(&mut shell, &["ver".to_string()], "10.0.1.36")
            .await;

        assert!(result.is_err());
    }
}
