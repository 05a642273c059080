//! Per-device sequencing and batch orchestration.
//!
//! One device is processed fully before the next begins: probe the
//! factory credentials, run the first-boot handshake if the probe lands,
//! reconnect with operator credentials, run the command batch, aggregate
//! the result. Nothing in per-device processing is fatal to the batch —
//! connection failures become statuses, unexpected faults become
//! messages, and only an operator interrupt stops scheduling further
//! devices.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info, warn};

use crate::bootstrap::{AccountSetup, SetupConfig};
use crate::channel::collector::ResponseCollector;
use crate::device::{DeviceResult, DeviceStatus, DeviceTarget};
use crate::error::Result;
use crate::executor::{CommandRunner, ExecutorConfig};
use crate::session::Session;
use crate::transcript::TranscriptSink;
use crate::transport::{Dial, SshConfig, SshDialer};

/// Batch-level configuration.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Idle read timeout applied to every device channel.
    pub read_timeout: Duration,

    /// Settle time after a completed bootstrap: the device restarts its
    /// interpreter after account creation and rejects immediate logins.
    pub post_setup_delay: Duration,

    /// Pause between devices.
    pub inter_device_delay: Duration,

    /// Command execution timing.
    pub executor: ExecutorConfig,

    /// Handshake timing.
    pub setup: SetupConfig,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            post_setup_delay: Duration::from_secs(2),
            inter_device_delay: Duration::from_secs(1),
            executor: ExecutorConfig::default(),
            setup: SetupConfig::default(),
        }
    }
}

/// Sequences the whole batch, one device at a time.
pub struct BatchRunner<D: Dial = SshDialer> {
    dialer: D,
    options: BatchOptions,
    setup: AccountSetup,
    runner: CommandRunner,
}

impl BatchRunner<SshDialer> {
    /// Production runner: SSH dialer whose traffic is mirrored into
    /// `sink` for the lifetime of this batch.
    pub fn new(options: BatchOptions, sink: Arc<dyn TranscriptSink>) -> Self {
        Self::with_dialer(SshDialer::new(sink), options)
    }
}

impl<D: Dial> BatchRunner<D> {
    /// Runner over an arbitrary dialer (tests inject scripted ones).
    pub fn with_dialer(dialer: D, options: BatchOptions) -> Self {
        let collector = ResponseCollector::new(options.executor.collector.clone());
        let setup = AccountSetup::new(options.setup.clone(), collector);
        let runner = CommandRunner::new(options.executor.clone());
        Self {
            dialer,
            options,
            setup,
            runner,
        }
    }

    /// Process every target in order, one at a time.
    ///
    /// An operator interrupt (Ctrl-C) is caught here, once: it stops
    /// scheduling further devices but does not roll back the device in
    /// flight; whatever has been aggregated so far is returned.
    pub async fn run(&self, targets: &[DeviceTarget]) -> Vec<DeviceResult> {
        let mut results = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            info!(
                "[{}/{}] processing {}",
                index + 1,
                targets.len(),
                target.address
            );

            tokio::select! {
                result = self.process_device(target) => results.push(result),
                _ = tokio::signal::ctrl_c() => {
                    warn!(
                        "interrupted; stopping with {} of {} devices processed",
                        results.len(),
                        targets.len()
                    );
                    break;
                }
            }

            if index + 1 < targets.len() {
                tokio::time::sleep(self.options.inter_device_delay).await;
            }
        }

        results
    }

    /// Run one device through probe → bootstrap → re-auth → commands.
    ///
    /// Never returns an error: faults are folded into the result, and the
    /// session is disconnected on every exit path.
    pub async fn process_device(&self, target: &DeviceTarget) -> DeviceResult {
        let mut result = DeviceResult {
            address: target.address.clone(),
            status: DeviceStatus::Failed,
            setup_performed: false,
            message: String::new(),
            command_results: Vec::new(),
            finished_at: Local::now(),
        };

        let mut session = Session::detached();
        if let Err(e) = self.drive(&mut session, target, &mut result).await {
            error!("processing {} failed: {e}", target.address);
            result.message = format!("Error: {e}");
        }
        session.disconnect().await;

        result.finished_at = Local::now();
        result
    }

    async fn drive(
        &self,
        session: &mut Session<D::Shell>,
        target: &DeviceTarget,
        result: &mut DeviceResult,
    ) -> Result<()> {
        // Phase 1: factory-credential probe. Rejection is the expected
        // outcome on a configured device and is not surfaced.
        let probe = SshConfig::default_probe(&target.address)
            .with_read_timeout(self.options.read_timeout);
        match self.dialer.dial(&probe).await {
            Ok(shell) => {
                info!("connected to {} with factory defaults", target.address);
                session.attach(shell);

                let outcome = self
                    .setup
                    .run(session.shell_mut()?, &target.username, &target.password)
                    .await?;
                if outcome.is_completed() {
                    result.setup_performed = true;
                    result.message = "setup completed".to_string();
                    info!("administrator account created on {}", target.address);
                } else {
                    result.message = "setup failed or not needed".to_string();
                    debug!("no setup performed on {}: {outcome:?}", target.address);
                }

                session.disconnect().await;
                tokio::time::sleep(self.options.post_setup_delay).await;
            }
            Err(e) => {
                debug!(
                    "factory probe of {} failed (expected on configured devices): {e}",
                    target.address
                );
            }
        }

        // Phase 2: authenticated connect, attempted regardless of the
        // probe's outcome — the device may have been configured all along.
        let auth = SshConfig::authenticated(
            &target.address,
            &target.username,
            target.password.clone(),
        )
        .with_read_timeout(self.options.read_timeout);
        match self.dialer.dial(&auth).await {
            Ok(shell) => {
                info!("connected to {} as {}", target.address, target.username);
                session.attach(shell);

                if !target.commands.is_empty() {
                    result.command_results = self
                        .runner
                        .run(session.shell_mut()?, &target.commands, &target.address)
                        .await?;
                    info!(
                        "{}/{} commands produced output on {}",
                        result.successful_commands(),
                        result.command_results.len(),
                        target.address
                    );
                }

                result.status = DeviceStatus::Success;
            }
            Err(e) => {
                result.message = "failed to connect with admin credentials".to_string();
                warn!("authenticated connect to {} failed: {e}", target.address);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use secrecy::SecretString;

    use super::*;
    use crate::channel::testing::ScriptedShell;
    use crate::error::TransportError;
    use crate::transport::DEFAULT_PROBE_USERNAME;

    /// Dialer handing out pre-scripted shells: one optional outcome for
    /// the factory probe, one for the authenticated connect.
    struct FakeDial {
        probe: Mutex<Option<Result<ScriptedShell>>>,
        auth: Mutex<Option<Result<ScriptedShell>>>,
    }

    impl FakeDial {
        fn new(probe: Result<ScriptedShell>, auth: Result<ScriptedShell>) -> Self {
            Self {
                probe: Mutex::new(Some(probe)),
                auth: Mutex::new(Some(auth)),
            }
        }
    }

    impl Dial for FakeDial {
        type Shell = ScriptedShell;

        async fn dial(&self, config: &SshConfig) -> Result<ScriptedShell> {
            let slot = if config.username == DEFAULT_PROBE_USERNAME {
                &self.probe
            } else {
                &self.auth
            };
            slot.lock()
                .unwrap()
                .take()
                .expect("unexpected extra connect")
        }
    }

    fn rejected() -> Result<ScriptedShell> {
        Err(TransportError::AuthenticationFailed {
            user: "any".to_string(),
        }
        .into())
    }

    fn target_with_commands() -> DeviceTarget {
        DeviceTarget::new("10.0.1.36", "admin", SecretString::from("pw"))
            .with_commands(vec!["ipconfig".to_string(), "ver".to_string()])
    }

    fn command_shell() -> ScriptedShell {
        ScriptedShell::idle()
            .on_send("ipconfig", &["ipconfig\r\nIP Address: 10.0.1.36\r\nCRESTRON-CP4>"])
            .on_send("ver", &["ver\r\nCP4 [v2.001.0058]\r\nCRESTRON-CP4>"])
    }

    fn wizard_shell() -> ScriptedShell {
        ScriptedShell::idle()
            .on_send("\r\n", &["Please create a local administrator account\r\nUsername:"])
            .on_send("admin", &["Password:"])
            .on_send("pw", &["Verify password:"])
            .on_send("pw", &["User admin successfully created"])
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_device_runs_commands() {
        // Probe rejected (device already configured), auth succeeds, both
        // commands answer.
        let runner = BatchRunner::with_dialer(
            FakeDial::new(rejected(), Ok(command_shell())),
            BatchOptions::default(),
        );

        let result = runner.process_device(&target_with_commands()).await;

        assert_eq!(result.status, DeviceStatus::Success);
        assert!(!result.setup_performed);
        assert_eq!(result.command_results.len(), 2);
        assert!(result.command_results.iter().all(|c| c.success));
        assert_eq!(result.command_results[0].command, "ipconfig");
        assert_eq!(result.command_results[1].command, "ver");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_boot_device_is_bootstrapped_then_reconnected() {
        let runner = BatchRunner::with_dialer(
            FakeDial::new(Ok(wizard_shell()), Ok(command_shell())),
            BatchOptions::default(),
        );

        let result = runner.process_device(&target_with_commands()).await;

        assert!(result.setup_performed);
        assert_eq!(result.status, DeviceStatus::Success);
        assert_eq!(result.command_results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_after_bootstrap_reports_failed() {
        let runner = BatchRunner::with_dialer(
            FakeDial::new(Ok(wizard_shell()), rejected()),
            BatchOptions::default(),
        );

        let result = runner.process_device(&target_with_commands()).await;

        assert!(result.setup_performed);
        assert_eq!(result.status, DeviceStatus::Failed);
        assert_eq!(result.message, "failed to connect with admin credentials");
        assert!(result.command_results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_command_list_status_depends_on_connection_alone() {
        let target = DeviceTarget::new("10.0.1.36", "admin", SecretString::from("pw"));

        let connected = BatchRunner::with_dialer(
            FakeDial::new(rejected(), Ok(ScriptedShell::idle())),
            BatchOptions::default(),
        );
        let result = connected.process_device(&target).await;
        assert_eq!(result.status, DeviceStatus::Success);
        assert!(result.command_results.is_empty());

        let unreachable = BatchRunner::with_dialer(
            FakeDial::new(rejected(), rejected()),
            BatchOptions::default(),
        );
        let result = unreachable.process_device(&target).await;
        assert_eq!(result.status, DeviceStatus::Failed);
        assert!(result.command_results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_is_captured_in_the_message() {
        // The channel dies mid-command; the fault is recorded, not thrown.
        let runner = BatchRunner::with_dialer(
            FakeDial::new(rejected(), Ok(ScriptedShell::broken())),
            BatchOptions::default(),
        );

        let result = runner.process_device(&target_with_commands()).await;

        assert_eq!(result.status, DeviceStatus::Failed);
        assert!(result.message.starts_with("Error:"));
        assert!(result.command_results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aggregates_in_input_order() {
        let _ = env_logger::builder().is_test(true).try_init();

        let targets = vec![
            DeviceTarget::new("10.0.1.36", "admin", SecretString::from("pw")),
            DeviceTarget::new("10.0.1.37", "admin", SecretString::from("pw")),
        ];
        // Single dialer shared by both devices: each hands out its probe
        // and auth slots once, so give the second device its own runner.
        let runner = BatchRunner::with_dialer(
            SequencedDial::new(vec![
                (rejected(), Ok(ScriptedShell::idle())),
                (rejected(), Ok(ScriptedShell::idle())),
            ]),
            BatchOptions::default(),
        );

        let results = runner.run(&targets).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].address, "10.0.1.36");
        assert_eq!(results[1].address, "10.0.1.37");
        assert!(results.iter().all(|r| r.status == DeviceStatus::Success));
    }

    /// Dialer serving a probe/auth pair per device, in order.
    struct SequencedDial {
        pairs: Mutex<Vec<(Option<Result<ScriptedShell>>, Option<Result<ScriptedShell>>)>>,
        cursor: Mutex<usize>,
    }

    impl SequencedDial {
        fn new(pairs: Vec<(Result<ScriptedShell>, Result<ScriptedShell>)>) -> Self {
            Self {
                pairs: Mutex::new(
                    pairs
                        .into_iter()
                        .map(|(p, a)| (Some(p), Some(a)))
                        .collect(),
                ),
                cursor: Mutex::new(0),
            }
        }
    }

    impl Dial for SequencedDial {
        type Shell = ScriptedShell;

        async fn dial(&self, config: &SshConfig) -> Result<ScriptedShell> {
            let mut cursor = self.cursor.lock().unwrap();
            let mut pairs = self.pairs.lock().unwrap();
            let pair = &mut pairs[*cursor];
            if config.username == DEFAULT_PROBE_USERNAME {
                pair.0.take().expect("probe dialed twice")
            } else {
                let auth = pair.1.take().expect("auth dialed twice");
                *cursor += 1;
                auth
            }
        }
    }
}
