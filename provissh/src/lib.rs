//! # Provissh
//!
//! Async SSH bulk-provisioning engine for headless network devices.
//!
//! Provissh drives interactive, line-oriented shell sessions against
//! devices that speak no structured protocol — just a raw character
//! stream behind a PTY with a mutable prompt. It bootstraps first-boot
//! administrator accounts, executes command batches, and infers response
//! completion from timing heuristics (idle windows) and prompt markers,
//! because the remote end never frames its output.
//!
//! ## Features
//!
//! - Async SSH connections via russh (password-only, as the devices demand)
//! - Factory-credential probe + first-boot account-creation handshake
//! - Pluggable completion policies (idle window, prompt marker, regex)
//! - Strictly sequential batch orchestration with guaranteed cleanup
//! - Injected wire-transcript sinks, scoped to one batch run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use provissh::{BatchOptions, BatchRunner, DeviceTarget, NullSink};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() {
//!     let targets = vec![
//!         DeviceTarget::new("10.0.1.36", "admin", SecretString::from("secret"))
//!             .with_commands(vec!["ipconfig".into(), "ver".into()]),
//!     ];
//!
//!     let runner = BatchRunner::new(BatchOptions::default(), Arc::new(NullSink));
//!     for result in runner.run(&targets).await {
//!         println!("{}: {}", result.address, result.status);
//!     }
//! }
//! ```

pub mod bootstrap;
pub mod channel;
pub mod device;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod session;
pub mod transcript;
pub mod transport;

// Re-export main types for convenience
pub use bootstrap::{AccountSetup, SetupConfig, SetupOutcome, SetupState};
pub use channel::{
    Collected, CollectorConfig, CompletionPolicy, CompletionReason, FirstOf, IdleWindow,
    PatternMatch, PromptMarker, RawChunk, RemoteShell, ResponseCollector,
};
pub use device::{CommandOutcome, DeviceResult, DeviceStatus, DeviceTarget};
pub use error::Error;
pub use executor::{CommandRunner, ExecutorConfig, PolicyFactory, clean_response};
pub use orchestrator::{BatchOptions, BatchRunner};
pub use session::Session;
pub use transcript::{NullSink, SECRET_MASK, TranscriptSink};
pub use transport::{DEFAULT_PROBE_USERNAME, Dial, SshConfig, SshDialer, SshShell, SshTransport};
