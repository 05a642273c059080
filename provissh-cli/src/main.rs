//! Bulk device provisioning over SSH.
//!
//! Loads a device list (CSV or plain text), fills in missing credentials
//! and commands interactively, then drives every device through the
//! provisioning engine one at a time and writes CSV reports. Ctrl-C
//! stops scheduling further devices; whatever already completed is still
//! reported.

mod loader;
mod prompt;
mod report;
mod trace;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use provissh::{BatchOptions, BatchRunner, DeviceTarget};
use secrecy::SecretString;

#[derive(Parser)]
#[command(
    name = "provissh",
    version,
    about = "Bulk provisioning for headless network devices over SSH"
)]
struct Cli {
    /// Device list (CSV or plain text). Defaults to a well-known file in
    /// the working directory.
    config: Option<PathBuf>,

    /// Write devices_sample.csv / devices_sample.txt and exit.
    #[arg(long)]
    create_sample: bool,

    /// Skip the confirmation prompt (requires a complete device list).
    #[arg(long, short = 'y')]
    yes: bool,

    /// Channel idle read timeout in seconds.
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// Directory for transcript logs and reports.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.create_sample {
        let (csv, txt) = loader::write_samples(&cli.out_dir)?;
        println!("Sample device lists created:");
        println!("  {} (CSV with per-device command columns)", csv.display());
        println!("  {} (plain address list)", txt.display());
        return Ok(());
    }

    let path = match cli.config {
        Some(path) => path,
        None => loader::find_default_config().context(
            "no device list found; pass a path or run with --create-sample to get started",
        )?,
    };
    println!("Using device list: {}", path.display());

    let mut devices = loader::load_devices(&path)?;
    println!("Loaded {} devices", devices.len());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    prompt::fill_missing(&mut devices, &mut input, &mut out, cli.yes)?;
    if !cli.yes && !prompt::confirm_batch(&devices, &mut input, &mut out)? {
        println!("Deployment cancelled");
        return Ok(());
    }

    let targets: Vec<DeviceTarget> = devices
        .into_iter()
        .map(|d| {
            DeviceTarget::new(d.address, d.username, SecretString::from(d.password))
                .with_commands(d.commands)
        })
        .collect();

    let transcript = Arc::new(
        trace::FileTranscript::create(&cli.out_dir).context("creating transcript log")?,
    );
    println!("Logging wire transcript to: {}", transcript.path().display());

    let options = BatchOptions {
        read_timeout: Duration::from_secs(cli.read_timeout),
        ..Default::default()
    };
    let runner = BatchRunner::new(options, transcript.clone());

    info!("starting deployment to {} devices", targets.len());
    let results = runner.run(&targets).await;

    let (summary, details) = report::write_reports(&cli.out_dir, &results)?;
    println!("\nReports saved:");
    println!("  Summary:  {}", summary.display());
    println!("  Commands: {}", details.display());
    report::print_summary(&results);

    Ok(())
}
