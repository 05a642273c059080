//! Deployment reports.
//!
//! Two CSVs per batch — a per-device summary and a per-command detail —
//! plus a console summary with success rates. Field quoting is the
//! minimal RFC-4180 subset the messages actually need.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use provissh::{DeviceResult, DeviceStatus};

/// Quote a field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Per-device summary CSV content.
pub fn summary_csv(results: &[DeviceResult]) -> String {
    let mut lines = vec![
        "IP Address,Status,Setup Performed,Commands Executed,Successful Commands,Message,Timestamp"
            .to_string(),
    ];
    for result in results {
        lines.push(csv_row(&[
            result.address.clone(),
            result.status.to_string(),
            if result.setup_performed { "Yes" } else { "No" }.to_string(),
            result.command_results.len().to_string(),
            result.successful_commands().to_string(),
            result.message.clone(),
            result.finished_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]));
    }
    lines.join("\n") + "\n"
}

/// Per-command detail CSV content.
pub fn details_csv(results: &[DeviceResult]) -> String {
    let mut lines = vec!["IP Address,Command,Success,Response Length,Timestamp".to_string()];
    for result in results {
        for outcome in &result.command_results {
            lines.push(csv_row(&[
                result.address.clone(),
                outcome.command.clone(),
                if outcome.success { "Yes" } else { "No" }.to_string(),
                outcome.cleaned.len().to_string(),
                outcome.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]));
        }
    }
    lines.join("\n") + "\n"
}

/// Write both reports under `dir` with timestamped names.
pub fn write_reports(dir: &Path, results: &[DeviceResult]) -> Result<(PathBuf, PathBuf)> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let summary = dir.join(format!("provissh_report_{stamp}.csv"));
    let details = dir.join(format!("provissh_command_details_{stamp}.csv"));

    fs::write(&summary, summary_csv(results))
        .with_context(|| format!("writing {}", summary.display()))?;
    fs::write(&details, details_csv(results))
        .with_context(|| format!("writing {}", details.display()))?;

    Ok((summary, details))
}

/// Console deployment summary.
pub fn print_summary(results: &[DeviceResult]) {
    let total = results.len();
    let successful = results
        .iter()
        .filter(|r| r.status == DeviceStatus::Success)
        .count();
    let setup_performed = results.iter().filter(|r| r.setup_performed).count();
    let total_commands: usize = results.iter().map(|r| r.command_results.len()).sum();
    let successful_commands: usize = results.iter().map(|r| r.successful_commands()).sum();

    println!("\nDeployment summary:");
    println!("  Total devices: {total}");
    println!("  Successful devices: {successful}");
    println!("  Failed devices: {}", total - successful);
    println!("  Required setup: {setup_performed}");
    if total > 0 {
        println!(
            "  Device success rate: {:.1}%",
            successful as f64 / total as f64 * 100.0
        );
    }
    println!("  Total commands executed: {total_commands}");
    println!("  Successful commands: {successful_commands}");
    if total_commands > 0 {
        println!(
            "  Command success rate: {:.1}%",
            successful_commands as f64 / total_commands as f64 * 100.0
        );
    }
}
