//! Interactive operator prompts.
//!
//! Fills in whatever the device list left blank — a shared admin
//! password, a shared command batch for plain-text lists — and asks for
//! final confirmation before the batch runs. Generic over reader/writer
//! so the flows are testable without a terminal.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

use crate::loader::LoadedDevice;

/// Most commands accepted interactively for a plain-text device list.
const MAX_PROMPTED_COMMANDS: usize = 10;

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading input")?;
    Ok(line.trim().to_string())
}

/// Prompt for anything the device list left blank.
///
/// A missing password is asked for once and applied to every device
/// without one; a device list without commands gets a shared batch of up
/// to ten. With `assume_yes` set, prompting is an error — a non-interactive
/// run cannot supply credentials.
pub fn fill_missing<R: BufRead, W: Write>(
    devices: &mut [LoadedDevice],
    input: &mut R,
    out: &mut W,
    assume_yes: bool,
) -> Result<()> {
    if devices.iter().any(|d| d.password.is_empty()) {
        if assume_yes {
            bail!("device list has entries without passwords; cannot prompt with --yes");
        }
        let password = ask(input, out, "Enter default admin password for devices: ")?;
        for device in devices.iter_mut() {
            if device.password.is_empty() {
                device.password = password.clone();
            }
        }
    }

    if devices.iter().all(|d| d.commands.is_empty()) && !assume_yes {
        writeln!(out, "\nEnter commands to execute on each device after setup:")?;
        let mut commands = Vec::new();
        for i in 1..=MAX_PROMPTED_COMMANDS {
            let command = ask(
                input,
                out,
                &format!("Command {i} (or press Enter to finish): "),
            )?;
            if command.is_empty() {
                break;
            }
            commands.push(command);
        }
        if !commands.is_empty() {
            for device in devices.iter_mut() {
                if device.commands.is_empty() {
                    device.commands = commands.clone();
                }
            }
        }
    }

    Ok(())
}

/// Print the batch summary and ask for a go/no-go.
pub fn confirm_batch<R: BufRead, W: Write>(
    devices: &[LoadedDevice],
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    writeln!(out, "\nDeployment configuration:")?;
    writeln!(out, "  Devices to process: {}", devices.len())?;
    if let Some(first) = devices.first() {
        writeln!(out, "  Default username: {}", first.username)?;
        if !first.commands.is_empty() {
            writeln!(out, "  Sample commands (from first device):")?;
            for (i, command) in first.commands.iter().take(3).enumerate() {
                writeln!(out, "    {}. {command}", i + 1)?;
            }
            if first.commands.len() > 3 {
                writeln!(out, "    ... and {} more", first.commands.len() - 3)?;
            }
        }
    }

    let answer = ask(
        input,
        out,
        &format!("\nProceed with deployment to {} devices? (y/N): ", devices.len()),
    )?;
    Ok(answer.eq_ignore_ascii_case("y"))
}
