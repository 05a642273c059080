//! Device-list discovery and parsing.
//!
//! Two formats, auto-detected: CSV with `ip`/`username`/`password` plus
//! any number of `command1..commandN` columns, and plain text with one
//! address per line. Headers are matched case-insensitively and command
//! columns execute in numerical order regardless of their position in
//! the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::warn;
use regex::Regex;

/// A device row as loaded from disk, before interactive fill-in.
///
/// Password and commands may be empty here; the operator prompts supply
/// them before targets are handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDevice {
    pub address: String,
    pub username: String,
    pub password: String,
    pub commands: Vec<String>,
}

/// Username applied when a row does not name one.
pub const DEFAULT_USERNAME: &str = "admin";

/// Files probed, in order, when no path is given on the command line.
const DEFAULT_CONFIG_FILES: [&str; 4] = [
    "devices.csv",
    "devices.txt",
    "crestron_devices.csv",
    "config.csv",
];

/// Look for a default device list in the working directory.
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Load and parse a device list, auto-detecting the format.
pub fn load_devices(path: &Path) -> Result<Vec<LoadedDevice>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading device list {}", path.display()))?;

    let first_line = text.lines().next().unwrap_or("").trim();
    let devices = if first_line.contains(',') || first_line.to_ascii_lowercase().starts_with("ip")
    {
        parse_csv(&text)?
    } else {
        parse_plain(&text)
    };

    if devices.is_empty() {
        bail!("no devices found in {}", path.display());
    }
    Ok(devices)
}

/// Parse the CSV format.
///
/// Cells are split on commas without quoting support — device lists are
/// single-token fields, and none of the observed exports quote anything.
fn parse_csv(text: &str) -> Result<Vec<LoadedDevice>> {
    let command_header = Regex::new(r"(?i)^command(\d+)$").expect("static regex");

    let mut lines = text.lines();
    let header = lines.next().context("device list is empty")?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let ip_col = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case("ip"))
        .context("CSV device list has no 'ip' column")?;
    let user_col = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case("username") || c.eq_ignore_ascii_case("user"));
    let pass_col = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case("password") || c.eq_ignore_ascii_case("pass"));

    // Command columns ordered by their number, not their file position.
    let mut command_cols: Vec<(u32, usize)> = columns
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| {
            command_header
                .captures(c)
                .and_then(|caps| caps[1].parse().ok())
                .map(|n: u32| (n, idx))
        })
        .collect();
    command_cols.sort_by_key(|(n, _)| *n);

    let mut devices = Vec::new();
    for (row_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |idx: usize| cells.get(idx).copied().unwrap_or("");

        let address = cell(ip_col);
        if address.is_empty() {
            // Header is row 1.
            warn!("row {}: no IP address, skipping", row_num + 2);
            continue;
        }

        let username = user_col
            .map(cell)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USERNAME);
        let password = pass_col.map(cell).unwrap_or("");

        // Empty cells are skipped; order still follows the column number.
        let commands = command_cols
            .iter()
            .map(|(_, idx)| cell(*idx))
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        devices.push(LoadedDevice {
            address: address.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            commands,
        });
    }

    Ok(devices)
}

/// Parse the plain-text format: one address per line, `#` comments.
/// Credentials and commands are supplied interactively later.
fn parse_plain(text: &str) -> Vec<LoadedDevice> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|address| LoadedDevice {
            address: address.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            commands: Vec::new(),
        })
        .collect()
}

const SAMPLE_CSV: &str = "\
ip,username,password,command1,command2,command3,command4,command5
10.0.1.36,admin,mypassword,ipconfig,ver,hostname,uptime,whoami
10.0.1.37,admin,mypassword,ipconfig,ver,hostname,,
10.0.1.38,admin,mypassword,ipconfig,ver,hostname,uptime,whoami
10.0.1.39,admin,mypassword,ver,hostname,,,
10.0.1.40,admin,mypassword,ipconfig,ver,hostname,uptime,
";

const SAMPLE_TXT: &str = "\
# Device IP addresses
# One IP per line, lines starting with # are ignored
# Commands will be prompted interactively for this format
10.0.1.36
10.0.1.37
10.0.1.38
10.0.1.39
10.0.1.40
";

/// Write the two sample device lists into `dir`.
pub fn write_samples(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let csv = dir.join("devices_sample.csv");
    let txt = dir.join("devices_sample.txt");
    fs::write(&csv, SAMPLE_CSV).with_context(|| format!("writing {}", csv.display()))?;
    fs::write(&txt, SAMPLE_TXT).with_context(|| format!("writing {}", txt.display()))?;
    Ok((csv, txt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_sparse_command_columns() {
        let devices = parse_csv(SAMPLE_CSV).unwrap();
        assert_eq!(devices.len(), 5);
        assert_eq!(devices[0].address, "10.0.1.36");
        assert_eq!(devices[0].username, "admin");
        assert_eq!(devices[0].password, "mypassword");
        assert_eq!(
            devices[0].commands,
            vec!["ipconfig", "ver", "hostname", "uptime", "whoami"]
        );
        // Empty cells are skipped, not preserved as blanks.
        assert_eq!(devices[1].commands, vec!["ipconfig", "ver", "hostname"]);
        assert_eq!(devices[3].commands, vec!["ver", "hostname"]);
    }

    #[test]
    fn test_csv_headers_are_case_insensitive_and_reorderable() {
        let text = "IP,Command2,USER,Command1,PASS\n10.0.1.50,second,root,first,pw\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].username, "root");
        assert_eq!(devices[0].password, "pw");
        // Numerical order, not column order.
        assert_eq!(devices[0].commands, vec!["first", "second"]);
    }

    #[test]
    fn test_csv_row_without_ip_is_skipped() {
        let text = "ip,username,password\n,admin,pw\n10.0.1.51,admin,pw\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, "10.0.1.51");
    }

    #[test]
    fn test_csv_defaults_username_when_blank() {
        let text = "ip,username,password\n10.0.1.52,,pw\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices[0].username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_plain_text_skips_comments_and_blanks() {
        let devices = parse_plain(SAMPLE_TXT);
        assert_eq!(devices.len(), 5);
        assert_eq!(devices[0].address, "10.0.1.36");
        assert_eq!(devices[0].username, DEFAULT_USERNAME);
        assert!(devices[0].password.is_empty());
        assert!(devices[0].commands.is_empty());
    }

    #[test]
    fn test_format_detection_prefers_csv_on_header() {
        // "ip" header without commas still counts as CSV per the original
        // heuristic; a bare address list must not.
        let plain = "10.0.1.36\n10.0.1.37\n";
        assert!(!plain.lines().next().unwrap().contains(','));
        let devices = parse_plain(plain);
        assert_eq!(devices.len(), 2);
    }
}
