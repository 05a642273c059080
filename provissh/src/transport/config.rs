//! SSH connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// Fixed SSH port for all device connections.
pub const DEFAULT_PORT: u16 = 22;

/// Well-known factory username presented by unconfigured devices.
pub const DEFAULT_PROBE_USERNAME: &str = "Crestron";

/// Connect timeout shared by both connection modes.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default idle read timeout on the interactive channel.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// SSH connection configuration.
///
/// Two named constructors cover the two connection modes the device
/// lifecycle needs — [`default_probe`](Self::default_probe) for the
/// first-boot factory account and [`authenticated`](Self::authenticated)
/// for operator credentials — and both funnel into the same connect
/// primitive. Authentication is password-only; key and agent auth are
/// deliberately disabled.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Username for password authentication.
    pub username: String,

    /// Password. Empty for the default-credential probe.
    pub password: SecretString,

    /// Connect timeout.
    pub connect_timeout: Duration,

    /// Idle read timeout applied to the interactive channel; used by all
    /// subsequent reads unless a caller overrides per read.
    pub read_timeout: Duration,

    /// Terminal type requested for the PTY.
    pub terminal: &'static str,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,
}

impl SshConfig {
    /// Configuration for the default-credential probe: the well-known
    /// factory username with an empty password. Rejection is the expected
    /// outcome on an already-configured device.
    pub fn default_probe(host: impl Into<String>) -> Self {
        Self::authenticated(host, DEFAULT_PROBE_USERNAME, SecretString::from(""))
    }

    /// Configuration for an authenticated connect with operator-supplied
    /// credentials.
    pub fn authenticated(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            terminal: "vt100",
            terminal_width: 80,
            terminal_height: 24,
        }
    }

    /// Override the channel idle read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The socket address used for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_probe_uses_factory_credentials() {
        let config = SshConfig::default_probe("10.0.1.36");
        assert_eq!(config.username, DEFAULT_PROBE_USERNAME);
        assert_eq!(config.password.expose_secret(), "");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_authenticated_keeps_shared_transport_parameters() {
        let config =
            SshConfig::authenticated("10.0.1.36", "admin", SecretString::from("secret"));
        assert_eq!(config.socket_addr(), "10.0.1.36:22");
        assert_eq!(config.terminal, "vt100");
        assert_eq!((config.terminal_width, config.terminal_height), (80, 24));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_read_timeout_is_configurable() {
        let config =
            SshConfig::default_probe("10.0.1.36").with_read_timeout(Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
    }
}
