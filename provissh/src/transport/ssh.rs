//! SSH transport implementation using russh.

use std::sync::Arc;

use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::{DEFAULT_PORT, SshConfig};
use crate::error::{Result, TransportError};

/// SSH transport wrapping a russh client session.
///
/// Holds the authenticated connection; the interactive channel opened on
/// it is owned separately by the shell wrapper so the two can be torn
/// down together on every exit path.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<DeviceHandler>,
}

impl SshTransport {
    /// Connect to the device and authenticate with the configured password.
    ///
    /// Both connection modes (default probe, authenticated) arrive here;
    /// they differ only in the credentials carried by `config`.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(
                ssh_config,
                (config.host.as_str(), DEFAULT_PORT),
                DeviceHandler,
            ),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(TransportError::Ssh)?;

        // Password-only: key files and agents are never consulted, matching
        // the factory console which accepts nothing else.
        let authenticated = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !authenticated {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(Self { session })
    }

    /// Open the interactive PTY channel with the fixed terminal geometry.
    pub async fn open_channel(&self, config: &SshConfig) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                config.terminal,
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    /// Close the connection.
    pub async fn close(&mut self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
///
/// Accepts every host key. First-boot devices present freshly generated
/// keys and factory resets regenerate them, so a known-hosts check would
/// reject exactly the devices this tool exists to provision.
struct DeviceHandler;

impl client::Handler for DeviceHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}
