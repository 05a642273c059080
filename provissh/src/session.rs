//! Session lifecycle around one shell link.

use log::debug;

use crate::channel::shell::RemoteShell;
use crate::error::{ChannelError, Result};

/// Exclusive owner of at most one live shell link.
///
/// A session is created detached, attached after a successful connect,
/// and disconnected on every exit path — including paths where no
/// connect ever happened, so [`disconnect`](Self::disconnect) is
/// idempotent and safe to call at any point in the lifecycle.
pub struct Session<S: RemoteShell> {
    shell: Option<S>,
}

impl<S: RemoteShell> Session<S> {
    /// A session with no live link.
    pub fn detached() -> Self {
        Self { shell: None }
    }

    /// A session owning a freshly connected shell.
    pub fn established(shell: S) -> Self {
        Self { shell: Some(shell) }
    }

    /// Replace the link after a reconnect. Any previous link must have
    /// been disconnected first.
    pub fn attach(&mut self, shell: S) {
        debug_assert!(self.shell.is_none(), "attach over a live link");
        self.shell = Some(shell);
    }

    pub fn is_connected(&self) -> bool {
        self.shell.is_some()
    }

    /// Access the live shell, or `ChannelError::NotConnected`.
    pub fn shell_mut(&mut self) -> Result<&mut S> {
        self.shell
            .as_mut()
            .ok_or_else(|| ChannelError::NotConnected.into())
    }

    /// Tear down the link and its transport together.
    ///
    /// Safe when never connected or already torn down; failure paths
    /// call this unconditionally.
    pub async fn disconnect(&mut self) {
        if let Some(mut shell) = self.shell.take() {
            shell.close().await;
            debug!("session disconnected");
        }
    }
}

impl<S: RemoteShell> Default for Session<S> {
    fn default() -> Self {
        Self::detached()
    }
}
