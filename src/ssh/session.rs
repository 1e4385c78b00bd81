//! A russh session bound to one host

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tokio::runtime::Runtime;

use crate::error::{FleetError, Result};

use super::{transfer, with_deadline, CommandOutput, RemoteSession, SshClient};

/// Authenticated transport to a single host.
///
/// Every operation blocks the calling thread until the remote side
/// finishes or the configured timeout fires.
pub struct SshSession {
    host: String,
    runtime: Arc<Runtime>,
    handle: client::Handle<SshClient>,
    timeout: Option<Duration>,
}

impl SshSession {
    pub(super) fn new(
        host: &str,
        runtime: Arc<Runtime>,
        handle: client::Handle<SshClient>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            host: host.to_string(),
            runtime,
            handle,
            timeout,
        }
    }
}

impl RemoteSession for SshSession {
    fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        tracing::debug!(host = %self.host, command, "exec");
        let output = self
            .runtime
            .block_on(with_deadline(self.timeout, run_command(&self.handle, command)))?;
        tracing::debug!(
            host = %self.host,
            exit_status = ?output.exit_status,
            stdout = output.stdout.len(),
            stderr = output.stderr.len(),
            "exec finished"
        );
        Ok(output)
    }

    fn download(&mut self, remote: &str, local: &Path) -> Result<u64> {
        tracing::debug!(host = %self.host, remote, local = %local.display(), "download");
        let bytes = self.runtime.block_on(with_deadline(
            self.timeout,
            transfer::download(&self.handle, remote, local),
        ))?;
        tracing::debug!(host = %self.host, remote, bytes, "download finished");
        Ok(bytes)
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64> {
        tracing::debug!(host = %self.host, local = %local.display(), remote, "upload");
        let bytes = self.runtime.block_on(with_deadline(
            self.timeout,
            transfer::upload(&self.handle, local, remote),
        ))?;
        tracing::debug!(host = %self.host, remote, bytes, "upload finished");
        Ok(bytes)
    }

    fn close(self) {
        let disconnected = self.runtime.block_on(async {
            self.handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await
        });
        if let Err(e) = disconnected {
            tracing::debug!(host = %self.host, error = %e, "disconnect was not clean");
        }
        tracing::info!(host = %self.host, "session closed");
    }
}

/// Run one command on a fresh channel and drain both streams
async fn run_command(handle: &client::Handle<SshClient>, command: &str) -> Result<CommandOutput> {
    let mut channel: Channel<Msg> = handle
        .channel_open_session()
        .await
        .map_err(|e| FleetError::TransportError(e.to_string()))?;

    channel
        .exec(true, command)
        .await
        .map_err(|e| FleetError::TransportError(e.to_string()))?;

    let mut output = CommandOutput::default();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => output.stdout.extend_from_slice(&data),
            // ext 1 is SSH_EXTENDED_DATA_STDERR
            ChannelMsg::ExtendedData { data, ext: 1 } => output.stderr.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
            ChannelMsg::Close => break,
            _ => {}
        }
    }

    Ok(output)
}
