//! SSH sessions: the seam between the operator loop and the transport
//!
//! The fleet loop only sees [`SessionFactory`] and [`RemoteSession`].
//! The russh-backed implementation lives in `client`, `session` and
//! `transfer`.

mod client;
mod session;
mod transfer;

use std::borrow::Cow;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{FleetError, Result};

pub use client::{SshClient, SshConnector};
pub use session::SshSession;

/// How to authenticate against one host
#[derive(Debug)]
pub enum Auth<'a> {
    Password(&'a SecretString),
    KeyFile(PathBuf),
}

impl Auth<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Auth::Password(_) => "password",
            Auth::KeyFile(_) => "key file",
        }
    }
}

/// Opens one authenticated session per call, without retrying
pub trait SessionFactory {
    type Session: RemoteSession;

    fn connect(&self, host: &str, auth: &Auth<'_>) -> Result<Self::Session>;
}

/// An open session bound to a single host
pub trait RemoteSession {
    /// Run a command and collect both output streams
    fn exec(&mut self, command: &str) -> Result<CommandOutput>;

    /// Copy a remote file to a local path, returning the byte count
    fn download(&mut self, remote: &str, local: &Path) -> Result<u64>;

    /// Copy a local file to a remote path, returning the byte count
    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64>;

    /// Tear down the transport
    fn close(self);
}

/// Captured result of a remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    /// Stdout when it has anything, stderr otherwise
    pub fn preferred(&self) -> &[u8] {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    pub fn preferred_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.preferred())
    }
}

/// Bound a remote operation when a limit is configured
pub(crate) async fn with_deadline<T, F>(limit: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| FleetError::Timeout(limit.as_secs()))?,
        None => operation.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_status: Some(0),
        }
    }

    #[test]
    fn test_stdout_wins_over_stderr() {
        assert_eq!(output("hi\n", "warn\n").preferred_text(), "hi\n");
        assert_eq!(output("", "no such file\n").preferred_text(), "no such file\n");
        assert_eq!(output("", "").preferred_text(), "");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let out = CommandOutput {
            stdout: vec![b'o', b'k', 0xff],
            ..Default::default()
        };
        assert_eq!(out.preferred_text(), "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let result: Result<()> = with_deadline(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(FleetError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_no_deadline_passes_through() {
        let result = with_deadline(None, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
