//! SFTP file transfer
//!
//! Each transfer opens its own `sftp` subsystem channel and drops it on
//! return, on success and failure alike. Transfers are whole-file and not
//! resumable; an interrupted copy leaves a partial destination file.

use std::io::ErrorKind;
use std::path::Path;

use russh::client;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{OpenFlags, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{FleetError, Result};

use super::SshClient;

/// Copy `remote` into `local`.
///
/// The remote file is opened before the local one is created, so a
/// missing source never clobbers an existing destination.
pub(super) async fn download(
    handle: &client::Handle<SshClient>,
    remote: &str,
    local: &Path,
) -> Result<u64> {
    let sftp = open_sftp(handle).await?;

    let mut source = sftp
        .open(remote)
        .await
        .map_err(|e| remote_error(remote, e))?;

    let mut target = File::create(local)
        .await
        .map_err(|e| local_error(local, e))?;

    let bytes = tokio::io::copy(&mut source, &mut target)
        .await
        .map_err(|e| FleetError::TransferError(format!("{}: {}", remote, e)))?;
    target.flush().await.map_err(|e| local_error(local, e))?;

    Ok(bytes)
}

/// Copy `local` to `remote`, creating or truncating the remote file
pub(super) async fn upload(
    handle: &client::Handle<SshClient>,
    local: &Path,
    remote: &str,
) -> Result<u64> {
    let mut source = open_local_source(local).await?;
    let sftp = open_sftp(handle).await?;

    let mut target = sftp
        .open_with_flags(
            remote,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
        )
        .await
        .map_err(|e| FleetError::TransferError(format!("{}: {}", remote, e)))?;

    let bytes = tokio::io::copy(&mut source, &mut target)
        .await
        .map_err(|e| FleetError::TransferError(format!("{}: {}", remote, e)))?;
    target
        .flush()
        .await
        .map_err(|e| FleetError::TransferError(format!("{}: {}", remote, e)))?;
    target
        .shutdown()
        .await
        .map_err(|e| FleetError::TransferError(format!("{}: {}", remote, e)))?;

    Ok(bytes)
}

async fn open_sftp(handle: &client::Handle<SshClient>) -> Result<SftpSession> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| FleetError::TransportError(e.to_string()))?;

    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| FleetError::TransferError(format!("sftp subsystem unavailable: {}", e)))?;

    SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| FleetError::TransferError(format!("sftp handshake failed: {}", e)))
}

async fn open_local_source(local: &Path) -> Result<File> {
    File::open(local).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => FleetError::LocalNotFound(local.display().to_string()),
        _ => local_error(local, e),
    })
}

fn remote_error(remote: &str, e: SftpError) -> FleetError {
    match e {
        SftpError::Status(status) if matches!(status.status_code, StatusCode::NoSuchFile) => {
            FleetError::RemoteNotFound(remote.to_string())
        }
        other => FleetError::TransferError(format!("{}: {}", remote, other)),
    }
}

fn local_error(local: &Path, e: std::io::Error) -> FleetError {
    FleetError::TransferError(format!("{}: {}", local.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use russh_sftp::protocol::Status;

    fn status(code: StatusCode) -> SftpError {
        SftpError::Status(Status {
            id: 1,
            status_code: code,
            error_message: String::new(),
            language_tag: "en".to_string(),
        })
    }

    #[test]
    fn test_no_such_file_is_remote_not_found() {
        let err = remote_error("/nope", status(StatusCode::NoSuchFile));
        assert!(matches!(err, FleetError::RemoteNotFound(ref p) if p == "/nope"));
        assert_eq!(err.to_string(), "Remote file not found: /nope");
    }

    #[test]
    fn test_other_remote_status_is_transfer_error() {
        let err = remote_error("/root/secret", status(StatusCode::PermissionDenied));
        assert!(matches!(err, FleetError::TransferError(ref m) if m.starts_with("/root/secret: ")));
    }

    #[tokio::test]
    async fn test_missing_upload_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("local.txt");

        let result = open_local_source(&missing).await;
        assert!(matches!(result, Err(FleetError::LocalNotFound(p)) if p.ends_with("local.txt")));
    }

    #[tokio::test]
    async fn test_existing_upload_source_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.txt");
        std::fs::write(&path, b"payload").unwrap();

        assert!(open_local_source(&path).await.is_ok());
    }
}
