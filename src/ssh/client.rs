//! SSH client handler and connector

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::{KeyPair, PublicKey};
use secrecy::ExposeSecret;
use tokio::runtime::Runtime;

use crate::config::Settings;
use crate::error::{FleetError, Result};

use super::{with_deadline, Auth, SessionFactory, SshSession};

/// SSH client handler
pub struct SshClient {
    host: String,
}

impl SshClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl client::Handler for SshClient {
    type Error = russh::Error;

    /// Every server key is accepted (trust on first use, nothing pinned).
    /// This is a known weakness: a man in the middle is not detected.
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::warn!(
            host = %self.host,
            key_type = server_public_key.name(),
            fingerprint = %server_public_key.fingerprint(),
            "accepting unverified host key"
        );
        Ok(true)
    }
}

/// Opens russh sessions on a runtime it owns
pub struct SshConnector {
    runtime: Arc<Runtime>,
    user: String,
    port: u16,
    timeout: Option<Duration>,
}

impl SshConnector {
    pub fn new(settings: &Settings) -> Result<Self> {
        // Multi-threaded so keepalives flow while the operator is typing
        let runtime = Runtime::new()?;

        Ok(Self {
            runtime: Arc::new(runtime),
            user: settings.user.clone(),
            port: settings.port,
            timeout: settings.timeout,
        })
    }
}

impl SessionFactory for SshConnector {
    type Session = SshSession;

    fn connect(&self, host: &str, auth: &Auth<'_>) -> Result<SshSession> {
        // Key problems are reported before touching the network
        let key = match auth {
            Auth::KeyFile(path) => Some(load_key(path)?),
            Auth::Password(_) => None,
        };

        tracing::info!(host, port = self.port, user = %self.user, auth = auth.describe(), "connecting");

        let handle = self.runtime.block_on(with_deadline(
            self.timeout,
            open(host, self.port, &self.user, auth, key),
        ))?;

        tracing::info!(host, "authenticated");
        Ok(SshSession::new(
            host,
            Arc::clone(&self.runtime),
            handle,
            self.timeout,
        ))
    }
}

fn load_key(path: &Path) -> Result<KeyPair> {
    if !path.is_file() {
        return Err(FleetError::KeyMissing(path.display().to_string()));
    }
    russh_keys::load_secret_key(path, None).map_err(|e| FleetError::InvalidKey {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Connect and authenticate, exactly one attempt
async fn open(
    host: &str,
    port: u16,
    user: &str,
    auth: &Auth<'_>,
    key: Option<KeyPair>,
) -> Result<client::Handle<SshClient>> {
    let config = client::Config {
        keepalive_interval: Some(Duration::from_secs(30)),
        keepalive_max: 3,
        ..Default::default()
    };

    let mut session = client::connect(Arc::new(config), (host, port), SshClient::new(host))
        .await
        .map_err(|e| FleetError::TransportError(format!("{}:{}: {}", host, port, e)))?;

    let authenticated = match (auth, key) {
        (Auth::Password(secret), _) => {
            session
                .authenticate_password(user, secret.expose_secret().as_str())
                .await
        }
        (Auth::KeyFile(_), Some(key)) => session.authenticate_publickey(user, Arc::new(key)).await,
        (Auth::KeyFile(path), None) => {
            return Err(FleetError::KeyMissing(path.display().to_string()));
        }
    }
    .map_err(|e| FleetError::TransportError(e.to_string()))?;

    if !authenticated {
        return Err(FleetError::AuthFailed(host.to_string()));
    }

    Ok(session)
}
