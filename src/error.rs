use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Config file '{path}' is malformed: {reason}")]
    ConfigCorrupt { path: String, reason: String },

    #[error("Authentication failed for {0}; check the host address and password")]
    AuthFailed(String),

    #[error("SSH connection error: {0}")]
    TransportError(String),

    #[error("Key file {0} not found; generate a keypair first")]
    KeyMissing(String),

    #[error("Key pair for {0} already exists, not regenerating")]
    KeyAlreadyExists(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Cannot load private key {path}: {reason}")]
    InvalidKey { path: String, reason: String },

    #[error("Invalid host identifier '{0}'")]
    InvalidHost(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Remote file not found: {0}")]
    RemoteNotFound(String),

    #[error("Local file not found: {0}")]
    LocalNotFound(String),

    #[error("File transfer failed: {0}")]
    TransferError(String),

    #[error("Remote operation timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
