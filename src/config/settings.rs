//! Runtime settings shared by every command

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PORT: u16 = 22;

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Location of the host table
    pub config_path: PathBuf,
    /// Directory holding `<host>_private.key` / `<host>_public.key`
    pub key_dir: PathBuf,
    /// Remote login identity used for every host
    pub user: String,
    pub port: u16,
    /// Upper bound for connect, exec and transfer; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            key_dir: PathBuf::from("."),
            user: DEFAULT_USER.to_string(),
            port: DEFAULT_PORT,
            timeout: None,
        }
    }
}
