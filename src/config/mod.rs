//! Configuration management for ssh-fleet
//!
//! Handles:
//! - The persisted host table (`config.json`)
//! - Runtime settings resolved from the command line

mod host;
mod settings;
mod store;

pub use host::{HostEntry, HostList};
pub use settings::{Settings, DEFAULT_CONFIG_FILE, DEFAULT_PORT, DEFAULT_USER};
pub use store::ConfigStore;
