//! ssh-fleet - sequential SSH fleet command runner
//!
//! This crate:
//! - Reads a host/password table from a local JSON file
//! - Opens one SSH session per host, by password or per-host RSA key
//! - Lets the operator run remote commands and move files over SFTP
//! - Generates and stores per-host keypairs on request

pub mod cli;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod fleet;
pub mod keys;
pub mod logging;
pub mod ssh;

pub use error::{FleetError, Result};
