//! Host table persistence
//!
//! The document is a flat JSON object mapping host identifiers to
//! passwords. An empty string or `null` marks a key-based host:
//!
//! ```json
//! {
//!   "10.0.0.5": "secret",
//!   "10.0.0.6": ""
//! }
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FleetError, Result};

use super::{HostEntry, HostList};

/// Loads and saves the host table at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the host table.
    ///
    /// A missing file yields an empty table. So does an unreadable or
    /// malformed one: the problem is logged and never propagated.
    pub fn load(&self) -> HostList {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file absent, starting empty");
            return HostList::new();
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(FleetError::from)
            .and_then(|text| parse_document(&text, &self.path));

        match parsed {
            Ok(hosts) => {
                tracing::info!(path = %self.path.display(), hosts = hosts.len(), "loaded host table");
                hosts
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unusable config file");
                HostList::new()
            }
        }
    }

    /// Overwrite the document with the full host table
    pub fn save(&self, hosts: &HostList) -> Result<()> {
        let mut document = Map::new();
        for entry in hosts.iter() {
            let secret = entry
                .secret
                .as_ref()
                .map(|s| s.expose_secret().clone())
                .unwrap_or_default();
            document.insert(entry.host.clone(), Value::String(secret));
        }

        let json = serde_json::to_string_pretty(&Value::Object(document))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        // The document holds plaintext passwords
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(path = %self.path.display(), hosts = hosts.len(), "saved host table");
        Ok(())
    }
}

fn parse_document(text: &str, path: &Path) -> Result<HostList> {
    let corrupt = |reason: String| FleetError::ConfigCorrupt {
        path: path.display().to_string(),
        reason,
    };

    let document: Map<String, Value> =
        serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;

    let mut hosts = HostList::new();
    for (host, value) in document {
        let secret = Option::<String>::deserialize(value)
            .map_err(|_| corrupt(format!("value for '{}' is not a string", host)))?;
        hosts.upsert(HostEntry::new(host, secret));
    }
    Ok(hosts)
}
