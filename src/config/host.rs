//! Host table structures

use secrecy::{ExposeSecret, SecretString};

/// A single configured host
#[derive(Debug)]
pub struct HostEntry {
    /// Hostname or IP address, unique within the table
    pub host: String,
    /// Password; `None` means key-based authentication
    pub secret: Option<SecretString>,
}

impl HostEntry {
    /// Create an entry for a host that authenticates with a password
    pub fn with_password(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(host, Some(password.into()))
    }

    /// Create an entry for a host that authenticates with a key file
    pub fn key_based(host: impl Into<String>) -> Self {
        Self::new(host, None)
    }

    /// Create an entry; an empty password is the same as no password
    pub fn new(host: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            host: host.into(),
            secret: secret.filter(|s| !s.is_empty()).map(SecretString::new),
        }
    }

    pub fn has_password(&self) -> bool {
        self.secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }
}

/// The ordered host table kept by [`super::ConfigStore`]
#[derive(Debug, Default)]
pub struct HostList {
    entries: Vec<HostEntry>,
}

impl HostList {
    /// Create an empty host table
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a host, or replace the secret of an existing one.
    /// Returns true when the host was not present before.
    pub fn upsert(&mut self, entry: HostEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.host == entry.host) {
            Some(existing) => {
                existing.secret = entry.secret;
                false
            }
            None => {
                self.entries.push(entry);
                true
            }
        }
    }

    /// Get a host by identifier
    pub fn get(&self, host: &str) -> Option<&HostEntry> {
        self.entries.iter().find(|e| e.host == host)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over hosts in file order
    pub fn iter(&self) -> impl Iterator<Item = &HostEntry> {
        self.entries.iter()
    }
}
