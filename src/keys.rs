//! Per-host RSA key material
//!
//! Every host owns at most one keypair, stored in the key directory as
//! `<host>_private.key` (OpenSSH PEM) and `<host>_public.key`
//! (`ssh-rsa <base64>` on a single line).

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use ssh_key::private::{KeypairData, RsaKeypair};
use ssh_key::{HashAlg, LineEnding, PrivateKey};

use crate::error::{FleetError, Result};

/// RSA modulus size for generated keys
pub const RSA_BITS: usize = 2048;

const PRIVATE_SUFFIX: &str = "_private.key";
const PUBLIC_SUFFIX: &str = "_public.key";

/// Locations of one host's key files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
}

impl KeyPair {
    /// Read the public key line
    pub fn read_public_key(&self) -> Result<String> {
        let content = fs::read_to_string(&self.public_key_path)?;
        Ok(content.trim().to_string())
    }
}

/// Generates and finds keypairs inside one directory
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Conventional key file locations for a host
    pub fn paths(&self, host: &str) -> Result<KeyPair> {
        validate_host(host)?;
        Ok(KeyPair {
            private_key_path: self.dir.join(format!("{}{}", host, PRIVATE_SUFFIX)),
            public_key_path: self.dir.join(format!("{}{}", host, PUBLIC_SUFFIX)),
        })
    }

    /// Generate a keypair unless either file already exists for this host
    pub fn generate(&self, host: &str) -> Result<KeyPair> {
        let pair = self.paths(host)?;

        if pair.private_key_path.exists() || pair.public_key_path.exists() {
            return Err(FleetError::KeyAlreadyExists(host.to_string()));
        }

        tracing::info!(host, bits = RSA_BITS, "generating RSA key pair");

        let rsa = RsaKeypair::random(&mut OsRng, RSA_BITS)
            .map_err(|e| FleetError::KeyGenerationFailed(e.to_string()))?;
        let private_key = PrivateKey::new(KeypairData::Rsa(rsa), "")
            .map_err(|e| FleetError::KeyGenerationFailed(e.to_string()))?;

        let private_pem = private_key
            .to_openssh(LineEnding::LF)
            .map_err(|e| FleetError::KeyGenerationFailed(e.to_string()))?;
        let public_line = private_key
            .public_key()
            .to_openssh()
            .map_err(|e| FleetError::KeyGenerationFailed(e.to_string()))?;

        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        write_new(&pair.private_key_path, private_pem.as_bytes(), true, host)?;
        write_new(&pair.public_key_path, format!("{}\n", public_line.trim()).as_bytes(), false, host)?;

        tracing::info!(
            host,
            path = %pair.private_key_path.display(),
            fingerprint = %private_key.public_key().fingerprint(HashAlg::Sha256),
            "generated RSA key pair"
        );

        Ok(pair)
    }

    /// Find the private key for a host
    pub fn locate(&self, host: &str) -> Result<KeyPair> {
        let pair = self.paths(host)?;
        if !pair.private_key_path.is_file() {
            return Err(FleetError::KeyMissing(
                pair.private_key_path.display().to_string(),
            ));
        }
        Ok(pair)
    }
}

/// Host identifiers become file-name stems
fn validate_host(host: &str) -> Result<()> {
    let unusable = host.is_empty()
        || host.trim() != host
        || host.contains(['/', '\\', '\0'])
        || host.contains("..");
    if unusable {
        return Err(FleetError::InvalidHost(host.to_string()));
    }
    Ok(())
}

/// Create a file that must not exist yet
fn write_new(path: &Path, content: &[u8], private: bool, host: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => FleetError::KeyAlreadyExists(host.to_string()),
        _ => FleetError::Io(e),
    })?;
    file.write_all(content)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_naming_convention() {
        let store = KeyStore::new("/keys");
        let pair = store.paths("10.0.0.5").unwrap();
        assert_eq!(pair.private_key_path, PathBuf::from("/keys/10.0.0.5_private.key"));
        assert_eq!(pair.public_key_path, PathBuf::from("/keys/10.0.0.5_public.key"));
    }

    #[test]
    fn test_rejects_hosts_that_escape_the_key_dir() {
        let store = KeyStore::new(".");
        for host in ["", "../etc", "a/b", "a\\b", " padded"] {
            assert!(matches!(store.paths(host), Err(FleetError::InvalidHost(_))), "{:?}", host);
        }
    }

    #[test]
    fn test_locate_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path());
        assert!(matches!(store.locate("10.0.0.5"), Err(FleetError::KeyMissing(_))));
    }

    #[test]
    fn test_generate_writes_both_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path());

        let pair = store.generate("10.0.0.5").unwrap();
        let private_before = fs::read(&pair.private_key_path).unwrap();
        let public_before = pair.read_public_key().unwrap();

        assert!(String::from_utf8_lossy(&private_before).contains("BEGIN OPENSSH PRIVATE KEY"));
        assert!(public_before.starts_with("ssh-rsa "));
        assert_eq!(public_before.lines().count(), 1);
        assert_eq!(store.locate("10.0.0.5").unwrap(), pair);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&pair.private_key_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(matches!(store.generate("10.0.0.5"), Err(FleetError::KeyAlreadyExists(_))));
        assert_eq!(fs::read(&pair.private_key_path).unwrap(), private_before);
        assert_eq!(pair.read_public_key().unwrap(), public_before);
    }

    #[test]
    fn test_either_file_blocks_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path());
        let pair = store.paths("10.0.0.7").unwrap();
        fs::write(&pair.public_key_path, "ssh-rsa AAAA\n").unwrap();

        assert!(matches!(store.generate("10.0.0.7"), Err(FleetError::KeyAlreadyExists(_))));
        assert!(!pair.private_key_path.exists());
        assert_eq!(fs::read_to_string(&pair.public_key_path).unwrap(), "ssh-rsa AAAA\n");
    }
}
