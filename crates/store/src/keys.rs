//! DBMS public key validation and registry
//!
//! The transport layer skips certificate verification and pins trust to a
//! server public key instead. The key is validated in stages at bootstrap and
//! registered under a fixed logical name that the connection target refers to.

use rsa::pkcs8::der::{self, Decode};
use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::RsaPublicKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Logical name the validated DBMS key is registered under
pub const SERVER_KEY_NAME: &str = "dbms-pub-key";

/// PEM block tag required for the DBMS key file
const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// Key validation errors, one per validation stage
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read
    #[error("unable to read dbms public key file {path:?}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file holds no PEM block, or the block is not typed "PUBLIC KEY"
    #[error("dbms public key file does not hold a PEM \"PUBLIC KEY\" block")]
    Format,

    /// The block's bytes are not a parseable SubjectPublicKeyInfo structure
    #[error("unable to parse dbms public key")]
    Parse(#[source] der::Error),

    /// The parsed key is not an RSA public key
    #[error("dbms public key is not an rsa public key")]
    Type,
}

/// Read and validate the DBMS public key from a PEM file.
///
/// Stages: read the file, decode the PEM block and check its tag, parse the
/// SubjectPublicKeyInfo structure, and require an RSA public key. Each stage
/// fails with its own [`KeyError`] variant.
pub fn load_server_public_key(path: &Path) -> Result<RsaPublicKey, KeyError> {
    let bytes = std::fs::read(path).map_err(|source| KeyError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let block = pem::parse(&bytes).map_err(|_| KeyError::Format)?;
    if block.tag() != PUBLIC_KEY_TAG {
        return Err(KeyError::Format);
    }

    let info = SubjectPublicKeyInfoRef::from_der(block.contents()).map_err(KeyError::Parse)?;

    RsaPublicKey::try_from(info).map_err(|_| KeyError::Type)
}

/// Registry of validated server public keys, keyed by logical name.
///
/// Built once at bootstrap and handed to the connection layer; the connection
/// target refers to keys by name only.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: HashMap<String, RsaPublicKey>,
}

impl KeyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validated key under a logical name
    pub fn register(&mut self, name: &str, key: RsaPublicKey) {
        debug!("Registering server public key under name {}", name);
        self.keys.insert(name.to_string(), key);
    }

    /// Look up a registered key
    pub fn get(&self, name: &str) -> Option<&RsaPublicKey> {
        self.keys.get(name)
    }

    /// Whether a key is registered under this name
    pub fn is_registered(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }
}
