//! Service configuration

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration required to reach the DBMS
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// DBMS account name
    pub dbms_user: String,

    /// DBMS account password
    pub dbms_pass: String,

    /// Connect timeout (seconds)
    pub connect_timeout_s: u64,

    /// Write timeout (seconds)
    pub write_timeout_s: u64,

    /// Read timeout (seconds)
    pub read_timeout_s: u64,

    /// Path to the DBMS public key (PEM, "PUBLIC KEY" block)
    pub dbms_public_key: PathBuf,
}

impl ServiceConfig {
    /// Load configuration from the layered default sources: an optional
    /// `statewatch` file in the working directory, then `STATEWATCH_`-prefixed
    /// environment variables. Environment values override the file.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("statewatch").required(false))
            .add_source(Environment::with_prefix("STATEWATCH").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_toml_file() {
        let path = std::env::temp_dir().join("statewatch-config-test.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "dbms_user = \"svc1\"\n\
             dbms_pass = \"secret\"\n\
             connect_timeout_s = 30\n\
             write_timeout_s = 10\n\
             read_timeout_s = 10\n\
             dbms_public_key = \"/etc/statewatch/dbms.pem\""
        )
        .unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.dbms_user, "svc1");
        assert_eq!(config.dbms_pass, "secret");
        assert_eq!(config.connect_timeout_s, 30);
        assert_eq!(config.write_timeout_s, 10);
        assert_eq!(config.read_timeout_s, 10);
        assert_eq!(
            config.dbms_public_key,
            PathBuf::from("/etc/statewatch/dbms.pem")
        );

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_field_is_an_error() {
        let path = std::env::temp_dir().join("statewatch-config-partial.toml");
        std::fs::write(&path, "dbms_user = \"svc1\"\n").unwrap();

        assert!(ServiceConfig::from_file(&path).is_err());

        std::fs::remove_file(&path).ok();
    }
}
