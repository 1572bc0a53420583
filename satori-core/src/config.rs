//! Client configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.satori/            (mode 0700)
//!   config.yaml         (mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Port the blob server listens on unless configured otherwise.
pub const DEFAULT_BLOBS_PORT: u16 = 38889;

/// Connection settings for the remote service. Read-only to the entity
/// model and the blob client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    #[serde(default = "default_blobs_port")]
    pub blobs_port: u16,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
    /// Session token sent as the `satori_token` cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            blobs_port: DEFAULT_BLOBS_PORT,
            use_ssl: default_use_ssl(),
            token: None,
        }
    }
}

impl ClientConfig {
    /// `http[s]://<host>:<blobs_port>`
    pub fn blob_base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.blobs_port)
    }

    /// Reject configs the client cannot connect with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.host.contains('/') || self.host.contains("://") {
            return Err(ConfigError::Invalid(format!(
                "host '{}' must be a bare host name, without scheme or path",
                self.host
            )));
        }
        if self.blobs_port == 0 {
            return Err(ConfigError::Invalid("blobs_port must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn default_blobs_port() -> u16 {
    DEFAULT_BLOBS_PORT
}

fn default_use_ssl() -> bool {
    true
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.satori/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".satori").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.satori/config.yaml`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<ClientConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    let config: ClientConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ClientConfig, ConfigError> {
    load_at(&home()?)
}

/// Like [`load_at`], but a missing file yields [`ClientConfig::default`].
pub fn load_or_default_at(home: &Path) -> Result<ClientConfig, ConfigError> {
    match load_at(home) {
        Err(ConfigError::ConfigNotFound { .. }) => Ok(ClientConfig::default()),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config to `<home>/.satori/config.yaml`.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &ClientConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    #[test]
    fn config_path_is_correct() {
        let home = make_home();
        let path = config_path_at(home.path());
        assert!(path.ends_with(".satori/config.yaml"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = make_home();
        let config = ClientConfig {
            host: "satori.example.org".to_string(),
            blobs_port: 4443,
            use_ssl: true,
            token: Some("tok".to_string()),
        };
        save_at(home.path(), &config).expect("save");
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn save_creates_dir_with_perms() {
        let home = make_home();
        save_at(home.path(), &ClientConfig::default()).expect("save");
        let dir = home.path().join(".satori");
        assert!(dir.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700);
            let file_mode = std::fs::metadata(config_path_at(home.path()))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(file_mode, 0o600);
        }
    }

    #[test]
    fn load_missing_returns_not_found() {
        let home = make_home();
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_or_default_when_missing() {
        let home = make_home();
        let config = load_or_default_at(home.path()).expect("default");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let home = make_home();
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "host: judge.local\n").unwrap();
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded.blobs_port, DEFAULT_BLOBS_PORT);
        assert!(loaded.use_ssl);
        assert!(loaded.token.is_none());
    }

    #[test]
    fn blob_base_url_follows_ssl_flag() {
        let mut config = ClientConfig {
            host: "h".to_string(),
            blobs_port: 81,
            use_ssl: false,
            token: None,
        };
        assert_eq!(config.blob_base_url(), "http://h:81");
        config.use_ssl = true;
        assert_eq!(config.blob_base_url(), "https://h:81");
    }

    #[test]
    fn validate_rejects_scheme_in_host() {
        let config = ClientConfig {
            host: "https://h".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
