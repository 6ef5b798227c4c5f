use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::detach::{DEFAULT_DETACH_KEYS, DetachKeys};
use crate::error::{ConfigError, Result, WharfError};
use crate::monitoring::tracing_setup::TracingConfig;
use crate::registry::{AuthConfig, RegistryConfigs};

pub const DEFAULT_HOST: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_API_VERSION: &str = "1.41";
/// Oldest engine API version the option catalog renders for
pub const MIN_API_VERSION: &str = "1.12";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Client-side settings: where the engine lives and how requests are shaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub attach: AttachConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub registries: BTreeMap<String, RegistryEntry>,
    #[serde(default)]
    pub logging: TracingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachConfig {
    #[serde(default = "default_detach_keys")]
    pub detach_keys: String,
}

/// Stored credentials for one registry, keyed by server address.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_detach_keys() -> String {
    DEFAULT_DETACH_KEYS.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_version: default_api_version(),
        }
    }
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            detach_keys: default_detach_keys(),
        }
    }
}

impl RegistryEntry {
    pub fn to_auth_config(&self, server_address: &str) -> AuthConfig {
        AuthConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            identity_token: self.identity_token.clone(),
            server_address: Some(server_address.to_string()),
            ..Default::default()
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "identity_token",
                &self.identity_token.as_ref().map(|_| "<redacted>"),
            )
            .field("email", &self.email)
            .finish()
    }
}

impl ClientConfig {
    /// `$XDG_CONFIG_HOME/wharf/config.toml`, or `./wharf/config.toml` when
    /// no config directory is known.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wharf")
            .join(CONFIG_FILE_NAME)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => WharfError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => WharfError::Io(e),
        })?;

        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;

        debug!(path = %path.display(), registries = config.registries.len(), "Loaded client config");
        Ok(config)
    }

    /// Loads the file if it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Err(WharfError::Config(ConfigError::FileNotFound { path })) => {
                debug!(%path, "No client config, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat {
            reason: e.to_string(),
        })?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved client config");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_engine()?;

        DetachKeys::parse(&self.attach.detach_keys).map_err(|e| ConfigError::InvalidValue {
            field: "attach.detach_keys".to_string(),
            reason: e.to_string(),
        })?;

        for (server, entry) in &self.registries {
            if server.is_empty() {
                return Err(invalid("registries", "registry address cannot be empty"));
            }
            entry
                .to_auth_config(server)
                .validate()
                .map_err(|e| invalid(&format!("registries.{server}"), &e.to_string()))?;
        }

        self.validate_logging()?;
        Ok(())
    }

    fn validate_engine(&self) -> Result<()> {
        let host = &self.engine.host;
        const SCHEMES: [&str; 5] = ["unix://", "npipe://", "tcp://", "http://", "https://"];
        if !SCHEMES.iter().any(|s| host.starts_with(s)) {
            return Err(invalid(
                "engine.host",
                &format!("'{host}' must start with one of {}", SCHEMES.join(", ")),
            ));
        }

        match parse_api_version(&self.engine.api_version) {
            Some(version) if version >= (1, 12) => Ok(()),
            Some(_) => Err(invalid(
                "engine.api_version",
                &format!("API versions below {MIN_API_VERSION} are not supported"),
            )),
            None => Err(invalid(
                "engine.api_version",
                &format!("'{}' is not of the form MAJOR.MINOR", self.engine.api_version),
            )),
        }
    }

    fn validate_logging(&self) -> Result<()> {
        if tracing_subscriber::EnvFilter::try_new(&self.logging.log_level).is_err() {
            return Err(invalid(
                "logging.log_level",
                &format!("'{}' is not a valid filter directive", self.logging.log_level),
            ));
        }
        if self.logging.enable_file_logging && self.logging.log_file_path.is_empty() {
            return Err(invalid(
                "logging.log_file_path",
                "file logging is enabled but no path is set",
            ));
        }
        Ok(())
    }

    pub fn detach_keys(&self) -> Result<DetachKeys> {
        Ok(DetachKeys::parse(&self.attach.detach_keys)?)
    }

    pub fn auth_for(&self, server_address: &str) -> Option<AuthConfig> {
        self.registries
            .get(server_address)
            .map(|entry| entry.to_auth_config(server_address))
    }

    /// All stored credentials, in the shape sent as `X-Registry-Config`.
    pub fn registry_configs(&self) -> RegistryConfigs {
        let mut configs = RegistryConfigs::default();
        for server in self.registries.keys() {
            if let Some(auth) = self.auth_for(server) {
                configs.insert(server.clone(), auth);
            }
        }
        configs
    }

    /// Commented template written by `wharf config init`.
    pub fn template() -> String {
        format!(
            r#"# wharf client configuration

[engine]
host = "{DEFAULT_HOST}"        # unix://, npipe://, tcp://, http:// or https://
api_version = "{DEFAULT_API_VERSION}"

[attach]
detach_keys = "{DEFAULT_DETACH_KEYS}"          # comma-separated: a-z, ctrl-<key>, ctrl-@, ctrl-[ ...

[logging]
log_level = "info"
enable_json_logs = false
structured_logging = false
enable_file_logging = false
log_file_path = ""

# [registries."registry.example.com"]
# username = "alice"
# password = "secret"
"#
        )
    }
}

fn parse_api_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn invalid(field: &str, reason: &str) -> WharfError {
    WharfError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.engine.host, DEFAULT_HOST);
        assert_eq!(config.attach.detach_keys, "ctrl-p,ctrl-q");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.engine.host = "tcp://10.0.0.5:2375".to_string();
        config.registries.insert(
            "registry.example.com".to_string(),
            RegistryEntry {
                username: Some("alice".into()),
                password: Some("pw".into()),
                ..Default::default()
            },
        );
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nhost = \"tcp://127.0.0.1:2375\"\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.engine.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.attach.detach_keys, DEFAULT_DETACH_KEYS);
    }

    #[test]
    fn test_template_parses() {
        let config: ClientConfig = toml::from_str(&ClientConfig::template()).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            ClientConfig::load(&path),
            Err(WharfError::Config(ConfigError::FileNotFound { .. }))
        ));
        assert_eq!(ClientConfig::load_or_default(&path).unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nhost=").unwrap();
        assert!(matches!(
            ClientConfig::load(&path),
            Err(WharfError::Config(ConfigError::InvalidFormat { .. }))
        ));
    }

    #[test_case("ftp://host" ; "unknown scheme")]
    #[test_case("/var/run/docker.sock" ; "bare path")]
    fn test_rejects_host(host: &str) {
        let mut config = ClientConfig::default();
        config.engine.host = host.to_string();
        assert!(config.validate().is_err());
    }

    #[test_case("1.11" ; "too old")]
    #[test_case("v1.41" ; "prefixed")]
    #[test_case("latest" ; "not a number")]
    fn test_rejects_api_version(version: &str) {
        let mut config = ClientConfig::default();
        config.engine.api_version = version.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_detach_keys() {
        let mut config = ClientConfig::default();
        config.attach.detach_keys = "ctrl-".to_string();
        assert!(matches!(
            config.validate(),
            Err(WharfError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "attach.detach_keys"
        ));
    }

    #[test]
    fn test_registry_configs_carry_server_address() {
        let mut config = ClientConfig::default();
        config.registries.insert(
            "ghcr.io".to_string(),
            RegistryEntry {
                identity_token: Some("tok".into()),
                ..Default::default()
            },
        );

        let auth = config.auth_for("ghcr.io").unwrap();
        assert_eq!(auth.server_address.as_deref(), Some("ghcr.io"));
        assert!(config.auth_for("docker.io").is_none());
        assert!(!config.registry_configs().is_empty());
    }

    #[test]
    fn test_registry_entry_debug_is_redacted() {
        let entry = RegistryEntry {
            username: Some("alice".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let debug = format!("{entry:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice"));
    }
}
