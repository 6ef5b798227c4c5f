use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use super::health::HealthConfig;
use super::port::Port;
use super::strslice::CommandLine;
use crate::codec::{is_false, null_as_default, set_as_map};
use crate::error::{EncodingError, ValidationError};

/// Portable configuration of a container.
///
/// Only host-independent settings belong here; anything tied to the machine
/// the container runs on lives in [`HostConfig`](super::HostConfig).
///
/// Every field is omitted from the JSON when unset. Engines hash the
/// serialized form of image configs to detect identical configurations, so
/// an unset field that leaked out as `""`, `0` or `[]` would change that hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(rename = "Hostname", default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(rename = "Domainname", default, skip_serializing_if = "Option::is_none")]
    pub domainname: Option<String>,

    /// User that commands run as inside the container
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(rename = "AttachStdin", default, skip_serializing_if = "is_false")]
    pub attach_stdin: bool,

    #[serde(rename = "AttachStdout", default, skip_serializing_if = "is_false")]
    pub attach_stdout: bool,

    #[serde(rename = "AttachStderr", default, skip_serializing_if = "is_false")]
    pub attach_stderr: bool,

    #[serde(
        rename = "ExposedPorts",
        default,
        with = "set_as_map",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub exposed_ports: BTreeSet<Port>,

    #[serde(rename = "Tty", default, skip_serializing_if = "is_false")]
    pub tty: bool,

    #[serde(rename = "OpenStdin", default, skip_serializing_if = "is_false")]
    pub open_stdin: bool,

    /// Close stdin after the first attached client disconnects
    #[serde(rename = "StdinOnce", default, skip_serializing_if = "is_false")]
    pub stdin_once: bool,

    /// `KEY=VALUE` entries. Order matters: later entries override earlier ones.
    #[serde(
        rename = "Env",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub env: Vec<String>,

    #[serde(rename = "Cmd", default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<CommandLine>,

    #[serde(rename = "Healthcheck", default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthConfig>,

    /// Command is already escaped (Windows only)
    #[serde(rename = "ArgsEscaped", default, skip_serializing_if = "is_false")]
    pub args_escaped: bool,

    /// Image name as passed by the operator, possibly symbolic
    #[serde(rename = "Image", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(
        rename = "Volumes",
        default,
        with = "set_as_map",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub volumes: BTreeSet<String>,

    #[serde(rename = "WorkingDir", default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(rename = "Entrypoint", default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<CommandLine>,

    #[serde(rename = "NetworkDisabled", default, skip_serializing_if = "is_false")]
    pub network_disabled: bool,

    #[serde(rename = "MacAddress", default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// ONBUILD instructions recorded on the image
    #[serde(
        rename = "OnBuild",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub on_build: Vec<String>,

    #[serde(
        rename = "Labels",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,

    #[serde(rename = "StopSignal", default, skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,

    /// Seconds to wait before killing the container on stop. `Some(0)` is a
    /// real value; `None` leaves it to the engine.
    #[serde(rename = "StopTimeout", default, skip_serializing_if = "Option::is_none")]
    pub stop_timeout: Option<i64>,

    /// Shell used for the shell form of RUN, CMD and ENTRYPOINT
    #[serde(rename = "Shell", default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<Vec<String>>,
}

impl ContainerConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Default::default()
        }
    }

    pub fn with_cmd(mut self, cmd: impl Into<CommandLine>) -> Self {
        self.cmd = Some(cmd.into());
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<CommandLine>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={value}"));
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_exposed_port(mut self, port: Port) -> Self {
        self.exposed_ports.insert(port);
        self
    }

    pub fn with_volume(mut self, path: impl Into<String>) -> Self {
        self.volumes.insert(path.into());
        self
    }

    pub fn with_healthcheck(mut self, healthcheck: HealthConfig) -> Self {
        self.healthcheck = Some(healthcheck);
        self
    }

    pub fn with_stop_timeout(mut self, seconds: i64) -> Self {
        self.stop_timeout = Some(seconds);
        self
    }

    /// Effective value of an environment variable: the last entry wins.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.iter().rev().find_map(|entry| match entry.split_once('=') {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref hc) = self.healthcheck {
            hc.validate()?;
        }

        for entry in &self.env {
            if entry.is_empty() || entry.starts_with('=') {
                return Err(ValidationError::InvalidValue {
                    field: "Env",
                    reason: format!("entry '{entry}' has no variable name"),
                });
            }
        }

        if let Some(ref shell) = self.shell {
            if shell.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "Shell",
                    reason: "shell override must name an executable".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Content digest of the serialized config, `sha256:<hex>`.
    pub fn digest(&self) -> Result<String, EncodingError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("sha256:{}", hex::encode(Sha256::digest(&bytes))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::HealthTest;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_serializes_to_empty_object() {
        let json = serde_json::to_string(&ContainerConfig::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_stop_timeout_zero_differs_from_unset() {
        let unset = ContainerConfig::new("alpine");
        let zero = ContainerConfig::new("alpine").with_stop_timeout(0);

        let unset_json = serde_json::to_value(&unset).unwrap();
        let zero_json = serde_json::to_value(&zero).unwrap();

        assert!(unset_json.get("StopTimeout").is_none());
        assert_eq!(zero_json["StopTimeout"], 0);
        assert_ne!(unset.digest().unwrap(), zero.digest().unwrap());
    }

    #[test]
    fn test_exposed_ports_and_volumes_are_sets() {
        let config = ContainerConfig::new("nginx")
            .with_exposed_port("80".parse().unwrap())
            .with_exposed_port("80/tcp".parse().unwrap())
            .with_exposed_port("53/udp".parse().unwrap())
            .with_volume("/data")
            .with_volume("/data");

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json["ExposedPorts"],
            serde_json::json!({"53/udp": {}, "80/tcp": {}})
        );
        assert_eq!(json["Volumes"], serde_json::json!({"/data": {}}));

        let back: ContainerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_shell_cmd_goes_out_as_list() {
        let config = ContainerConfig::new("alpine")
            .with_cmd("echo hi")
            .with_entrypoint(CommandLine::shell("/entrypoint.sh"));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["Cmd"], serde_json::json!(["echo hi"]));
        assert_eq!(json["Entrypoint"], serde_json::json!(["/entrypoint.sh"]));
    }

    #[test]
    fn test_env_order_is_preserved() {
        let config = ContainerConfig::new("alpine")
            .with_env("MODE", "dev")
            .with_env("PATH", "/bin")
            .with_env("MODE", "prod");

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json["Env"],
            serde_json::json!(["MODE=dev", "PATH=/bin", "MODE=prod"])
        );
        assert_eq!(config.env_value("MODE"), Some("prod"));
        assert_eq!(config.env_value("HOME"), None);
    }

    #[test]
    fn test_validate_rejects_bad_healthcheck() {
        let mut config = ContainerConfig::new("alpine");
        config.healthcheck = Some(HealthConfig {
            test: vec!["BOGUS".into()],
            ..Default::default()
        });
        assert!(config.validate().is_err());

        config.healthcheck = Some(HealthConfig::new(HealthTest::Shell("true".into())));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_payload_decodes() {
        let payload = r#"{
            "Hostname": "",
            "Image": "redis:7",
            "Cmd": "redis-server --appendonly yes",
            "Entrypoint": null,
            "Volumes": null,
            "Env": null,
            "OnBuild": null,
            "Labels": null,
            "ExposedPorts": {"6379/tcp": {}},
            "StopTimeout": 10
        }"#;

        let config: ContainerConfig = serde_json::from_str(payload).unwrap();
        assert_eq!(config.hostname.as_deref(), Some(""));
        assert!(config.cmd.as_ref().unwrap().is_shell());
        assert!(config.entrypoint.is_none());
        assert!(config.volumes.is_empty());
        assert!(config.env.is_empty());
        assert!(config.on_build.is_empty());
        assert!(config.labels.is_empty());
        assert_eq!(config.stop_timeout, Some(10));
    }
}
