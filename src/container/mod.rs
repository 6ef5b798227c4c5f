use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::codec::is_false;
use crate::detach::DetachKeys;
use crate::error::ValidationError;
use crate::network::NetworkingConfig;

pub mod config;
pub mod health;
pub mod host_config;
pub mod port;
pub mod strslice;

pub use config::ContainerConfig;
pub use health::{HealthConfig, HealthTest};
pub use host_config::{
    DeviceMapping, HostConfig, Isolation, LogConfig, Mount, MountType, PortBinding, Resources,
    RestartPolicy, RestartPolicyMode, Ulimit, UpdateConfig,
};
pub use port::{Port, Protocol};
pub use strslice::CommandLine;

static CONTAINER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?[a-zA-Z0-9][a-zA-Z0-9_.-]+$").expect("container name pattern is valid")
});

/// Checks a container name the way the engine does. A leading `/` is allowed.
pub fn validate_container_name(name: &str) -> Result<(), ValidationError> {
    if CONTAINER_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Everything needed to create a container in one call.
///
/// The name travels in the query string; the three configs are merged into
/// a single JSON body by [`ContainerCreateConfig::body`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerCreateConfig {
    pub name: Option<String>,
    pub config: ContainerConfig,
    pub host_config: Option<HostConfig>,
    pub networking_config: Option<NetworkingConfig>,
}

#[derive(Serialize)]
pub struct ContainerCreateBody<'a> {
    #[serde(flatten)]
    config: &'a ContainerConfig,
    #[serde(rename = "HostConfig", skip_serializing_if = "Option::is_none")]
    host_config: Option<&'a HostConfig>,
    #[serde(rename = "NetworkingConfig", skip_serializing_if = "Option::is_none")]
    networking_config: Option<&'a NetworkingConfig>,
}

impl ContainerCreateConfig {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_host_config(mut self, host_config: HostConfig) -> Self {
        self.host_config = Some(host_config);
        self
    }

    pub fn with_networking_config(mut self, networking_config: NetworkingConfig) -> Self {
        self.networking_config = Some(networking_config);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            validate_container_name(name)?;
        }
        self.config.validate()?;
        if let Some(ref host_config) = self.host_config {
            host_config.validate()?;
        }
        Ok(())
    }

    pub fn body(&self) -> ContainerCreateBody<'_> {
        ContainerCreateBody {
            config: &self.config,
            host_config: self.host_config.as_ref(),
            networking_config: self.networking_config.as_ref(),
        }
    }
}

/// Parameters for turning a container into a new image.
///
/// Everything except `config` is sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCommitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Dockerfile instructions applied to the committed image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<bool>,
    #[serde(skip)]
    pub config: Option<ContainerConfig>,
}

impl ContainerCommitConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tag.is_some() && self.repo.is_none() {
            return Err(ValidationError::InvalidValue {
                field: "tag",
                reason: "a tag requires a repository".to_string(),
            });
        }
        if let Some(ref config) = self.config {
            config.validate()?;
        }
        Ok(())
    }
}

/// Configuration of a process started inside a running container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(rename = "Privileged", default, skip_serializing_if = "is_false")]
    pub privileged: bool,
    #[serde(rename = "Tty", default, skip_serializing_if = "is_false")]
    pub tty: bool,
    #[serde(rename = "AttachStdin", default, skip_serializing_if = "is_false")]
    pub attach_stdin: bool,
    #[serde(rename = "AttachStderr", default, skip_serializing_if = "is_false")]
    pub attach_stderr: bool,
    #[serde(rename = "AttachStdout", default, skip_serializing_if = "is_false")]
    pub attach_stdout: bool,
    #[serde(rename = "Detach", default, skip_serializing_if = "is_false")]
    pub detach: bool,
    #[serde(rename = "DetachKeys", default, skip_serializing_if = "Option::is_none")]
    pub detach_keys: Option<DetachKeys>,
    #[serde(rename = "Env", default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(rename = "WorkingDir", default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(rename = "Cmd")]
    pub cmd: Vec<String>,
}

impl ExecConfig {
    pub fn new<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Attach stdout and stderr, the usual shape for an interactive exec.
    pub fn attached(mut self) -> Self {
        self.attach_stdout = true;
        self.attach_stderr = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cmd.is_empty() {
            return Err(ValidationError::MissingField {
                operation: "exec create",
                field: "Cmd",
            });
        }
        Ok(())
    }
}
