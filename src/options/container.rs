use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;

use super::{Body, Operation, engine_timestamp, require};
use crate::container::{
    ContainerCommitConfig, ContainerConfig, ContainerCreateConfig, ExecConfig, UpdateConfig,
    validate_container_name,
};
use crate::detach::DetachKeys;
use crate::error::{EncodingError, ValidationError};
use crate::filters::{Filters, serialize_filters};

use super::reference::ImageReference;

/// `GET /containers/json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<bool>,
    /// Only containers created after this one (ID or name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for ContainerListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/containers/json".to_string())
    }
}

/// `POST /containers/create`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerCreateOptions {
    #[serde(skip)]
    pub create: ContainerCreateConfig,
}

impl ContainerCreateOptions {
    pub fn new(create: ContainerCreateConfig) -> Self {
        Self { create }
    }
}

impl Operation for ContainerCreateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container create";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/containers/create".to_string())
    }

    fn query(&self) -> Result<Vec<(String, String)>, EncodingError> {
        Ok(self
            .create
            .name
            .iter()
            .map(|name| ("name".to_string(), name.clone()))
            .collect())
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.create.body())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.create.validate()
    }
}

/// `GET /containers/{id}/json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerInspectOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<bool>,
}

impl Operation for ContainerInspectOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container inspect";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/json", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/start`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerStartOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
    #[serde(rename = "checkpoint-dir", skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<String>,
}

impl Operation for ContainerStartOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container start";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/start", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/stop`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerStopOptions {
    #[serde(skip)]
    pub id: String,
    /// Seconds to wait before killing the container
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(rename = "detachKeys", skip_serializing_if = "Option::is_none")]
    pub detach_keys: Option<DetachKeys>,
}

impl Operation for ContainerStopOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container stop";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/stop", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/kill`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerKillOptions {
    #[serde(skip)]
    pub id: String,
    /// Signal name or number. The engine sends SIGKILL when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

impl Operation for ContainerKillOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container kill";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/kill", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/restart`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerRestartOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

impl Operation for ContainerRestartOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container restart";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/restart", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/pause`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerPauseOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for ContainerPauseOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container pause";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/pause", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/unpause`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerUnpauseOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for ContainerUnpauseOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container unpause";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/unpause", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/rename`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerRenameOptions {
    #[serde(skip)]
    pub id: String,
    pub name: String,
}

impl Operation for ContainerRenameOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container rename";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/rename", require(Self::NAME, "id", &self.id)?))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "name",
            });
        }
        validate_container_name(&self.name)
    }
}

/// `GET /containers/{id}/top`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerTopOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps_args: Option<String>,
}

impl Operation for ContainerTopOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container top";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/top", require(Self::NAME, "id", &self.id)?))
    }
}

/// TTY resize for a container or an exec instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResizeOptions {
    #[serde(skip)]
    pub id: String,
    /// Resize an exec instance instead of a container
    #[serde(skip)]
    pub exec: bool,
    #[serde(rename = "h", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "w", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl ResizeOptions {
    pub fn container(id: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            id: id.into(),
            exec: false,
            height: Some(height),
            width: Some(width),
        }
    }

    pub fn exec(id: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            exec: true,
            ..Self::container(id, height, width)
        }
    }
}

impl Operation for ResizeOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "resize";

    fn path(&self) -> Result<String, ValidationError> {
        let id = require(Self::NAME, "id", &self.id)?;
        if self.exec {
            Ok(format!("/exec/{id}/resize"))
        } else {
            Ok(format!("/containers/{id}/resize"))
        }
    }
}

/// `DELETE /containers/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerRemoveOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    pub remove_volumes: Option<bool>,
    #[serde(rename = "link", skip_serializing_if = "Option::is_none")]
    pub remove_links: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl Operation for ContainerRemoveOptions {
    const METHOD: Method = Method::DELETE;
    const NAME: &'static str = "container remove";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}", require(Self::NAME, "id", &self.id)?))
    }
}

/// `GET /containers/{id}/export`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerExportOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for ContainerExportOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container export";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/export", require(Self::NAME, "id", &self.id)?))
    }
}

/// `GET /containers/{id}/logs`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerLogsOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<bool>,
    /// Number of lines from the end, or `all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<bool>,
}

impl ContainerLogsOptions {
    pub fn since_time(mut self, time: DateTime<Utc>) -> Self {
        self.since = Some(engine_timestamp(time));
        self
    }
}

impl Operation for ContainerLogsOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container logs";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/logs", require(Self::NAME, "id", &self.id)?))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.stdout != Some(true) && self.stderr != Some(true) {
            return Err(ValidationError::InvalidValue {
                field: "stdout",
                reason: "at least one of stdout or stderr must be requested".to_string(),
            });
        }
        Ok(())
    }
}

/// `GET /containers/{id}/stats`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerStatsOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl Operation for ContainerStatsOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "container stats";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/stats", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/attach`. The response is a hijacked stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerAttachOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<bool>,
    #[serde(rename = "detachKeys", skip_serializing_if = "Option::is_none")]
    pub detach_keys: Option<DetachKeys>,
}

impl Operation for ContainerAttachOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container attach";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/attach", require(Self::NAME, "id", &self.id)?))
    }

    fn headers(&self) -> Result<Vec<super::Header>, EncodingError> {
        Ok(vec![
            super::Header::new("Connection", "Upgrade"),
            super::Header::new("Upgrade", "tcp"),
        ])
    }
}

/// `POST /containers/{id}/update`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerUpdateOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub update: UpdateConfig,
}

impl Operation for ContainerUpdateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container update";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/update", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.update)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref policy) = self.update.restart_policy {
            policy.validate()?;
        }
        self.update.resources.validate()
    }
}

/// `POST /commit`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerCommitOptions {
    /// Container to commit, sent as a query parameter
    pub container: String,
    #[serde(flatten)]
    pub commit: ContainerCommitConfig,
}

impl ContainerCommitOptions {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            commit: ContainerCommitConfig::default(),
        }
    }

    /// Sets `repo` and `tag` from a reference such as `app:v2`.
    pub fn with_reference(mut self, reference: &ImageReference) -> Self {
        self.commit.repo = Some(reference.repository.clone());
        self.commit.tag = reference.tag.clone();
        self
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.commit.config = Some(config);
        self
    }
}

impl Operation for ContainerCommitOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "container commit";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/commit".to_string())
    }

    fn body(&self) -> Result<Body, EncodingError> {
        match self.commit.config {
            Some(ref config) => Body::json(config),
            None => Ok(Body::Empty),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.container.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "container",
            });
        }
        self.commit.validate()
    }
}

/// `POST /containers/{id}/exec`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecCreateOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub config: ExecConfig,
}

impl Operation for ExecCreateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "exec create";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/exec", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.config)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.config.validate()
    }
}

/// Body of exec start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecStartCheck {
    #[serde(rename = "Detach")]
    pub detach: bool,
    #[serde(rename = "Tty")]
    pub tty: bool,
}

/// `POST /exec/{id}/start`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecStartOptions {
    /// Exec instance ID returned by exec create
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub check: ExecStartCheck,
}

impl Operation for ExecStartOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "exec start";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/exec/{}/start", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.check)
    }
}

/// `GET /exec/{id}/json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecInspectOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for ExecInspectOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "exec inspect";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/exec/{}/json", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /containers/{id}/checkpoints`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckpointCreateOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub checkpoint_id: String,
    /// Stop the container after checkpointing
    #[serde(skip)]
    pub exit: bool,
}

#[derive(Serialize)]
struct CheckpointBody<'a> {
    #[serde(rename = "CheckpointID")]
    checkpoint_id: &'a str,
    #[serde(rename = "Exit")]
    exit: bool,
}

impl Operation for CheckpointCreateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "checkpoint create";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/checkpoints", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&CheckpointBody {
            checkpoint_id: &self.checkpoint_id,
            exit: self.exit,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.checkpoint_id.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "CheckpointID",
            });
        }
        Ok(())
    }
}

/// `PUT /containers/{id}/archive`. The body is a tar archive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyToContainerOptions {
    #[serde(skip)]
    pub id: String,
    /// Directory in the container to extract into
    pub path: String,
    #[serde(rename = "noOverwriteDirNonDir", skip_serializing_if = "Option::is_none")]
    pub no_overwrite_dir_non_dir: Option<bool>,
    #[serde(skip)]
    pub archive: Bytes,
}

impl CopyToContainerOptions {
    pub fn new(id: impl Into<String>, path: impl Into<String>, archive: Bytes) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            no_overwrite_dir_non_dir: None,
            archive,
        }
    }

    /// Allow an existing directory to be replaced by a file and vice versa.
    pub fn allow_overwrite_dir_with_file(mut self, allow: bool) -> Self {
        self.no_overwrite_dir_non_dir = Some(!allow);
        self
    }
}

impl Operation for CopyToContainerOptions {
    const METHOD: Method = Method::PUT;
    const NAME: &'static str = "copy to container";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/containers/{}/archive", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Ok(Body::Raw(self.archive.clone()))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.path.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "path",
            });
        }
        Ok(())
    }
}
