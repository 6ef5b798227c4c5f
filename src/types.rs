//! Response bodies returned by the engine.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Body of every API error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Sent with status 400. Same shape as [`ErrorResponse`].
pub type BadParameterError = ErrorResponse;
/// Sent with status 500. Same shape as [`ErrorResponse`].
pub type InternalServerError = ErrorResponse;

impl ErrorResponse {
    /// Maps an error body and its HTTP status to a transport error. A 401
    /// becomes [`TransportError::Unauthorized`] so callers can retry with a
    /// fresh registry credential.
    pub fn into_transport_error(self, status: u16) -> TransportError {
        match status {
            401 => TransportError::Unauthorized {
                message: self.message,
            },
            _ => TransportError::Status {
                status,
                message: self.message,
            },
        }
    }
}

/// Version details of one side of the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "ApiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(rename = "MinAPIVersion", default, skip_serializing_if = "Option::is_none")]
    pub min_api_version: Option<String>,
    #[serde(rename = "GitCommit", default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(rename = "GoVersion", default, skip_serializing_if = "Option::is_none")]
    pub go_version: Option<String>,
    #[serde(rename = "Os", default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(rename = "Arch", default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(rename = "KernelVersion", default, skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,
    #[serde(rename = "Experimental", default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<bool>,
    #[serde(rename = "BuildTime", default, skip_serializing_if = "Option::is_none")]
    pub build_time: Option<String>,
}

/// Client and server versions. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    #[serde(rename = "Client", default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Version>,
    #[serde(rename = "Server", default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Version>,
}

impl VersionResponse {
    /// True when the server answered and its version record was parsed.
    pub fn server_ok(&self) -> bool {
        self.server.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCreateResponse {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Warnings", default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerUpdateResponse {
    #[serde(rename = "Warnings", default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTopResponse {
    #[serde(rename = "Titles", default)]
    pub titles: Vec<String>,
    #[serde(rename = "Processes", default)]
    pub processes: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCommitResponse {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecCreateResponse {
    #[serde(rename = "Id")]
    pub id: String,
}

/// State of an exec instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerExecInspect {
    #[serde(rename = "ID")]
    pub exec_id: String,
    #[serde(rename = "ContainerID")]
    pub container_id: String,
    #[serde(rename = "Running", default)]
    pub running: bool,
    #[serde(rename = "ExitCode", default)]
    pub exit_code: Option<i64>,
    #[serde(rename = "Pid", default)]
    pub pid: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCreateResponse {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Warnings", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub is_automated: bool,
}

/// One entry of the image remove response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDeleteResponseItem {
    #[serde(rename = "Untagged", default, skip_serializing_if = "Option::is_none")]
    pub untagged: Option<String>,
    #[serde(rename = "Deleted", default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHistoryItem {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Created", default)]
    pub created: i64,
    #[serde(rename = "CreatedBy", default)]
    pub created_by: String,
    #[serde(rename = "Tags", default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "Size", default)]
    pub size: i64,
    #[serde(rename = "Comment", default)]
    pub comment: String,
}

/// Answer of the `/auth` call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "IdentityToken", default, skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("status", &self.status)
            .field(
                "identity_token",
                &self.identity_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// OS type reported in the `OSType` header of a build response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBuildResponse {
    pub os_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_response_server_ok() {
        let client_only: VersionResponse =
            serde_json::from_str(r#"{"Client":{"Version":"1.0","ApiVersion":"1.25"}}"#).unwrap();
        assert!(!client_only.server_ok());

        let both: VersionResponse = serde_json::from_str(
            r#"{"Client":{"Version":"1.0"},"Server":{"Version":"1.13.1","Os":"linux"}}"#,
        )
        .unwrap();
        assert!(both.server_ok());
        assert_eq!(both.server.unwrap().os.as_deref(), Some("linux"));
    }

    #[test]
    fn test_error_response_mapping() {
        let body: BadParameterError = serde_json::from_str(r#"{"message":"bad name"}"#).unwrap();
        assert!(matches!(
            body.clone().into_transport_error(400),
            TransportError::Status { status: 400, .. }
        ));
        assert!(body.into_transport_error(401).is_unauthorized());
    }

    #[test]
    fn test_service_create_response_key() {
        let resp: ServiceCreateResponse = serde_json::from_str(r#"{"Id":"svc1"}"#).unwrap();
        assert_eq!(resp.id, "svc1");
    }

    #[test]
    fn test_auth_response_debug_hides_token() {
        let resp = AuthResponse {
            status: "Login Succeeded".into(),
            identity_token: Some("secret-token".into()),
        };
        assert!(!format!("{resp:?}").contains("secret-token"));
    }
}
