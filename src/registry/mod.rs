//! Registry credentials and how they travel in request headers.

use base64::{
    Engine,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EncodingError, ValidationError};

pub mod privilege;

pub use privilege::{PrivilegeFn, PrivilegeHandle, RequestPrivilege, send_with_privilege_retry};

/// Header carrying one encoded credential.
pub const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";
/// Header carrying a map of registry to credential, used by image build.
pub const REGISTRY_CONFIG_HEADER: &str = "X-Registry-Config";
/// Registry used for references that name no host
pub const DEFAULT_REGISTRY: &str = "docker.io";

const REDACTED: &str = "<redacted>";

/// Credentials for one registry. Also the body of the `/auth` call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-encoded `username:password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Deprecated, still accepted by engines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "serveraddress", default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
    #[serde(rename = "identitytoken", default, skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
    #[serde(rename = "registrytoken", default, skip_serializing_if = "Option::is_none")]
    pub registry_token: Option<String>,
}

impl AuthConfig {
    pub fn basic(
        username: impl Into<String>,
        password: impl Into<String>,
        server_address: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            server_address: Some(server_address.into()),
            ..Default::default()
        }
    }

    pub fn identity_token(token: impl Into<String>, server_address: impl Into<String>) -> Self {
        Self {
            identity_token: Some(token.into()),
            server_address: Some(server_address.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_secret = self.password.is_some()
            || self.auth.is_some()
            || self.identity_token.is_some()
            || self.registry_token.is_some();
        if !has_secret {
            return Err(ValidationError::MissingField {
                operation: "registry auth",
                field: "password, auth, identitytoken or registrytoken",
            });
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::MissingField {
                operation: "registry auth",
                field: "username",
            });
        }
        Ok(())
    }

    /// Encodes the credential for the `X-Registry-Auth` header.
    pub fn encode(&self) -> Result<RegistryAuth, EncodingError> {
        let json = serde_json::to_vec(self)?;
        Ok(RegistryAuth(URL_SAFE.encode(json)))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hide = |v: &Option<String>| v.as_ref().map(|_| REDACTED);
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &hide(&self.password))
            .field("auth", &hide(&self.auth))
            .field("email", &self.email)
            .field("server_address", &self.server_address)
            .field("identity_token", &hide(&self.identity_token))
            .field("registry_token", &hide(&self.registry_token))
            .finish()
    }
}

/// A base64 encoded [`AuthConfig`], as sent in `X-Registry-Auth`.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth(String);

impl RegistryAuth {
    /// Wraps an already encoded credential, e.g. one returned by a
    /// credential helper.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<AuthConfig, EncodingError> {
        let bytes = URL_SAFE
            .decode(&self.0)
            .or_else(|_| URL_SAFE_NO_PAD.decode(&self.0))
            .map_err(|e| EncodingError::Unrepresentable {
                field: REGISTRY_AUTH_HEADER.to_string(),
                reason: e.to_string(),
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegistryAuth").field(&REDACTED).finish()
    }
}

/// Credentials for several registries at once, keyed by server address.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryConfigs(pub BTreeMap<String, AuthConfig>);

impl RegistryConfigs {
    pub fn insert(&mut self, registry: impl Into<String>, auth: AuthConfig) {
        self.0.insert(registry.into(), auth);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the map for the `X-Registry-Config` header.
    pub fn encode(&self) -> Result<String, EncodingError> {
        let json = serde_json::to_vec(&self.0)?;
        Ok(URL_SAFE.encode(json))
    }
}

impl fmt::Debug for RegistryConfigs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// How an image call authenticates against a registry: an optional
/// credential, plus an optional way to obtain a new one after the engine
/// rejects it.
#[derive(Debug, Clone, Default)]
pub struct RegistryAccess {
    pub registry_auth: Option<RegistryAuth>,
    pub privilege: Option<PrivilegeHandle>,
}

impl RegistryAccess {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_auth(auth: RegistryAuth) -> Self {
        Self {
            registry_auth: Some(auth),
            privilege: None,
        }
    }

    pub fn with_privilege(mut self, privilege: PrivilegeHandle) -> Self {
        self.privilege = Some(privilege);
        self
    }
}
