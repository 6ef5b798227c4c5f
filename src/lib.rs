//! Wharf - typed request contract for container-engine daemons
//!
//! This crate describes what a client sends to a container engine: container
//! and service configurations, per-operation options, filter expressions,
//! registry credentials and detach keys. Each operation renders into an
//! [`options::ApiRequest`] that any HTTP transport can send.

pub mod codec;
pub mod config;
pub mod container;
pub mod detach;
pub mod error;
pub mod filters;
pub mod hijack;
pub mod monitoring;
pub mod network;
pub mod options;
pub mod registry;
pub mod swarm;
pub mod types;

pub use config::ClientConfig;
pub use error::{Result, WharfError};
pub use options::{ApiRequest, Operation};

/// Re-exports for easier API usage
pub mod api {
    pub use crate::config::{ClientConfig, RegistryEntry};
    pub use crate::container::{
        CommandLine, ContainerCommitConfig, ContainerConfig, ContainerCreateConfig, ExecConfig,
        HealthConfig, HealthTest, HostConfig, Port, Protocol, RestartPolicy,
        validate_container_name,
    };
    pub use crate::detach::{DEFAULT_DETACH_KEYS, DetachKeys, validate_detach_keys};
    pub use crate::error::{
        ConfigError, EncodingError, Result, TransportError, ValidationError, WharfError,
    };
    pub use crate::filters::{Filters, parse_filter_arg};
    pub use crate::hijack::HijackedResponse;
    pub use crate::monitoring::TracingConfig;
    pub use crate::network::{EndpointSettings, NetworkingConfig};
    pub use crate::options::*;
    pub use crate::registry::privilege::{PrivilegeHandle, RequestPrivilege, send_with_privilege_retry};
    pub use crate::registry::{AuthConfig, RegistryAccess, RegistryAuth, RegistryConfigs};
    pub use crate::swarm::{NodeSpec, ObjectVersion, ServiceSpec};
    pub use crate::types::*;
}
