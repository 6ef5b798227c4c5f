use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::port::Port;
use crate::codec::is_false;
use crate::error::ValidationError;

/// Non-portable container settings: everything that depends on the host the
/// container is created on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(rename = "Binds", default, skip_serializing_if = "Vec::is_empty")]
    pub binds: Vec<String>,
    #[serde(rename = "ContainerIDFile", default, skip_serializing_if = "Option::is_none")]
    pub container_id_file: Option<String>,
    #[serde(rename = "LogConfig", default, skip_serializing_if = "Option::is_none")]
    pub log_config: Option<LogConfig>,
    #[serde(rename = "NetworkMode", default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(rename = "PortBindings", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub port_bindings: BTreeMap<Port, Vec<PortBinding>>,
    #[serde(rename = "RestartPolicy", default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
    #[serde(rename = "AutoRemove", default, skip_serializing_if = "is_false")]
    pub auto_remove: bool,
    #[serde(rename = "VolumeDriver", default, skip_serializing_if = "Option::is_none")]
    pub volume_driver: Option<String>,
    #[serde(rename = "VolumesFrom", default, skip_serializing_if = "Vec::is_empty")]
    pub volumes_from: Vec<String>,
    #[serde(rename = "Mounts", default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    #[serde(rename = "CapAdd", default, skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(rename = "CapDrop", default, skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,
    #[serde(rename = "Dns", default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    #[serde(rename = "DnsOptions", default, skip_serializing_if = "Vec::is_empty")]
    pub dns_options: Vec<String>,
    #[serde(rename = "DnsSearch", default, skip_serializing_if = "Vec::is_empty")]
    pub dns_search: Vec<String>,
    #[serde(rename = "ExtraHosts", default, skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,
    #[serde(rename = "GroupAdd", default, skip_serializing_if = "Vec::is_empty")]
    pub group_add: Vec<String>,
    #[serde(rename = "IpcMode", default, skip_serializing_if = "Option::is_none")]
    pub ipc_mode: Option<String>,
    #[serde(rename = "Links", default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(rename = "OomScoreAdj", default, skip_serializing_if = "Option::is_none")]
    pub oom_score_adj: Option<i32>,
    #[serde(rename = "PidMode", default, skip_serializing_if = "Option::is_none")]
    pub pid_mode: Option<String>,
    #[serde(rename = "Privileged", default, skip_serializing_if = "is_false")]
    pub privileged: bool,
    #[serde(rename = "PublishAllPorts", default, skip_serializing_if = "is_false")]
    pub publish_all_ports: bool,
    #[serde(rename = "ReadonlyRootfs", default, skip_serializing_if = "is_false")]
    pub readonly_rootfs: bool,
    #[serde(rename = "SecurityOpt", default, skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,
    #[serde(rename = "StorageOpt", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage_opt: BTreeMap<String, String>,
    #[serde(rename = "Tmpfs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tmpfs: BTreeMap<String, String>,
    #[serde(rename = "UTSMode", default, skip_serializing_if = "Option::is_none")]
    pub uts_mode: Option<String>,
    #[serde(rename = "UsernsMode", default, skip_serializing_if = "Option::is_none")]
    pub userns_mode: Option<String>,
    #[serde(rename = "ShmSize", default, skip_serializing_if = "Option::is_none")]
    pub shm_size: Option<i64>,
    #[serde(rename = "Sysctls", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sysctls: BTreeMap<String, String>,
    #[serde(rename = "Runtime", default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Initial console size as `[height, width]`
    #[serde(rename = "ConsoleSize", default, skip_serializing_if = "Option::is_none")]
    pub console_size: Option<[u32; 2]>,
    #[serde(rename = "Isolation", default, skip_serializing_if = "Option::is_none")]
    pub isolation: Option<Isolation>,
    #[serde(flatten)]
    pub resources: Resources,
}

impl HostConfig {
    /// Publishes a container port on the host. `host_ip` may be empty to bind
    /// on all interfaces.
    pub fn publish(&mut self, container: Port, host_ip: Option<&str>, host_port: u16) {
        self.port_bindings
            .entry(container)
            .or_default()
            .push(PortBinding {
                host_ip: host_ip.map(str::to_string),
                host_port: Some(host_port.to_string()),
            });
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref policy) = self.restart_policy {
            policy.validate()?;
        }
        if self.auto_remove {
            if let Some(ref policy) = self.restart_policy {
                if policy.name != RestartPolicyMode::No && policy.name != RestartPolicyMode::Empty {
                    return Err(ValidationError::InvalidValue {
                        field: "AutoRemove",
                        reason: "cannot be combined with a restart policy".to_string(),
                    });
                }
            }
        }
        self.resources.validate()
    }
}

/// Resource limits, shared by create (inside `HostConfig`) and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(rename = "CpuShares", default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<i64>,
    /// Memory limit in bytes
    #[serde(rename = "Memory", default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    /// CPU quota in units of 1e-9 CPUs
    #[serde(rename = "NanoCpus", default, skip_serializing_if = "Option::is_none")]
    pub nano_cpus: Option<i64>,
    #[serde(rename = "CgroupParent", default, skip_serializing_if = "Option::is_none")]
    pub cgroup_parent: Option<String>,
    #[serde(rename = "BlkioWeight", default, skip_serializing_if = "Option::is_none")]
    pub blkio_weight: Option<u16>,
    #[serde(rename = "CpuPeriod", default, skip_serializing_if = "Option::is_none")]
    pub cpu_period: Option<i64>,
    #[serde(rename = "CpuQuota", default, skip_serializing_if = "Option::is_none")]
    pub cpu_quota: Option<i64>,
    #[serde(rename = "CpusetCpus", default, skip_serializing_if = "Option::is_none")]
    pub cpuset_cpus: Option<String>,
    #[serde(rename = "CpusetMems", default, skip_serializing_if = "Option::is_none")]
    pub cpuset_mems: Option<String>,
    #[serde(rename = "Devices", default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceMapping>,
    #[serde(rename = "MemoryReservation", default, skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<i64>,
    /// Memory plus swap; `-1` enables unlimited swap
    #[serde(rename = "MemorySwap", default, skip_serializing_if = "Option::is_none")]
    pub memory_swap: Option<i64>,
    #[serde(rename = "MemorySwappiness", default, skip_serializing_if = "Option::is_none")]
    pub memory_swappiness: Option<i64>,
    #[serde(rename = "OomKillDisable", default, skip_serializing_if = "Option::is_none")]
    pub oom_kill_disable: Option<bool>,
    #[serde(rename = "PidsLimit", default, skip_serializing_if = "Option::is_none")]
    pub pids_limit: Option<i64>,
    #[serde(rename = "Ulimits", default, skip_serializing_if = "Vec::is_empty")]
    pub ulimits: Vec<Ulimit>,
}

impl Resources {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(weight) = self.blkio_weight {
            if weight != 0 && !(10..=1000).contains(&weight) {
                return Err(ValidationError::InvalidValue {
                    field: "BlkioWeight",
                    reason: format!("{weight} out of range (10 to 1000)"),
                });
            }
        }
        if let Some(swappiness) = self.memory_swappiness {
            if swappiness != -1 && !(0..=100).contains(&swappiness) {
                return Err(ValidationError::InvalidValue {
                    field: "MemorySwappiness",
                    reason: format!("{swappiness} out of range (0 to 100)"),
                });
            }
        }
        if self.nano_cpus.is_some() && (self.cpu_period.is_some() || self.cpu_quota.is_some()) {
            return Err(ValidationError::InvalidValue {
                field: "NanoCpus",
                reason: "conflicts with CpuPeriod/CpuQuota".to_string(),
            });
        }
        Ok(())
    }
}

/// Body of the container update call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(flatten)]
    pub resources: Resources,
    #[serde(rename = "RestartPolicy", default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "Type")]
    pub log_type: String,
    #[serde(rename = "Config", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(rename = "HostPort", default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicyMode {
    #[default]
    #[serde(rename = "")]
    Empty,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "on-failure")]
    OnFailure,
    #[serde(rename = "unless-stopped")]
    UnlessStopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    #[serde(rename = "Name", default)]
    pub name: RestartPolicyMode,
    #[serde(rename = "MaximumRetryCount", default, skip_serializing_if = "Option::is_none")]
    pub maximum_retry_count: Option<u32>,
}

impl RestartPolicy {
    pub fn on_failure(max_retries: u32) -> Self {
        Self {
            name: RestartPolicyMode::OnFailure,
            maximum_retry_count: Some(max_retries),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.name, self.maximum_retry_count) {
            (RestartPolicyMode::OnFailure, _) | (_, None) | (_, Some(0)) => Ok(()),
            (mode, Some(n)) => Err(ValidationError::InvalidValue {
                field: "RestartPolicy",
                reason: format!("maximum retry count {n} only applies to on-failure, not {mode:?}"),
            }),
        }
    }
}

impl FromStr for RestartPolicy {
    type Err = ValidationError;

    /// Parses `no`, `always`, `unless-stopped` or `on-failure[:max-retries]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| ValidationError::InvalidValue {
            field: "RestartPolicy",
            reason,
        };
        let (name, count) = match s.split_once(':') {
            Some((name, count)) => (name, Some(count)),
            None => (s, None),
        };
        let mode = match name {
            "" => RestartPolicyMode::Empty,
            "no" => RestartPolicyMode::No,
            "always" => RestartPolicyMode::Always,
            "on-failure" => RestartPolicyMode::OnFailure,
            "unless-stopped" => RestartPolicyMode::UnlessStopped,
            other => return Err(fail(format!("unknown restart policy '{other}'"))),
        };
        let maximum_retry_count = match count {
            None => None,
            Some(_) if mode != RestartPolicyMode::OnFailure => {
                return Err(fail(format!("'{name}' does not take a retry count")));
            }
            Some(n) => Some(
                n.parse::<u32>()
                    .map_err(|_| fail(format!("retry count '{n}' is not a number")))?,
            ),
        };
        Ok(Self {
            name: mode,
            maximum_retry_count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    Default,
    Process,
    Hyperv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountType {
    Bind,
    Volume,
    Tmpfs,
    Npipe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    #[serde(rename = "Type")]
    pub mount_type: MountType,
    #[serde(rename = "Source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "ReadOnly", default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(rename = "Consistency", default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMapping {
    #[serde(rename = "PathOnHost")]
    pub path_on_host: String,
    #[serde(rename = "PathInContainer")]
    pub path_in_container: String,
    #[serde(rename = "CgroupPermissions")]
    pub cgroup_permissions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ulimit {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Soft")]
    pub soft: i64,
    #[serde(rename = "Hard")]
    pub hard: i64,
}
