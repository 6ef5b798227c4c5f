//! Turns `wharf request` subcommands into rendered engine requests.

use serde_json::{Value, json};
use std::collections::BTreeMap;

use wharf::config::ClientConfig;
use wharf::container::{
    ContainerConfig, ContainerCreateConfig, HealthConfig, HealthTest, HostConfig, Port,
    RestartPolicy,
};
use wharf::error::{Result, ValidationError};
use wharf::filters::{Filters, parse_filter_arg};
use wharf::options::*;
use wharf::registry::{DEFAULT_REGISTRY, RegistryAccess};

use super::RequestCommands;

/// Builds the filter set from repeated `--filter key=value` flags.
pub fn parse_filters(args: &[String]) -> Result<Filters> {
    let mut filters = Filters::new();
    for arg in args {
        let (key, value) = parse_filter_arg(arg)?;
        filters.add(key, value);
    }
    Ok(filters)
}

/// `[ip:]host:container[/proto]`, or a bare container port published on a
/// random host port.
pub fn parse_publish(spec: &str) -> std::result::Result<(Port, Option<String>, u16), ValidationError> {
    let invalid = || ValidationError::InvalidPort {
        value: spec.to_string(),
    };
    let parts: Vec<&str> = spec.rsplitn(3, ':').collect();
    let (container, host_port, host_ip) = match parts.as_slice() {
        [container] => (*container, "0", None),
        [container, host] => (*container, *host, None),
        [container, host, ip] => (*container, *host, Some(ip.to_string())),
        _ => return Err(invalid()),
    };
    let host_port = host_port.parse::<u16>().map_err(|_| invalid())?;
    Ok((container.parse()?, host_ip, host_port))
}

fn parse_labels(args: &[String]) -> std::result::Result<BTreeMap<String, String>, ValidationError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            None if !arg.is_empty() => Ok((arg.clone(), String::new())),
            _ => Err(ValidationError::InvalidValue {
                field: "Labels",
                reason: format!("bad label '{arg}' (expected key=value)"),
            }),
        })
        .collect()
}

/// Stored credential for the registry a reference points at.
fn access_for(reference: &str, config: &ClientConfig) -> Result<RegistryAccess> {
    let parsed = ImageReference::parse(reference)?;
    let registry = parsed.domain().unwrap_or(DEFAULT_REGISTRY);
    match config.auth_for(registry) {
        Some(auth) => {
            tracing::debug!(registry, "Using stored registry credential");
            Ok(RegistryAccess::with_auth(auth.encode()?))
        }
        None => Ok(RegistryAccess::anonymous()),
    }
}

pub fn build_request(operation: &RequestCommands, config: &ClientConfig) -> Result<ApiRequest> {
    match operation {
        RequestCommands::Ps {
            all,
            size,
            last,
            filters,
        } => ContainerListOptions {
            all: all.then_some(true),
            size: size.then_some(true),
            limit: *last,
            filters: parse_filters(filters)?,
            ..Default::default()
        }
        .to_request(),

        RequestCommands::Images {
            all,
            filters,
            reference,
        } => ImageListOptions {
            all: all.then_some(true),
            match_name: reference.clone(),
            filters: parse_filters(filters)?,
        }
        .to_request(),

        RequestCommands::Create {
            image,
            name,
            env,
            label,
            publish,
            restart,
            health_cmd,
            health_retries,
            no_healthcheck,
            workdir,
            user,
            tty,
            command,
        } => {
            let mut container = ContainerConfig::new(image.clone());
            container.env = env.clone();
            container.labels = parse_labels(label)?;
            container.working_dir = workdir.clone();
            container.user = user.clone();
            container.tty = *tty;
            if !command.is_empty() {
                container = container.with_cmd(command.clone());
            }
            if *no_healthcheck {
                container = container.with_healthcheck(HealthConfig::disabled());
            } else if let Some(cmd) = health_cmd {
                let mut health = HealthConfig::new(HealthTest::Shell(cmd.clone()));
                if let Some(retries) = health_retries {
                    health = health.with_retries(*retries);
                }
                container = container.with_healthcheck(health);
            }

            let mut host = HostConfig::default();
            for spec in publish {
                let (port, ip, host_port) = parse_publish(spec)?;
                container = container.with_exposed_port(port);
                host.publish(port, ip.as_deref(), host_port);
            }
            if let Some(policy) = restart {
                host.restart_policy = Some(policy.parse::<RestartPolicy>()?);
            }

            let mut create = ContainerCreateConfig::new(container).with_host_config(host);
            if let Some(name) = name {
                create = create.with_name(name.clone());
            }
            ContainerCreateOptions::new(create).to_request()
        }

        RequestCommands::Stop { container, time } => ContainerStopOptions {
            id: container.clone(),
            timeout: *time,
            ..Default::default()
        }
        .to_request(),

        RequestCommands::Kill { container, signal } => ContainerKillOptions {
            id: container.clone(),
            signal: signal.clone(),
        }
        .to_request(),

        RequestCommands::Pull {
            reference,
            all_tags,
        } => {
            let mut options =
                ImagePullOptions::new(reference.clone()).with_access(access_for(reference, config)?);
            options.all = *all_tags;
            options.to_request()
        }

        RequestCommands::Push { reference } => ImagePushOptions::new(reference.clone())
            .with_access(access_for(reference, config)?)
            .to_request(),

        RequestCommands::Search {
            term,
            limit,
            filters,
        } => {
            let access = match config.auth_for(DEFAULT_REGISTRY) {
                Some(auth) => RegistryAccess::with_auth(auth.encode()?),
                None => RegistryAccess::anonymous(),
            };
            ImageSearchOptions {
                term: term.clone(),
                limit: *limit,
                filters: parse_filters(filters)?,
                access,
            }
            .to_request()
        }

        RequestCommands::Rm {
            container,
            force,
            volumes,
            link,
        } => ContainerRemoveOptions {
            id: container.clone(),
            remove_volumes: volumes.then_some(true),
            remove_links: link.then_some(true),
            force: force.then_some(true),
        }
        .to_request(),

        RequestCommands::Rmi {
            image,
            force,
            no_prune,
        } => ImageRemoveOptions {
            name: image.clone(),
            force: force.then_some(true),
            prune_children: no_prune.then_some(false),
        }
        .to_request(),

        RequestCommands::Logs {
            container,
            follow,
            timestamps,
            tail,
            since,
            no_stdout,
            no_stderr,
        } => ContainerLogsOptions {
            id: container.clone(),
            stdout: Some(!no_stdout),
            stderr: Some(!no_stderr),
            since: since.clone(),
            timestamps: timestamps.then_some(true),
            follow: follow.then_some(true),
            tail: tail.clone(),
            ..Default::default()
        }
        .to_request(),
    }
}

/// JSON view of a rendered request. Sensitive headers stay redacted.
pub fn describe(request: &ApiRequest, host: &str, api_version: &str) -> Result<Value> {
    let url = request.url(host, api_version)?;
    let headers: BTreeMap<&str, &str> = request
        .headers
        .iter()
        .map(|h| (h.name, if h.sensitive { "<redacted>" } else { h.value.as_str() }))
        .collect();
    let body = match request.body {
        Body::Empty => Value::Null,
        Body::Json(ref value) => value.clone(),
        Body::Raw(ref bytes) => json!(format!("<{} bytes>", bytes.len())),
    };
    Ok(json!({
        "method": request.method.as_str(),
        "url": url.as_str(),
        "headers": headers,
        "body": body,
    }))
}
