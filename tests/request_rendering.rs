use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wharf::api::*;

#[test]
fn test_create_web_container_without_healthcheck() {
    let config = ContainerConfig::new("nginx:1.25").with_cmd(vec![
        "nginx".to_string(),
        "-g".to_string(),
        "daemon off;".to_string(),
    ]);
    let options = ContainerCreateOptions::new(ContainerCreateConfig::new(config).with_name("web-1"));

    let request = options.to_request().unwrap();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/containers/create");
    assert_eq!(request.query_values("name"), vec!["web-1"]);

    let body = request.json_body().unwrap();
    assert_eq!(body["Cmd"], json!(["nginx", "-g", "daemon off;"]));
    assert!(body.get("Healthcheck").is_none());
}

#[test]
fn test_list_dangling_images() {
    let options = ImageListOptions {
        filters: Filters::new().with("dangling", "true"),
        ..Default::default()
    };
    let request = options.to_request().unwrap();
    assert_eq!(request.path, "/images/json");
    assert_eq!(request.query, vec![("filters".to_string(), r#"{"dangling":["true"]}"#.to_string())]);
}

#[test]
fn test_request_url_for_socket_host() {
    let request = ContainerListOptions {
        all: Some(true),
        ..Default::default()
    }
    .to_request()
    .unwrap();

    let url = request.url("unix:///var/run/docker.sock", "1.41").unwrap();
    assert_eq!(url.as_str(), "http://localhost/v1.41/containers/json?all=1");
}

#[test]
fn test_stop_with_zero_timeout() {
    let request = ContainerStopOptions {
        id: "web-1".into(),
        timeout: Some(0),
        ..Default::default()
    }
    .to_request()
    .unwrap();
    assert_eq!(request.path, "/containers/web-1/stop");
    assert_eq!(request.query_values("t"), vec!["0"]);
}

#[test]
fn test_missing_path_parameter_is_rejected() {
    let err = ContainerKillOptions::default().to_request().unwrap_err();
    assert!(matches!(
        err,
        WharfError::Validation(ValidationError::MissingPathParameter { parameter: "id", .. })
    ));
}

#[test]
fn test_dot_segment_ids_cannot_leave_their_route() {
    let err = ContainerInspectOptions {
        id: "../../version".into(),
        ..Default::default()
    }
    .to_request()
    .unwrap_err();
    assert!(matches!(
        err,
        WharfError::Validation(ValidationError::InvalidPathParameter { parameter: "id", .. })
    ));

    let image = ImageInspectOptions {
        name: "ghcr.io/team/app:v1".into(),
    }
    .to_request()
    .unwrap();
    let url = image.url("tcp://127.0.0.1:2375", "1.41").unwrap();
    assert_eq!(url.path(), "/v1.41/images/ghcr.io/team/app:v1/json");

    assert!(
        ImageInspectOptions {
            name: "team/../../version".into(),
        }
        .to_request()
        .is_err()
    );
}

#[test]
fn test_exec_create() {
    let create = ExecCreateOptions {
        id: "web-1".into(),
        config: ExecConfig::new(["sh", "-c", "echo hi"]).attached(),
    }
    .to_request()
    .unwrap();
    assert_eq!(create.path, "/containers/web-1/exec");
    assert_eq!(create.json_body().unwrap()["Cmd"], json!(["sh", "-c", "echo hi"]));
}

#[test]
fn test_push_carries_credential_header() {
    let auth = AuthConfig::basic("alice", "s3cret", "registry.example.com")
        .encode()
        .unwrap();
    let request = ImagePushOptions::new("registry.example.com/team/app:v2")
        .with_access(RegistryAccess::with_auth(auth.clone()))
        .to_request()
        .unwrap();

    assert_eq!(request.path, "/images/registry.example.com/team/app/push");
    assert_eq!(request.query_values("tag"), vec!["v2"]);
    assert_eq!(request.header("X-Registry-Auth"), Some(auth.as_str()));
    assert!(!format!("{request:?}").contains("s3cret"));
    assert_eq!(auth.decode().unwrap().username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_pull_retries_once_after_unauthorized() {
    let prompts = Arc::new(AtomicUsize::new(0));
    let counter = prompts.clone();
    let privilege = PrivilegeHandle::from_fn(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            AuthConfig::basic("alice", "fresh", "docker.io")
                .encode()
                .map_err(|e| TransportError::PrivilegeDenied {
                    reason: e.to_string(),
                })
        }
    });

    let options = ImagePullOptions::new("alpine:3.19")
        .with_access(RegistryAccess::anonymous().with_privilege(privilege));

    let sends = AtomicUsize::new(0);
    let result = send_with_privilege_retry(&options.access, |auth| {
        sends.fetch_add(1, Ordering::SeqCst);
        let mut attempt = options.clone();
        attempt.access.registry_auth = auth;
        async move {
            let request = attempt.to_request().map_err(|e| TransportError::Connection(e.to_string()))?;
            match request.header("X-Registry-Auth") {
                Some(_) => Ok(request),
                None => Err(TransportError::Unauthorized {
                    message: "pull access denied".into(),
                }),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(prompts.load(Ordering::SeqCst), 1);
    assert_eq!(sends.load(Ordering::SeqCst), 2);
    assert_eq!(result.query_values("fromImage"), vec!["alpine"]);
}

#[tokio::test]
async fn test_unauthorized_without_privilege_is_returned() {
    let access = RegistryAccess::anonymous();
    let result: Result<(), TransportError> = send_with_privilege_retry(&access, |_| async {
        Err(TransportError::Status {
            status: 401,
            message: "unauthorized".into(),
        })
    })
    .await;
    assert!(result.unwrap_err().is_unauthorized());
}

#[test]
fn test_version_response_without_server() {
    let response: VersionResponse =
        serde_json::from_value(json!({"Client": {"Version": "24.0.7", "ApiVersion": "1.43"}})).unwrap();
    assert!(!response.server_ok());
}
