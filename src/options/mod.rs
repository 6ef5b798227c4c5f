//! Per-operation option structs and the request they render to.
//!
//! Each operation is a plain struct. Fields marked `#[serde(skip)]` are path
//! parameters, headers or the body; everything else serializes into the
//! query string through [`query::to_pairs`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::{EncodingError, Result, ValidationError};
use crate::registry::{REGISTRY_AUTH_HEADER, RegistryAuth};

pub mod container;
pub mod image;
pub mod network;
pub mod query;
pub mod reference;
pub mod swarm;
pub mod system;

pub use container::*;
pub use image::*;
pub use network::*;
pub use reference::ImageReference;
pub use swarm::*;
pub use system::*;

/// An engine API call that can be rendered into an [`ApiRequest`].
pub trait Operation: Serialize {
    const METHOD: Method;
    /// Short name used in errors and logs.
    const NAME: &'static str;

    /// Request path below the version prefix, e.g. `/containers/web/start`.
    fn path(&self) -> std::result::Result<String, ValidationError>;

    fn query(&self) -> std::result::Result<Vec<(String, String)>, EncodingError> {
        query::to_pairs(self)
    }

    fn headers(&self) -> std::result::Result<Vec<Header>, EncodingError> {
        Ok(Vec::new())
    }

    fn body(&self) -> std::result::Result<Body, EncodingError> {
        Ok(Body::Empty)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }

    /// Validates the options and renders them. Nothing is sent.
    fn to_request(&self) -> Result<ApiRequest> {
        self.validate()?;
        let request = ApiRequest {
            method: Self::METHOD,
            path: self.path()?,
            query: self.query()?,
            headers: self.headers()?,
            body: self.body()?,
        };
        debug!(
            operation = Self::NAME,
            method = %request.method,
            path = %request.path,
            query_params = request.query.len(),
            "Rendered engine request"
        );
        Ok(request)
    }
}

/// A request header. Sensitive values are hidden from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    pub name: &'static str,
    pub value: String,
    pub sensitive: bool,
}

impl Header {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            sensitive: false,
        }
    }

    pub fn sensitive(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            sensitive: true,
        }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.sensitive {
            "<redacted>"
        } else {
            self.value.as_str()
        };
        f.debug_struct("Header")
            .field("name", &self.name)
            .field("value", &value)
            .finish()
    }
}

/// Request body.
#[derive(Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// Opaque bytes such as a tar archive or build context
    Raw(Bytes),
}

impl Body {
    pub fn json<T: Serialize>(value: &T) -> std::result::Result<Self, EncodingError> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Body::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
        }
    }
}

/// A fully rendered engine request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<Header>,
    pub body: Body,
}

impl ApiRequest {
    /// Values of a query key, in order.
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match self.body {
            Body::Json(ref value) => Some(value),
            _ => None,
        }
    }

    /// Full URL: `<host>/v<api_version><path>?<query>`.
    ///
    /// Socket hosts (`unix://`, `npipe://`) are addressed as
    /// `http://localhost`; the transport owns the actual connection.
    pub fn url(&self, host: &str, api_version: &str) -> std::result::Result<Url, EncodingError> {
        let mut url = base_url(host)?;
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}/v{api_version}{}", self.path));
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// Builds, without sending, the `reqwest` request for this call.
    pub fn to_reqwest(
        &self,
        client: &reqwest::Client,
        host: &str,
        api_version: &str,
    ) -> Result<reqwest::Request> {
        let url = self.url(host, api_version)?;
        let mut builder = client.request(self.method.clone(), url);
        for header in &self.headers {
            builder = builder.header(header.name, header.value.as_str());
        }
        builder = match self.body {
            Body::Empty => builder,
            Body::Json(ref value) => builder.json(value),
            Body::Raw(ref bytes) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/x-tar")
                .body(bytes.clone()),
        };
        Ok(builder
            .build()
            .map_err(|e| EncodingError::Url(e.to_string()))?)
    }
}

fn base_url(host: &str) -> std::result::Result<Url, EncodingError> {
    let normalized = if host.starts_with("unix://") || host.starts_with("npipe://") {
        "http://localhost".to_string()
    } else if let Some(rest) = host.strip_prefix("tcp://") {
        format!("http://{rest}")
    } else {
        host.to_string()
    };
    Url::parse(&normalized).map_err(|e| EncodingError::Url(format!("{host}: {e}")))
}

/// `X-Registry-Auth` header for an optional credential.
pub(crate) fn registry_auth_header(auth: Option<&RegistryAuth>) -> Vec<Header> {
    auth.map(|a| Header::sensitive(REGISTRY_AUTH_HEADER, a.as_str()))
        .into_iter()
        .collect()
}

/// Checks an identifier that fills exactly one path segment: container,
/// exec, network, node and service ids.
pub(crate) fn require<'a>(
    operation: &'static str,
    parameter: &'static str,
    value: &'a str,
) -> std::result::Result<&'a str, ValidationError> {
    let value = require_name(operation, parameter, value)?;
    if value.contains('/') {
        return Err(ValidationError::InvalidPathParameter {
            operation,
            parameter,
            value: value.to_string(),
            reason: "must not contain '/'",
        });
    }
    Ok(value)
}

/// Checks an image name, which may span several segments but must not
/// contain empty or dot segments.
pub(crate) fn require_name<'a>(
    operation: &'static str,
    parameter: &'static str,
    value: &'a str,
) -> std::result::Result<&'a str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingPathParameter {
            operation,
            parameter,
        });
    }
    let invalid = |reason| ValidationError::InvalidPathParameter {
        operation,
        parameter,
        value: value.to_string(),
        reason,
    };
    for segment in value.split('/') {
        if segment.is_empty() {
            return Err(invalid("must not contain empty segments"));
        }
        if is_dot_segment(segment) {
            return Err(invalid("must not contain '.' or '..' segments"));
        }
    }
    Ok(value)
}

/// URL parsers resolve `.`/`..` segments, including percent-encoded dots.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Engine timestamp form used by `since`/`until`: seconds with a
/// nanosecond fraction.
pub fn engine_timestamp(time: DateTime<Utc>) -> String {
    format!("{}.{:09}", time.timestamp(), time.timestamp_subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ApiRequest {
        ApiRequest {
            method: Method::GET,
            path: "/containers/json".into(),
            query: vec![("all".into(), "1".into()), ("filters".into(), r#"{"a":["b"]}"#.into())],
            headers: vec![Header::sensitive("X-Registry-Auth", "c2VjcmV0")],
            body: Body::Empty,
        }
    }

    #[test]
    fn test_url_for_tcp_host() {
        let url = sample().url("tcp://127.0.0.1:2375", "1.25").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:2375/v1.25/containers/json?all=1&filters=%7B%22a%22%3A%5B%22b%22%5D%7D"
        );
    }

    #[test]
    fn test_url_for_unix_host() {
        let url = sample().url("unix:///var/run/docker.sock", "1.41").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.path(), "/v1.41/containers/json");
    }

    #[test]
    fn test_single_segment_ids_stay_in_their_route() {
        for id in ["../../version", "..", ".", "%2e%2E", "web/1"] {
            assert!(
                matches!(
                    require("container inspect", "id", id),
                    Err(ValidationError::InvalidPathParameter { parameter: "id", .. })
                ),
                "{id} was accepted"
            );
        }
        assert_eq!(require("container inspect", "id", "web-1.blue"), Ok("web-1.blue"));
        assert!(matches!(
            require("container inspect", "id", ""),
            Err(ValidationError::MissingPathParameter { .. })
        ));
    }

    #[test]
    fn test_image_names_may_span_segments() {
        assert_eq!(
            require_name("image inspect", "name", "ghcr.io/team/app:v1"),
            Ok("ghcr.io/team/app:v1")
        );
        for name in ["team/../app", "../../version", "team//app", "./app"] {
            assert!(require_name("image inspect", "name", name).is_err(), "{name} was accepted");
        }
    }

    #[test]
    fn test_bad_host() {
        assert!(matches!(
            sample().url("not a url", "1.25"),
            Err(EncodingError::Url(_))
        ));
    }

    #[test]
    fn test_sensitive_header_is_redacted() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_to_reqwest_carries_headers() {
        let client = reqwest::Client::new();
        let request = sample()
            .to_reqwest(&client, "http://localhost:2375", "1.25")
            .unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.headers().get("X-Registry-Auth").unwrap(),
            "c2VjcmV0"
        );
    }

    #[test]
    fn test_engine_timestamp() {
        let t = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
        assert_eq!(engine_timestamp(t), "1700000000.000000005");
    }
}
