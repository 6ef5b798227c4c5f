use bytes::Bytes;
use reqwest::Method;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::query;
use super::reference::ImageReference;
use super::{Body, Header, Operation, registry_auth_header, require_name};
use crate::codec::serialize_as_json;
use crate::container::{Isolation, Ulimit};
use crate::error::{EncodingError, ValidationError};
use crate::filters::{Filters, serialize_filters};
use crate::registry::{REGISTRY_CONFIG_HEADER, RegistryAccess, RegistryAuth, RegistryConfigs};

/// `GET /images/json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,
    /// Only images whose reference matches this name
    #[serde(rename = "filter", skip_serializing_if = "Option::is_none")]
    pub match_name: Option<String>,
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for ImageListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "image list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/json".to_string())
    }
}

/// `POST /build`. The body is the build context as a tar archive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageBuildOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(rename = "t", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub suppress_output: Option<bool>,
    /// Git URL or tarball URL used instead of an uploaded context
    #[serde(rename = "remote", skip_serializing_if = "Option::is_none")]
    pub remote_context: Option<String>,
    #[serde(rename = "nocache", skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
    /// Remove intermediate containers after a successful build
    #[serde(rename = "rm", skip_serializing_if = "Option::is_none")]
    pub remove: Option<bool>,
    #[serde(rename = "forcerm", skip_serializing_if = "Option::is_none")]
    pub force_remove: Option<bool>,
    #[serde(rename = "pull", skip_serializing_if = "Option::is_none")]
    pub pull_parent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation: Option<Isolation>,
    #[serde(rename = "cpusetcpus", skip_serializing_if = "Option::is_none")]
    pub cpuset_cpus: Option<String>,
    #[serde(rename = "cpusetmems", skip_serializing_if = "Option::is_none")]
    pub cpuset_mems: Option<String>,
    #[serde(rename = "cpushares", skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<i64>,
    #[serde(rename = "cpuquota", skip_serializing_if = "Option::is_none")]
    pub cpu_quota: Option<i64>,
    #[serde(rename = "cpuperiod", skip_serializing_if = "Option::is_none")]
    pub cpu_period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    /// Memory plus swap. `-1` enables unlimited swap.
    #[serde(rename = "memswap", skip_serializing_if = "Option::is_none")]
    pub memory_swap: Option<i64>,
    #[serde(rename = "cgroupparent", skip_serializing_if = "Option::is_none")]
    pub cgroup_parent: Option<String>,
    #[serde(rename = "shmsize", skip_serializing_if = "Option::is_none")]
    pub shm_size: Option<i64>,
    #[serde(serialize_with = "serialize_as_json", skip_serializing_if = "Vec::is_empty")]
    pub ulimits: Vec<Ulimit>,
    #[serde(
        rename = "buildargs",
        serialize_with = "serialize_as_json",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub build_args: BTreeMap<String, String>,
    #[serde(serialize_with = "serialize_as_json", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Credentials for every registry the build may pull from
    #[serde(skip)]
    pub auth_configs: RegistryConfigs,
    #[serde(skip)]
    pub context: Bytes,
}

impl Operation for ImageBuildOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image build";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/build".to_string())
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        if self.auth_configs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Header::sensitive(
            REGISTRY_CONFIG_HEADER,
            self.auth_configs.encode()?,
        )])
    }

    fn body(&self) -> Result<Body, EncodingError> {
        if self.context.is_empty() {
            Ok(Body::Empty)
        } else {
            Ok(Body::Raw(self.context.clone()))
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.context.is_empty() && self.remote_context.is_none() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "context or remote",
            });
        }
        for tag in &self.tags {
            ImageReference::parse(tag)?;
        }
        if let (Some(memory), Some(swap)) = (self.memory, self.memory_swap) {
            if swap != -1 && swap < memory {
                return Err(ValidationError::InvalidValue {
                    field: "memswap",
                    reason: format!("memory+swap {swap} is smaller than memory {memory}"),
                });
            }
        }
        Ok(())
    }
}

/// `POST /images/create` with explicit query fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageCreateOptions {
    #[serde(rename = "fromImage", skip_serializing_if = "Option::is_none")]
    pub from_image: Option<String>,
    #[serde(rename = "fromSrc", skip_serializing_if = "Option::is_none")]
    pub from_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip)]
    pub registry_auth: Option<RegistryAuth>,
}

impl Operation for ImageCreateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image create";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/create".to_string())
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.registry_auth.as_ref()))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match (&self.from_image, &self.from_src) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(ValidationError::InvalidValue {
                field: "fromImage",
                reason: "exactly one of fromImage or fromSrc must be set".to_string(),
            }),
        }
    }
}

/// Pulls an image by reference through `POST /images/create`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImagePullOptions {
    #[serde(skip)]
    pub reference: String,
    /// Pull every tag of the repository
    #[serde(skip)]
    pub all: bool,
    #[serde(skip)]
    pub access: RegistryAccess,
}

impl ImagePullOptions {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_access(mut self, access: RegistryAccess) -> Self {
        self.access = access;
        self
    }
}

impl Operation for ImagePullOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image pull";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/create".to_string())
    }

    fn query(&self) -> Result<Vec<(String, String)>, EncodingError> {
        // validate() has already accepted the reference
        let Ok(reference) = ImageReference::parse(&self.reference) else {
            return Ok(Vec::new());
        };
        let mut pairs = vec![("fromImage".to_string(), reference.repository.clone())];
        if !self.all {
            let tag = reference.digest_or_tag().unwrap_or("latest");
            pairs.push(("tag".to_string(), tag.to_string()));
        }
        Ok(pairs)
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.access.registry_auth.as_ref()))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let reference = ImageReference::parse(&self.reference)?;
        if self.all && reference.digest_or_tag().is_some() {
            return Err(ValidationError::InvalidReference {
                reference: self.reference.clone(),
                reason: "a tag or digest cannot be combined with pulling all tags".to_string(),
            });
        }
        Ok(())
    }
}

/// Where an imported image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageImportSource {
    /// Tarball uploaded as the request body
    Archive(Bytes),
    /// URL the engine downloads the tarball from
    Url(String),
}

/// `POST /images/create?fromSrc=...`
#[derive(Debug, Clone, Serialize)]
pub struct ImageImportOptions {
    #[serde(skip)]
    pub source: ImageImportSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Dockerfile instructions applied to the imported image
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
}

impl ImageImportOptions {
    pub fn new(source: ImageImportSource) -> Self {
        Self {
            source,
            repo: None,
            tag: None,
            message: None,
            changes: Vec::new(),
        }
    }
}

impl Operation for ImageImportOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image import";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/create".to_string())
    }

    fn query(&self) -> Result<Vec<(String, String)>, EncodingError> {
        let from_src = match self.source {
            ImageImportSource::Archive(_) => "-".to_string(),
            ImageImportSource::Url(ref url) => url.clone(),
        };
        let mut pairs = vec![("fromSrc".to_string(), from_src)];
        pairs.extend(query::to_pairs(self)?);
        Ok(pairs)
    }

    fn body(&self) -> Result<Body, EncodingError> {
        match self.source {
            ImageImportSource::Archive(ref bytes) => Ok(Body::Raw(bytes.clone())),
            ImageImportSource::Url(_) => Ok(Body::Empty),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let ImageImportSource::Url(ref url) = self.source {
            if url.is_empty() || url == "-" {
                return Err(ValidationError::MissingField {
                    operation: Self::NAME,
                    field: "fromSrc",
                });
            }
        }
        if self.tag.is_some() && self.repo.is_none() {
            return Err(ValidationError::InvalidValue {
                field: "tag",
                reason: "a tag requires a repository".to_string(),
            });
        }
        Ok(())
    }
}

/// `POST /images/{name}/push`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImagePushOptions {
    #[serde(skip)]
    pub reference: String,
    #[serde(skip)]
    pub access: RegistryAccess,
}

impl ImagePushOptions {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_access(mut self, access: RegistryAccess) -> Self {
        self.access = access;
        self
    }
}

impl Operation for ImagePushOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image push";

    fn path(&self) -> Result<String, ValidationError> {
        require_name(Self::NAME, "name", &self.reference)?;
        let reference = ImageReference::parse(&self.reference)?;
        Ok(format!("/images/{}/push", reference.repository))
    }

    fn query(&self) -> Result<Vec<(String, String)>, EncodingError> {
        let Ok(reference) = ImageReference::parse(&self.reference) else {
            return Ok(Vec::new());
        };
        Ok(reference
            .digest_or_tag()
            .map(|tag| ("tag".to_string(), tag.to_string()))
            .into_iter()
            .collect())
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.access.registry_auth.as_ref()))
    }
}

/// `POST /images/{name}/tag`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageTagOptions {
    /// Source image
    #[serde(skip)]
    pub name: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ImageTagOptions {
    pub fn new(source: impl Into<String>, target: &ImageReference) -> Self {
        Self {
            name: source.into(),
            repo: target.repository.clone(),
            tag: target.tag.clone(),
        }
    }
}

impl Operation for ImageTagOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "image tag";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/images/{}/tag", require_name(Self::NAME, "name", &self.name)?))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.repo.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "repo",
            });
        }
        ImageReference::parse(&self.repo)?;
        Ok(())
    }
}

fn serialize_inverted<S: Serializer>(value: &Option<bool>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(b) => s.serialize_bool(!b),
        None => s.serialize_none(),
    }
}

/// `DELETE /images/{name}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageRemoveOptions {
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    /// Also delete untagged parents. Sent inverted as `noprune`.
    #[serde(
        rename = "noprune",
        serialize_with = "serialize_inverted",
        skip_serializing_if = "Option::is_none"
    )]
    pub prune_children: Option<bool>,
}

impl Operation for ImageRemoveOptions {
    const METHOD: Method = Method::DELETE;
    const NAME: &'static str = "image remove";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/images/{}", require_name(Self::NAME, "name", &self.name)?))
    }
}

/// `GET /images/{name}/history`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageHistoryOptions {
    #[serde(skip)]
    pub name: String,
}

impl Operation for ImageHistoryOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "image history";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/images/{}/history", require_name(Self::NAME, "name", &self.name)?))
    }
}

/// `GET /images/{name}/json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageInspectOptions {
    #[serde(skip)]
    pub name: String,
}

impl Operation for ImageInspectOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "image inspect";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/images/{}/json", require_name(Self::NAME, "name", &self.name)?))
    }
}

/// `GET /images/search`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageSearchOptions {
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
    #[serde(skip)]
    pub access: RegistryAccess,
}

impl Operation for ImageSearchOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "image search";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/search".to_string())
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.access.registry_auth.as_ref()))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.term.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "term",
            });
        }
        Ok(())
    }
}

/// `GET /images/get`: export one or more images as a tarball.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageGetOptions {
    pub names: Vec<String>,
}

impl Operation for ImageGetOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "image get";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/images/get".to_string())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.names.is_empty() {
            return Err(ValidationError::MissingField {
                operation: Self::NAME,
                field: "names",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AuthConfig, REGISTRY_AUTH_HEADER};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_dangling() {
        let options = ImageListOptions {
            filters: Filters::new().with("dangling", "true"),
            ..Default::default()
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.path, "/images/json");
        assert_eq!(
            request.query,
            vec![("filters".to_string(), r#"{"dangling":["true"]}"#.to_string())]
        );
    }

    #[test]
    fn test_build_query() {
        let options = ImageBuildOptions {
            tags: vec!["app:1".into(), "app:latest".into()],
            memory: Some(1 << 30),
            memory_swap: Some(-1),
            build_args: [("VERSION".to_string(), "1.2".to_string())].into(),
            ulimits: vec![Ulimit {
                name: "nofile".into(),
                soft: 1024,
                hard: 2048,
            }],
            isolation: Some(Isolation::Process),
            context: Bytes::from_static(b"context"),
            ..Default::default()
        };
        let request = options.to_request().unwrap();

        assert_eq!(request.query_values("t"), vec!["app:1", "app:latest"]);
        assert_eq!(request.query_values("memswap"), vec!["-1"]);
        assert_eq!(request.query_values("buildargs"), vec![r#"{"VERSION":"1.2"}"#]);
        assert_eq!(
            request.query_values("ulimits"),
            vec![r#"[{"Name":"nofile","Soft":1024,"Hard":2048}]"#]
        );
        assert_eq!(request.query_values("isolation"), vec!["process"]);
        assert!(request.header(REGISTRY_CONFIG_HEADER).is_none());
    }

    #[test]
    fn test_build_registry_config_header() {
        let mut options = ImageBuildOptions {
            remote_context: Some("https://example.com/ctx.tar".into()),
            ..Default::default()
        };
        options
            .auth_configs
            .insert("docker.io", AuthConfig::basic("u", "p", "docker.io"));
        let request = options.to_request().unwrap();
        assert!(request.header(REGISTRY_CONFIG_HEADER).is_some());
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_build_needs_context() {
        assert!(ImageBuildOptions::default().to_request().is_err());
    }

    #[test]
    fn test_pull_defaults_to_latest() {
        let request = ImagePullOptions::new("redis").to_request().unwrap();
        assert_eq!(request.path, "/images/create");
        assert_eq!(
            request.query,
            vec![
                ("fromImage".to_string(), "redis".to_string()),
                ("tag".to_string(), "latest".to_string()),
            ]
        );
        assert!(request.header(REGISTRY_AUTH_HEADER).is_none());
    }

    #[test]
    fn test_pull_pinned_digest_wins_over_tag() {
        let digest = "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270";
        let request = ImagePullOptions::new(format!("redis:7@{digest}"))
            .to_request()
            .unwrap();
        assert_eq!(
            request.query,
            vec![
                ("fromImage".to_string(), "redis".to_string()),
                ("tag".to_string(), digest.to_string()),
            ]
        );
    }

    #[test]
    fn test_pull_all_tags() {
        let options = ImagePullOptions {
            all: true,
            ..ImagePullOptions::new("redis")
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.query_values("tag"), Vec::<&str>::new());

        let conflicting = ImagePullOptions {
            all: true,
            ..ImagePullOptions::new("redis:7")
        };
        assert!(conflicting.to_request().is_err());
    }

    #[test]
    fn test_pull_with_credentials() {
        let auth = AuthConfig::basic("u", "p", "registry.example.com")
            .encode()
            .unwrap();
        let expected = auth.as_str().to_string();
        let options = ImagePullOptions::new("registry.example.com/team/app:v1")
            .with_access(RegistryAccess::with_auth(auth));
        let request = options.to_request().unwrap();
        assert_eq!(request.header(REGISTRY_AUTH_HEADER), Some(expected.as_str()));
        assert_eq!(
            request.query_values("fromImage"),
            vec!["registry.example.com/team/app"]
        );
    }

    #[test]
    fn test_push_path_and_tag() {
        let request = ImagePushOptions::new("localhost:5000/app:v2")
            .to_request()
            .unwrap();
        assert_eq!(request.path, "/images/localhost:5000/app/push");
        assert_eq!(request.query_values("tag"), vec!["v2"]);
    }

    #[test]
    fn test_remove_noprune_is_inverted() {
        let options = ImageRemoveOptions {
            name: "old".into(),
            prune_children: Some(false),
            ..Default::default()
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.query_values("noprune"), vec!["1"]);

        let options = ImageRemoveOptions {
            name: "old".into(),
            ..Default::default()
        };
        assert!(options.to_request().unwrap().query.is_empty());
    }

    #[test]
    fn test_import_from_archive() {
        let mut options =
            ImageImportOptions::new(ImageImportSource::Archive(Bytes::from_static(b"tar")));
        options.repo = Some("imported".into());
        options.changes = vec!["CMD [\"sh\"]".into(), "ENV A=1".into()];
        let request = options.to_request().unwrap();

        assert_eq!(request.query[0], ("fromSrc".to_string(), "-".to_string()));
        assert_eq!(request.query_values("changes").len(), 2);
        assert!(matches!(request.body, Body::Raw(_)));
    }

    #[test]
    fn test_create_exclusive_sources() {
        assert!(ImageCreateOptions::default().to_request().is_err());
        let options = ImageCreateOptions {
            from_image: Some("alpine".into()),
            tag: Some("3.19".into()),
            ..Default::default()
        };
        assert!(options.to_request().is_ok());
    }

    #[test]
    fn test_search_and_get() {
        let options = ImageSearchOptions {
            term: "nginx".into(),
            limit: Some(10),
            filters: Filters::new().with("is-official", "true"),
            ..Default::default()
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.query_values("term"), vec!["nginx"]);
        assert_eq!(request.query_values("limit"), vec!["10"]);

        let get = ImageGetOptions {
            names: vec!["a".into(), "b".into()],
        };
        assert_eq!(get.to_request().unwrap().query_values("names"), vec!["a", "b"]);
        assert!(ImageGetOptions::default().to_request().is_err());
    }
}
