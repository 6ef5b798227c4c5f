use reqwest::Method;
use serde::Serialize;

use super::{Body, Header, Operation, registry_auth_header, require};
use crate::error::{EncodingError, ValidationError};
use crate::filters::{Filters, serialize_filters};
use crate::registry::RegistryAuth;
use crate::swarm::{NodeSpec, ObjectVersion, ServiceSpec};

/// `GET /nodes`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeListOptions {
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for NodeListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "node list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/nodes".to_string())
    }
}

/// `POST /nodes/{id}/update`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeUpdateOptions {
    #[serde(skip)]
    pub id: String,
    /// Version of the node object being updated
    pub version: u64,
    #[serde(skip)]
    pub spec: NodeSpec,
}

impl NodeUpdateOptions {
    pub fn new(id: impl Into<String>, version: ObjectVersion, spec: NodeSpec) -> Self {
        Self {
            id: id.into(),
            version: version.index,
            spec,
        }
    }
}

impl Operation for NodeUpdateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "node update";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/nodes/{}/update", require(Self::NAME, "id", &self.id)?))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.spec)
    }
}

/// `DELETE /nodes/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeRemoveOptions {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl Operation for NodeRemoveOptions {
    const METHOD: Method = Method::DELETE;
    const NAME: &'static str = "node remove";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/nodes/{}", require(Self::NAME, "id", &self.id)?))
    }
}

/// `POST /services/create`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceCreateOptions {
    #[serde(skip)]
    pub spec: ServiceSpec,
    #[serde(skip)]
    pub registry_auth: Option<RegistryAuth>,
}

impl Operation for ServiceCreateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "service create";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/services/create".to_string())
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.registry_auth.as_ref()))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.spec)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.spec.validate()
    }
}

/// `POST /services/{id}/update`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceUpdateOptions {
    #[serde(skip)]
    pub id: String,
    pub version: u64,
    #[serde(skip)]
    pub spec: ServiceSpec,
    #[serde(skip)]
    pub registry_auth: Option<RegistryAuth>,
}

impl ServiceUpdateOptions {
    pub fn new(id: impl Into<String>, version: ObjectVersion, spec: ServiceSpec) -> Self {
        Self {
            id: id.into(),
            version: version.index,
            spec,
            registry_auth: None,
        }
    }
}

impl Operation for ServiceUpdateOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "service update";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/services/{}/update", require(Self::NAME, "id", &self.id)?))
    }

    fn headers(&self) -> Result<Vec<Header>, EncodingError> {
        Ok(registry_auth_header(self.registry_auth.as_ref()))
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.spec)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.spec.validate()
    }
}

/// `DELETE /services/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceRemoveOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for ServiceRemoveOptions {
    const METHOD: Method = Method::DELETE;
    const NAME: &'static str = "service remove";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/services/{}", require(Self::NAME, "id", &self.id)?))
    }
}

/// `GET /services`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceListOptions {
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for ServiceListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "service list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/services".to_string())
    }
}

/// `GET /tasks`
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskListOptions {
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for TaskListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "task list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/tasks".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AuthConfig, REGISTRY_AUTH_HEADER};
    use crate::swarm::NodeAvailability;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_service_create_body_and_header() {
        let options = ServiceCreateOptions {
            spec: ServiceSpec::replicated("web", "nginx:1.25", 2),
            registry_auth: Some(AuthConfig::basic("u", "p", "docker.io").encode().unwrap()),
        };
        let request = options.to_request().unwrap();

        assert_eq!(request.path, "/services/create");
        assert!(request.header(REGISTRY_AUTH_HEADER).is_some());
        assert_eq!(
            request.json_body().unwrap()["Mode"],
            serde_json::json!({"Replicated": {"Replicas": 2}})
        );
    }

    #[test]
    fn test_service_update_version() {
        let options = ServiceUpdateOptions::new(
            "web",
            ObjectVersion { index: 42 },
            ServiceSpec::replicated("web", "nginx:1.26", 2),
        );
        let request = options.to_request().unwrap();
        assert_eq!(request.path, "/services/web/update");
        assert_eq!(request.query_values("version"), vec!["42"]);
    }

    #[test]
    fn test_node_update() {
        let spec = NodeSpec {
            availability: Some(NodeAvailability::Drain),
            ..Default::default()
        };
        let request = NodeUpdateOptions::new("node-1", ObjectVersion { index: 7 }, spec)
            .to_request()
            .unwrap();
        assert_eq!(request.path, "/nodes/node-1/update");
        assert_eq!(request.query_values("version"), vec!["7"]);
        assert_eq!(request.json_body().unwrap()["Availability"], "drain");
    }

    #[test]
    fn test_task_list_filters() {
        let options = TaskListOptions {
            filters: Filters::new().with("service", "web").with("desired-state", "running"),
        };
        assert_eq!(
            options.to_request().unwrap().query_values("filters"),
            vec![r#"{"desired-state":["running"],"service":["web"]}"#]
        );
    }
}
