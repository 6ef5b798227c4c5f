use reqwest::Method;
use serde::Serialize;

use super::{Operation, require};
use crate::error::ValidationError;
use crate::filters::{Filters, serialize_filters};

/// `GET /networks`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkListOptions {
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for NetworkListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "network list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/networks".to_string())
    }
}

/// `GET /networks/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkInspectOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for NetworkInspectOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "network inspect";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/networks/{}", require(Self::NAME, "id", &self.id)?))
    }
}

/// `DELETE /networks/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkRemoveOptions {
    #[serde(skip)]
    pub id: String,
}

impl Operation for NetworkRemoveOptions {
    const METHOD: Method = Method::DELETE;
    const NAME: &'static str = "network remove";

    fn path(&self) -> Result<String, ValidationError> {
        Ok(format!("/networks/{}", require(Self::NAME, "id", &self.id)?))
    }
}

/// `GET /volumes`
#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeListOptions {
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl Operation for VolumeListOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "volume list";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/volumes".to_string())
    }
}
