use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;

use super::{Body, Operation, engine_timestamp};
use crate::error::{EncodingError, ValidationError};
use crate::filters::{Filters, serialize_filters};
use crate::registry::AuthConfig;

/// `GET /events`
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(serialize_with = "serialize_filters", skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
}

impl EventsOptions {
    pub fn since_time(mut self, time: DateTime<Utc>) -> Self {
        self.since = Some(engine_timestamp(time));
        self
    }

    pub fn until_time(mut self, time: DateTime<Utc>) -> Self {
        self.until = Some(engine_timestamp(time));
        self
    }
}

impl Operation for EventsOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "events";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/events".to_string())
    }
}

/// `GET /version`
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VersionOptions;

impl Operation for VersionOptions {
    const METHOD: Method = Method::GET;
    const NAME: &'static str = "version";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/version".to_string())
    }
}

/// `POST /auth`: check credentials against a registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthOptions {
    #[serde(skip)]
    pub config: AuthConfig,
}

impl Operation for AuthOptions {
    const METHOD: Method = Method::POST;
    const NAME: &'static str = "auth";

    fn path(&self) -> Result<String, ValidationError> {
        Ok("/auth".to_string())
    }

    fn body(&self) -> Result<Body, EncodingError> {
        Body::json(&self.config)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.config.validate()
    }
}
