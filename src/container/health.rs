use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::codec::duration_nanos;
use crate::error::ValidationError;

/// Settings for the HEALTHCHECK feature.
///
/// `test` is kept in its wire shape; [`HealthConfig::test_kind`] gives the
/// typed view and is what validation runs against. Zero interval, timeout and
/// retries mean "inherit from the image or engine default" and are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(rename = "Test", default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<String>,

    /// Time to wait between checks.
    #[serde(
        rename = "Interval",
        default,
        with = "duration_nanos",
        skip_serializing_if = "Duration::is_zero"
    )]
    pub interval: Duration,

    /// Time to wait before considering a check to have hung.
    #[serde(
        rename = "Timeout",
        default,
        with = "duration_nanos",
        skip_serializing_if = "Duration::is_zero"
    )]
    pub timeout: Duration,

    /// Consecutive failures needed to consider the container unhealthy.
    #[serde(rename = "Retries", default, skip_serializing_if = "is_zero")]
    pub retries: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// The four forms a health-check test can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthTest {
    /// `[]`
    Inherit,
    /// `["NONE"]`
    Disable,
    /// `["CMD", args...]`
    Exec(Vec<String>),
    /// `["CMD-SHELL", command]`
    Shell(String),
}

impl HealthTest {
    pub fn parse(test: &[String]) -> Result<Self, ValidationError> {
        let Some((head, rest)) = test.split_first() else {
            return Ok(HealthTest::Inherit);
        };

        match head.as_str() {
            "NONE" if rest.is_empty() => Ok(HealthTest::Disable),
            "NONE" => Err(invalid("NONE takes no arguments")),
            "CMD" if rest.is_empty() => Err(invalid("CMD requires at least one argument")),
            "CMD" => Ok(HealthTest::Exec(rest.to_vec())),
            "CMD-SHELL" => match rest {
                [command] => Ok(HealthTest::Shell(command.clone())),
                _ => Err(invalid(&format!(
                    "CMD-SHELL takes exactly one command string, got {}",
                    rest.len()
                ))),
            },
            other => Err(invalid(&format!("unrecognized test keyword '{other}'"))),
        }
    }

    pub fn to_wire(&self) -> Vec<String> {
        match self {
            HealthTest::Inherit => Vec::new(),
            HealthTest::Disable => vec!["NONE".to_string()],
            HealthTest::Exec(args) => std::iter::once("CMD".to_string())
                .chain(args.iter().cloned())
                .collect(),
            HealthTest::Shell(cmd) => vec!["CMD-SHELL".to_string(), cmd.clone()],
        }
    }
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::InvalidHealthCheck {
        reason: reason.to_string(),
    }
}

impl HealthConfig {
    pub fn new(test: HealthTest) -> Self {
        Self {
            test: test.to_wire(),
            ..Default::default()
        }
    }

    /// Health check that turns off any check inherited from the image.
    pub fn disabled() -> Self {
        Self::new(HealthTest::Disable)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn test_kind(&self) -> Result<HealthTest, ValidationError> {
        HealthTest::parse(&self.test)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.test_kind().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test_case(&[], HealthTest::Inherit ; "empty inherits")]
    #[test_case(&["NONE"], HealthTest::Disable ; "none disables")]
    #[test_case(&["CMD", "curl", "-f", "http://localhost"], HealthTest::Exec(strings(&["curl", "-f", "http://localhost"])) ; "cmd exec form")]
    #[test_case(&["CMD-SHELL", "x"], HealthTest::Shell("x".into()) ; "cmd shell form")]
    fn test_valid_forms(test: &[&str], expected: HealthTest) {
        assert_eq!(HealthTest::parse(&strings(test)).unwrap(), expected);
    }

    #[test_case(&["CMD-SHELL", "x", "y"] ; "shell with two args")]
    #[test_case(&["CMD-SHELL"] ; "shell without command")]
    #[test_case(&["BOGUS"] ; "unknown keyword")]
    #[test_case(&["CMD"] ; "cmd without argv")]
    #[test_case(&["NONE", "extra"] ; "none with args")]
    fn test_invalid_forms(test: &[&str]) {
        assert!(matches!(
            HealthTest::parse(&strings(test)),
            Err(ValidationError::InvalidHealthCheck { .. })
        ));
    }

    #[test]
    fn test_inherit_and_disable_are_distinct_on_the_wire() {
        let inherit = serde_json::to_value(HealthConfig::default()).unwrap();
        let disable = serde_json::to_value(HealthConfig::disabled()).unwrap();
        assert_eq!(inherit, serde_json::json!({}));
        assert_eq!(disable, serde_json::json!({"Test": ["NONE"]}));
    }

    #[test]
    fn test_durations_are_nanoseconds() {
        let hc = HealthConfig::new(HealthTest::Shell("pg_isready".into()))
            .with_interval(Duration::from_secs(30))
            .with_timeout(Duration::from_millis(2500))
            .with_retries(3);

        assert_eq!(
            serde_json::to_value(&hc).unwrap(),
            serde_json::json!({
                "Test": ["CMD-SHELL", "pg_isready"],
                "Interval": 30_000_000_000i64,
                "Timeout": 2_500_000_000i64,
                "Retries": 3
            })
        );

        let back: HealthConfig = serde_json::from_value(serde_json::to_value(&hc).unwrap()).unwrap();
        assert_eq!(back, hc);
    }
}
