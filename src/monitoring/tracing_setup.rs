use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{ConfigError, Result, WharfError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging settings, the `[logging]` section of the client config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    pub enable_json_logs: bool,
    /// Pretty multi-line console output with targets and source locations
    pub structured_logging: bool,
    pub enable_file_logging: bool,
    /// Daily-rotated log file; the directory is created on startup
    pub log_file_path: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_json_logs: false,
            structured_logging: false,
            enable_file_logging: false,
            log_file_path: String::new(),
        }
    }
}

impl TracingConfig {
    /// Installs the global subscriber. Keep the returned guard alive for as
    /// long as file logging should flush.
    pub fn init_tracing(&self) -> Result<Option<WorkerGuard>> {
        let mut layers: Vec<BoxedLayer> = vec![self.console_layer()];

        let guard = if self.enable_file_logging {
            let (layer, guard) = self.file_layer()?;
            layers.push(layer);
            Some(guard)
        } else {
            None
        };

        Registry::default()
            .with(layers)
            .with(self.env_filter())
            .try_init()
            .map_err(|e| {
                WharfError::Config(ConfigError::InvalidValue {
                    field: "logging".to_string(),
                    reason: format!("tracing subscriber already installed: {e}"),
                })
            })?;

        tracing::debug!(
            level = %self.log_level,
            json = self.enable_json_logs,
            file = self.enable_file_logging,
            "Tracing initialized"
        );
        Ok(guard)
    }

    /// `RUST_LOG` wins over the configured level; a bad directive falls back
    /// to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn console_layer(&self) -> BoxedLayer {
        if self.enable_json_logs {
            fmt::layer()
                .with_writer(io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .boxed()
        } else if self.structured_logging {
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact()
                .boxed()
        }
    }

    fn file_layer(&self) -> Result<(BoxedLayer, WorkerGuard)> {
        let (dir, file_name) = self.log_file_parts()?;
        std::fs::create_dir_all(&dir)?;

        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .boxed();
        Ok((layer, guard))
    }

    fn log_file_parts(&self) -> Result<(PathBuf, String)> {
        let path = Path::new(&self.log_file_path);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                WharfError::Config(ConfigError::InvalidValue {
                    field: "logging.log_file_path".to_string(),
                    reason: format!("'{}' does not name a file", self.log_file_path),
                })
            })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((dir, file_name.to_string()))
    }
}
