use thiserror::Error;

/// Wharf error types, split by the stage at which a request can fail
#[derive(Error, Debug)]
pub enum WharfError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller input that is rejected before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid detach keys '{value}': {reason}")]
    InvalidDetachKeys { value: String, reason: String },

    #[error("Invalid health check test: {reason}")]
    InvalidHealthCheck { reason: String },

    #[error("Invalid filter format: {reason}")]
    FilterFormat { reason: String },

    #[error("Missing required path parameter '{parameter}' for {operation}")]
    MissingPathParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    #[error("Invalid path parameter '{parameter}' for {operation}: {value:?} {reason}")]
    InvalidPathParameter {
        operation: &'static str,
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Missing required field '{field}' for {operation}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Invalid container name: {name}")]
    InvalidName { name: String },

    #[error("Invalid port specification: {value}")]
    InvalidPort { value: String },

    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A value that cannot be represented in its wire form.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Field '{field}' cannot be encoded as a query value: {reason}")]
    Unrepresentable { field: String, reason: String },

    #[error("Invalid request URL: {0}")]
    Url(String),
}

/// Errors surfaced by the transport collaborator.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Engine returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Privilege request failed: {reason}")]
    PrivilegeDenied { reason: String },
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            TransportError::Unauthorized { .. } | TransportError::Status { status: 401, .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found at path: {path}")]
    FileNotFound { path: String },

    #[error("Invalid config format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<toml::de::Error> for WharfError {
    fn from(err: toml::de::Error) -> Self {
        WharfError::Config(ConfigError::InvalidFormat {
            reason: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for WharfError {
    fn from(err: serde_json::Error) -> Self {
        WharfError::Encoding(EncodingError::Json(err))
    }
}

/// Convenience type alias for Wharf results
pub type Result<T, E = WharfError> = std::result::Result<T, E>;
