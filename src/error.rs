// Error taxonomy: transport (ClientError), protocol (ParseError), startup (ConfigError).
// PollError is the clonable form carried inside a RigSnapshot.

use thiserror::Error;

/// Transport failure talking to one rig.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {addr} timed out after {timeout_ms} ms")]
    ConnectTimeout { addr: String, timeout_ms: u64 },

    #[error("connection to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Field extraction failure. Parsers return this instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown response format (no KHS 5s / KHS 30s marker)")]
    UnknownFormat,

    #[error("field not found: {field}")]
    FieldNotFound { field: &'static str },

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Why a rig snapshot is degraded. Rendered as an "unavailable" marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("unable to contact rig: {0}")]
    Unreachable(String),

    #[error("no response from API")]
    NoResponse,

    #[error("bad gpucount response: {0}")]
    BadGpuCount(ParseError),
}

impl From<ClientError> for PollError {
    fn from(e: ClientError) -> Self {
        PollError::Unreachable(e.to_string())
    }
}
