//! Error handling for virtucam

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested ONVIF control port is already taken by another camera
    #[error("Port conflict: ONVIF port {0} is already in use")]
    PortConflict(u16),

    /// Unknown camera id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Virtual interface creation against a non-existent physical interface.
    /// Carries the list of interfaces that do exist so the caller can surface it.
    #[error("Parent interface {parent} not found (available: {available:?})")]
    ParentInterfaceNotFound {
        parent: String,
        available: Vec<String>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error (relay configuration)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
