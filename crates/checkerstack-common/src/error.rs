//! Unified error type for the checkerstack workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A referenced resource was not declared.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing item.
        kind: &'static str,
        /// Identifier of the missing item.
        id: String,
    },

    /// The resource graph contains a cycle.
    #[error("cyclic dependency detected in resource graph involving {involving}")]
    CyclicDependency {
        /// A logical id that participates in the cycle.
        involving: String,
    },

    /// A resource that must be created first is not ordered before its dependent.
    #[error("{before} must be provisioned before {after}")]
    Ordering {
        /// Resource that must come first.
        before: String,
        /// Resource that must come after.
        after: String,
    },

    /// A grant or setting would expose a resource publicly.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the offending grant.
        message: String,
    },

    /// JSON serialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML serialization failed.
    #[error("yaml serialization error: {source}")]
    Yaml {
        /// Underlying serialization error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackError>;
