//! Error types for CredRank
//!
//! Provides a single error enum shared by the graph engine and the CLI:
//! - Distinct error types for structural, evaluator and internal failures
//! - Stable machine-readable error codes
//! - Process exit code mapping

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    InvalidOptions,
    NodeNotFound,
    InvalidFormat,

    // Graph structure errors (2xxx)
    AddressConflict,
    MissingEndpoint,
    DanglingEdge,
    EmptyGraph,

    // Evaluator errors (3xxx)
    UnweightableEdge,

    // Internal errors (9xxx)
    InvariantViolation,
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Input (1xxx)
            ErrorCode::InvalidOptions => 1001,
            ErrorCode::NodeNotFound => 1002,
            ErrorCode::InvalidFormat => 1003,

            // Graph structure (2xxx)
            ErrorCode::AddressConflict => 2001,
            ErrorCode::MissingEndpoint => 2002,
            ErrorCode::DanglingEdge => 2003,
            ErrorCode::EmptyGraph => 2004,

            // Evaluator (3xxx)
            ErrorCode::UnweightableEdge => 3001,

            // Internal (9xxx)
            ErrorCode::InvariantViolation => 9001,
            ErrorCode::InternalError => 9002,
            ErrorCode::ConfigurationError => 9003,
            ErrorCode::SerializationError => 9004,
            ErrorCode::IoError => 9005,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Node not found: {address}")]
    NodeNotFound { address: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Graph structure errors
    #[error("Address conflict: edge {address} already exists as {existing}, cannot add {attempted}")]
    AddressConflict {
        address: String,
        existing: String,
        attempted: String,
    },

    #[error("Missing endpoint: edge {edge} references absent node {endpoint}")]
    MissingEndpoint { edge: String, endpoint: String },

    #[error("Dangling edge: cannot remove node {node} while edge {edge} references it")]
    DanglingEdge { node: String, edge: String },

    #[error("Graph has no nodes, no distribution exists")]
    EmptyGraph,

    // Evaluator errors
    #[error("Unweightable edge {edge}: forward weight {forward}, backward weight {backward}")]
    UnweightableEdge {
        edge: String,
        forward: f64,
        backward: f64,
    },

    // Internal errors
    #[error("Invariant violation: {message}")]
    Invariant { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an internal invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        AppError::Invariant {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidOptions { .. } => ErrorCode::InvalidOptions,
            AppError::Validation(_) => ErrorCode::InvalidOptions,
            AppError::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::AddressConflict { .. } => ErrorCode::AddressConflict,
            AppError::MissingEndpoint { .. } => ErrorCode::MissingEndpoint,
            AppError::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            AppError::EmptyGraph => ErrorCode::EmptyGraph,
            AppError::UnweightableEdge { .. } => ErrorCode::UnweightableEdge,
            AppError::Invariant { .. } => ErrorCode::InvariantViolation,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Config(_) => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Errors caused by the caller's graph, evaluator or options
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::InvalidOptions
                | ErrorCode::NodeNotFound
                | ErrorCode::InvalidFormat
                | ErrorCode::AddressConflict
                | ErrorCode::MissingEndpoint
                | ErrorCode::DanglingEdge
                | ErrorCode::EmptyGraph
                | ErrorCode::UnweightableEdge
        )
    }

    /// Defects inside the engine rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::InvariantViolation | ErrorCode::InternalError
        )
    }

    /// Process exit code for the command line front end
    pub fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            2
        } else if self.is_internal() {
            70
        } else {
            1
        }
    }
}
