//! Error taxonomy for the configuration and deferred phases.

use thiserror::Error;

/// Errors raised while configuring the task graph.
///
/// Every variant is fatal for the configuration phase; nothing here is
/// retried.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A required task could not be located by name.
    #[error("task not found in graph: {name}")]
    TaskNotFound { name: String },

    /// A task with the same name was registered twice.
    #[error("task already registered: {name}")]
    DuplicateTask { name: String },

    /// A selector could not be interpreted.
    #[error("malformed task selector: {reason}")]
    InvalidSelector { reason: String },

    /// A task was added after the graph stopped accepting changes.
    #[error("task graph is frozen; cannot add task {name}")]
    GraphFrozen { name: String },

    /// A deferred action raised while mutating configuration.
    #[error("deferred action '{action}' failed on {target}: {source}")]
    DeferredActionFailed {
        action: String,
        target: String,
        #[source]
        source: Box<PolicyError>,
    },

    /// The deferred phase already ran against this build.
    #[error("deferred phase already completed for this build (phase: {phase})")]
    PhaseAlreadyRun { phase: String },

    /// The publish gate was asked to transition a second time.
    #[error("publish gate already applied (state: {state})")]
    GateAlreadyApplied { state: String },

    /// A policy rejected the task it was applied to.
    #[error("policy violation: {0}")]
    Policy(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
