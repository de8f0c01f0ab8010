//! Workflow error taxonomy

use crate::models::workflow::StepKindTag;
use thiserror::Error;

/// Errors that escape the engine boundary
///
/// Expected per-step failures (template resolution, handler errors) never
/// appear here; they are recorded on the returned `WorkflowExecution` as
/// failed step results. Only the conditions below surface as `Err`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow id did not resolve in the catalog
    #[error("unknown workflow: '{0}'")]
    UnknownWorkflow(String),

    /// The caller supplied an empty or blank query
    #[error("query must not be empty")]
    EmptyQuery,

    /// No handler was registered for a step kind the definition uses
    #[error("no handler registered for step kind '{0}'")]
    MissingHandler(StepKindTag),

    /// The execution task was cancelled before completing
    #[error("workflow execution cancelled")]
    Cancelled,

    /// Unexpected internal failure
    #[error("internal workflow error: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
