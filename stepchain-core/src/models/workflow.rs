//! Workflow execution data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall status of a workflow execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Execution is actively running steps
    Running,
    /// Every step completed
    Completed,
    /// A required step failed (or nothing ran at all)
    Failed,
    /// Only optional steps failed; the rest completed
    Partial,
}

/// Status of a single step within an execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet reached
    Pending,
    /// Handler call in flight
    Running,
    /// Handler returned an output
    Completed,
    /// Template resolution or handler call failed
    Failed,
    /// Never attempted because an earlier required step failed
    Skipped,
}

/// Step kind with its kind-specific configuration
///
/// Closed variant set: the engine dispatches on the tag through a handler
/// registry built at startup, never on free-form strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Prompt a language model with the rendered input
    LlmCall {
        /// Model override for this step (handler default otherwise)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// Sampling temperature override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
    /// Invoke a registered tool with the rendered input as arguments
    ToolCall {
        /// Name of the tool to invoke
        tool: String,
    },
}

impl StepKind {
    /// Dispatch tag for handler registry lookup
    pub fn tag(&self) -> StepKindTag {
        match self {
            StepKind::LlmCall { .. } => StepKindTag::LlmCall,
            StepKind::ToolCall { .. } => StepKindTag::ToolCall,
        }
    }
}

/// Fieldless dispatch key for [`StepKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKindTag {
    LlmCall,
    ToolCall,
}

impl std::fmt::Display for StepKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKindTag::LlmCall => write!(f, "llm_call"),
            StepKindTag::ToolCall => write!(f, "tool_call"),
        }
    }
}

/// Individual step definition within a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step identifier (unique within the workflow)
    pub id: String,
    /// Step kind and its configuration
    #[serde(flatten)]
    pub kind: StepKind,
    /// Input template; may reference the query, caller parameters, and
    /// outputs of earlier steps (see `workflow::template`)
    pub input: String,
    /// Whether a failure of this step aborts the remaining sequence
    #[serde(default = "default_required")]
    pub required: bool,
    /// Maximum handler time in seconds (handler default otherwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

fn default_required() -> bool {
    true
}

/// Workflow definition - reusable template for executions
///
/// Steps form a linear chain: execution order is definition order, and a
/// step's template may only reference steps that appear before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique workflow identifier
    pub id: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered step sequence
    pub steps: Vec<StepSpec>,
}

impl WorkflowDefinition {
    /// Look up a step position by id
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }
}

/// Why a step failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    /// The input template could not be rendered
    TemplateResolution,
    /// The step handler (LLM or tool call) returned an error
    Handler,
}

/// Error detail recorded on a failed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepError {
    /// Failure classification
    pub kind: StepErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl StepError {
    pub fn new(kind: StepErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result record for one step of an execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Id of the step this result belongs to
    pub step_id: String,
    /// Terminal (or in-flight) step status
    pub status: StepStatus,
    /// Fully rendered input the handler was called with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_input: Option<String>,
    /// Handler output; opaque to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Error detail when status is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// When the step left `pending`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the step reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepResult {
    /// Fresh pending result for a step
    pub fn pending(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Pending,
            rendered_input: None,
            output: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Result for a step that was never attempted
    pub fn skipped(step_id: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            ..Self::pending(step_id)
        }
    }

    /// Step duration, when both timestamps are recorded
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds().max(0) as u64),
            _ => None,
        }
    }
}

/// Aggregate result of one workflow run
///
/// Step results appear in definition order, one per defined step, once the
/// execution reaches a terminal status. The engine does not persist this
/// record; persistence, if any, is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Unique execution identifier
    pub id: Uuid,
    /// Id of the workflow definition that ran
    pub workflow_id: String,
    /// Conversation this run belongs to
    pub conversation_id: String,
    /// Identity of the user that started the run
    pub user_id: String,
    /// Overall execution status
    pub status: ExecutionStatus,
    /// Per-step results in definition order
    pub step_results: Vec<StepResult>,
    /// When the run began
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// Result for a given step id, if recorded
    pub fn step(&self, step_id: &str) -> Option<&StepResult> {
        self.step_results.iter().find(|r| r.step_id == step_id)
    }

    /// Whether the run reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status != ExecutionStatus::Running
    }
}
