//! Human-readable projection of a workflow execution

use serde::{Deserialize, Serialize};

use crate::models::workflow::{ExecutionStatus, StepStatus, WorkflowExecution};
use crate::workflow::template::value_to_text;

/// One step of a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Step id
    pub step_id: String,
    /// Terminal step status
    pub status: StepStatus,
    /// Text form of the step output, when one was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error detail, when the step failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Step duration in milliseconds, when timed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Display-oriented view of a [`WorkflowExecution`]
///
/// A pure projection: entries mirror the execution's step results in the
/// same order, nothing is added or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Workflow that ran
    pub workflow_id: String,
    /// Overall status
    pub status: ExecutionStatus,
    /// Per-step entries in execution order
    pub entries: Vec<TranscriptEntry>,
    /// Total duration in milliseconds, when the run finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Transcript {
    /// Project an execution into its transcript
    pub fn from_execution(execution: &WorkflowExecution) -> Self {
        let entries = execution
            .step_results
            .iter()
            .map(|result| TranscriptEntry {
                step_id: result.step_id.clone(),
                status: result.status,
                output: result.output.as_ref().map(value_to_text),
                error: result.error.as_ref().map(|e| e.message.clone()),
                duration_ms: result.duration_ms(),
            })
            .collect();

        let duration_ms = execution
            .finished_at
            .map(|end| (end - execution.started_at).num_milliseconds().max(0) as u64);

        Self {
            workflow_id: execution.workflow_id.clone(),
            status: execution.status.clone(),
            entries,
            duration_ms,
        }
    }

    /// Render the transcript as plain text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Workflow: {}\n", self.workflow_id));
        out.push_str(&format!("Status:   {:?}\n", self.status));
        if let Some(duration_ms) = self.duration_ms {
            out.push_str(&format!("Duration: {} ms\n", duration_ms));
        }
        out.push('\n');

        for (index, entry) in self.entries.iter().enumerate() {
            let marker = match entry.status {
                StepStatus::Completed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Skipped => "-",
                StepStatus::Pending | StepStatus::Running => "…",
            };
            out.push_str(&format!("{} [{}] {}", marker, index + 1, entry.step_id));
            if let Some(duration_ms) = entry.duration_ms {
                out.push_str(&format!(" ({} ms)", duration_ms));
            }
            out.push('\n');

            if let Some(output) = &entry.output {
                for line in output.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            }
            if let Some(error) = &entry.error {
                out.push_str(&format!("    error: {}\n", error));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::{StepError, StepErrorKind, StepResult};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_execution() -> WorkflowExecution {
        let start = Utc::now();
        WorkflowExecution {
            id: Uuid::new_v4(),
            workflow_id: "content-brief".to_string(),
            conversation_id: "conv-1".to_string(),
            user_id: "user-1".to_string(),
            status: ExecutionStatus::Failed,
            step_results: vec![
                StepResult {
                    status: StepStatus::Completed,
                    output: Some(serde_json::json!("page body")),
                    started_at: Some(start),
                    finished_at: Some(start + chrono::Duration::milliseconds(12)),
                    ..StepResult::pending("fetch")
                },
                StepResult {
                    status: StepStatus::Failed,
                    error: Some(StepError::new(StepErrorKind::Handler, "provider error")),
                    started_at: Some(start),
                    finished_at: Some(start),
                    ..StepResult::pending("summarize")
                },
                StepResult::skipped("format"),
            ],
            started_at: start,
            finished_at: Some(start + chrono::Duration::milliseconds(20)),
        }
    }

    #[test]
    fn test_transcript_preserves_step_order() {
        let execution = sample_execution();
        let transcript = Transcript::from_execution(&execution);

        assert_eq!(transcript.entries.len(), execution.step_results.len());
        let ids: Vec<_> = transcript.entries.iter().map(|e| e.step_id.as_str()).collect();
        assert_eq!(ids, vec!["fetch", "summarize", "format"]);
    }

    #[test]
    fn test_transcript_carries_outputs_and_errors() {
        let transcript = Transcript::from_execution(&sample_execution());

        assert_eq!(transcript.entries[0].output.as_deref(), Some("page body"));
        assert_eq!(transcript.entries[1].error.as_deref(), Some("provider error"));
        assert!(transcript.entries[2].output.is_none());
        assert_eq!(transcript.entries[2].status, StepStatus::Skipped);
    }

    #[test]
    fn test_transcript_text_rendering() {
        let text = Transcript::from_execution(&sample_execution()).to_text();

        assert!(text.contains("Workflow: content-brief"));
        assert!(text.contains("✓ [1] fetch"));
        assert!(text.contains("✗ [2] summarize"));
        assert!(text.contains("- [3] format"));
        assert!(text.contains("error: provider error"));

        // Order is preserved in the rendering as well
        let fetch_pos = text.find("fetch").unwrap();
        let summarize_pos = text.find("summarize").unwrap();
        let format_pos = text.find("[3] format").unwrap();
        assert!(fetch_pos < summarize_pos && summarize_pos < format_pos);
    }

    #[test]
    fn test_transcript_is_serializable() {
        let transcript = Transcript::from_execution(&sample_execution());
        let json = serde_json::to_string(&transcript).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entries.len(), 3);
        assert_eq!(parsed.workflow_id, "content-brief");
    }
}
