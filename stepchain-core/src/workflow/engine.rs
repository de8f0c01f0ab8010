//! Sequential workflow execution engine

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::workflow::{
    ExecutionStatus, StepError, StepErrorKind, StepResult, StepSpec, StepStatus,
    WorkflowDefinition, WorkflowExecution,
};
use crate::workflow::catalog::WorkflowCatalog;
use crate::workflow::context::{ExecutionContext, ExecutionRequest};
use crate::workflow::error::{Result, WorkflowError};
use crate::workflow::executor::{HandlerRegistry, StepContext};
use crate::workflow::template;

/// Workflow execution engine
///
/// Runs a definition's steps strictly in order, threading earlier outputs
/// into later templates through the execution-scoped cache. Each call to
/// [`WorkflowEngine::execute`] owns its context, so the engine itself holds
/// no per-run mutable state and may be shared across concurrent executions.
pub struct WorkflowEngine {
    /// Workflow catalog
    catalog: Arc<WorkflowCatalog>,
    /// Step kind handlers
    handlers: Arc<HandlerRegistry>,
}

impl WorkflowEngine {
    /// Create a new engine over a catalog and handler registry
    pub fn new(catalog: Arc<WorkflowCatalog>, handlers: Arc<HandlerRegistry>) -> Self {
        Self { catalog, handlers }
    }

    /// Validate a request against the catalog without running it
    pub fn check_request(&self, request: &ExecutionRequest) -> Result<()> {
        if self.catalog.get(&request.workflow_id).is_none() {
            return Err(WorkflowError::UnknownWorkflow(request.workflow_id.clone()));
        }
        if request.query.trim().is_empty() {
            return Err(WorkflowError::EmptyQuery);
        }
        Ok(())
    }

    /// Execute a workflow from start to terminal status
    ///
    /// Returns `Err` only for an unknown workflow id, an empty query, or an
    /// engine misconfiguration; every expected step-level failure is
    /// captured in the returned [`WorkflowExecution`].
    pub async fn execute(&self, request: ExecutionRequest) -> Result<WorkflowExecution> {
        self.check_request(&request)?;

        let definition = self
            .catalog
            .get(&request.workflow_id)
            .ok_or_else(|| WorkflowError::UnknownWorkflow(request.workflow_id.clone()))?;

        // Resolve every handler up front so a misconfigured registry fails
        // before any step result is created
        for step in &definition.steps {
            if self.handlers.get(step.kind.tag()).is_none() {
                return Err(WorkflowError::MissingHandler(step.kind.tag()));
            }
        }

        let execution_id = Uuid::new_v4();
        let mut ctx = ExecutionContext::new(&request);
        let mut execution = WorkflowExecution {
            id: execution_id,
            workflow_id: definition.id.clone(),
            conversation_id: request.conversation_id.clone(),
            user_id: request.user_id.clone(),
            status: ExecutionStatus::Running,
            step_results: Vec::with_capacity(definition.steps.len()),
            started_at: Utc::now(),
            finished_at: None,
        };

        tracing::info!(
            execution_id = %execution_id,
            workflow_id = %definition.id,
            steps = definition.steps.len(),
            "Starting workflow execution"
        );

        let mut required_step_failed = false;

        for step in &definition.steps {
            if required_step_failed {
                execution.step_results.push(StepResult::skipped(&step.id));
                continue;
            }

            let result = self.run_step(definition, step, &mut ctx, execution_id).await;

            if result.status == StepStatus::Failed && step.required {
                tracing::warn!(
                    execution_id = %execution_id,
                    step_id = %step.id,
                    "Required step failed - skipping remaining steps"
                );
                required_step_failed = true;
            }

            execution.step_results.push(result);
        }

        execution.status = finalize_status(&execution.step_results, required_step_failed);
        execution.finished_at = Some(Utc::now());

        tracing::info!(
            execution_id = %execution_id,
            status = ?execution.status,
            "Workflow execution finished"
        );

        Ok(execution)
    }

    /// Run one step: render its template, dispatch to the handler, record
    /// the outcome, and cache the output on success
    async fn run_step(
        &self,
        definition: &WorkflowDefinition,
        step: &StepSpec,
        ctx: &mut ExecutionContext,
        execution_id: Uuid,
    ) -> StepResult {
        let mut result = StepResult::pending(&step.id);

        // Render before dispatch; a resolution failure fails the step
        let rendered = match template::render(&step.input, ctx) {
            Ok(rendered) => rendered,
            Err(e) => {
                let now = Utc::now();
                result.status = StepStatus::Failed;
                result.error = Some(StepError::new(StepErrorKind::TemplateResolution, e.to_string()));
                result.started_at = Some(now);
                result.finished_at = Some(now);
                tracing::warn!(
                    execution_id = %execution_id,
                    step_id = %step.id,
                    error = %e,
                    "Step input template failed to resolve"
                );
                return result;
            }
        };

        result.rendered_input = Some(rendered.clone());
        result.status = StepStatus::Running;
        result.started_at = Some(Utc::now());

        tracing::info!(
            execution_id = %execution_id,
            workflow_id = %definition.id,
            step_id = %step.id,
            kind = %step.kind.tag(),
            "Executing workflow step"
        );

        let step_ctx = StepContext {
            execution_id,
            user_id: ctx.user_id().to_string(),
            conversation_id: ctx.conversation_id().to_string(),
            timeout_seconds: step.timeout_seconds,
        };

        // Checked for every step before the run started
        let handler = match self.handlers.get(step.kind.tag()) {
            Some(handler) => handler,
            None => {
                result.status = StepStatus::Failed;
                result.error = Some(StepError::new(
                    StepErrorKind::Handler,
                    format!("no handler for step kind '{}'", step.kind.tag()),
                ));
                result.finished_at = Some(Utc::now());
                return result;
            }
        };

        match handler.run(step, &rendered, &step_ctx).await {
            Ok(output) => {
                ctx.cache_output(&step.id, output.clone());
                result.output = Some(output);
                result.status = StepStatus::Completed;
                result.finished_at = Some(Utc::now());
                tracing::debug!(
                    execution_id = %execution_id,
                    step_id = %step.id,
                    duration_ms = result.duration_ms(),
                    "Step completed"
                );
            }
            Err(e) => {
                result.error = Some(StepError::new(StepErrorKind::Handler, format!("{e:#}")));
                result.status = StepStatus::Failed;
                result.finished_at = Some(Utc::now());
                tracing::warn!(
                    execution_id = %execution_id,
                    step_id = %step.id,
                    error = %e,
                    "Step handler failed"
                );
            }
        }

        result
    }
}

/// Overall status once the step sequence has ended
///
/// A required failure always fails the run. Otherwise: failures (optional
/// by construction) make the run partial, a clean sweep completes it, and
/// a run in which nothing completed or failed is failed.
fn finalize_status(results: &[StepResult], required_step_failed: bool) -> ExecutionStatus {
    if required_step_failed {
        return ExecutionStatus::Failed;
    }

    let completed = results.iter().filter(|r| r.status == StepStatus::Completed).count();
    let failed = results.iter().filter(|r| r.status == StepStatus::Failed).count();

    if completed == 0 && failed == 0 {
        ExecutionStatus::Failed
    } else if failed > 0 {
        ExecutionStatus::Partial
    } else {
        ExecutionStatus::Completed
    }
}
