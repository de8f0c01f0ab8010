//! Concurrent execution tracking over the workflow engine

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::workflow::WorkflowExecution;
use crate::workflow::context::ExecutionRequest;
use crate::workflow::engine::WorkflowEngine;
use crate::workflow::error::{Result, WorkflowError};

/// Workflow orchestrator managing active workflow executions
///
/// Each execution runs as its own tokio task and owns its context, so
/// concurrent runs share nothing but the immutable engine. The orchestrator
/// only tracks task handles; results are not retained after completion.
pub struct WorkflowOrchestrator {
    /// Shared execution engine
    engine: Arc<WorkflowEngine>,
    /// Active workflow execution handles
    active: Arc<DashMap<Uuid, JoinHandle<Result<WorkflowExecution>>>>,
}

impl WorkflowOrchestrator {
    /// Create a new orchestrator over an engine
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self {
            engine,
            active: Arc::new(DashMap::new()),
        }
    }

    /// Start a workflow execution in the background
    ///
    /// Returns a tracking id for [`wait_for_completion`]. Unknown workflow
    /// ids and empty queries are rejected here, before a task is spawned.
    ///
    /// [`wait_for_completion`]: WorkflowOrchestrator::wait_for_completion
    pub fn start(&self, request: ExecutionRequest) -> Result<Uuid> {
        self.engine.check_request(&request)?;

        let tracking_id = Uuid::new_v4();
        let engine = self.engine.clone();
        let workflow_id = request.workflow_id.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(tracking_id = %tracking_id, "Starting tracked workflow execution");
            let result = engine.execute(request).await;
            tracing::info!(
                tracking_id = %tracking_id,
                success = result.is_ok(),
                "Tracked workflow execution finished"
            );
            result
        });

        self.active.insert(tracking_id, handle);

        tracing::info!(
            workflow_id = %workflow_id,
            tracking_id = %tracking_id,
            "Started workflow execution"
        );

        Ok(tracking_id)
    }

    /// Check if an execution is still being tracked
    pub fn is_running(&self, tracking_id: Uuid) -> bool {
        self.active.contains_key(&tracking_id)
    }

    /// Number of tracked executions
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Cancel a running execution
    ///
    /// Returns true if the execution was still tracked.
    pub fn cancel(&self, tracking_id: Uuid) -> bool {
        if let Some((_key, handle)) = self.active.remove(&tracking_id) {
            handle.abort();
            tracing::info!(tracking_id = %tracking_id, "Cancelled workflow execution");
            true
        } else {
            false
        }
    }

    /// Wait for an execution to complete and take its result
    pub async fn wait_for_completion(&self, tracking_id: Uuid) -> Result<WorkflowExecution> {
        let (_key, handle) = self
            .active
            .remove(&tracking_id)
            .ok_or_else(|| WorkflowError::Fatal(format!("execution {} not found", tracking_id)))?;

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(WorkflowError::Cancelled),
            Err(e) => Err(WorkflowError::Fatal(format!(
                "workflow execution task panicked: {}",
                e
            ))),
        }
    }
}
