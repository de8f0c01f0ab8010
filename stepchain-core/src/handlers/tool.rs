//! Tool trait, registry, and the tool-call step handler

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::models::workflow::{StepKind, StepSpec};
use crate::workflow::executor::{StepContext, StepHandler};

/// An external capability invocable from tool-call steps
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (referenced by tool-call steps)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON Schema for tool arguments
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with validated arguments
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value>;

    /// Default timeout in seconds for this tool
    fn timeout_secs(&self) -> u64 {
        30
    }
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted names of registered tools
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool by name with schema validation and a timeout
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
        timeout_override: Option<u64>,
    ) -> Result<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| anyhow!("Tool '{}' not found", name))?;

        let schema = tool.input_schema();
        let compiled = jsonschema::JSONSchema::compile(&schema)
            .map_err(|e| anyhow!("Tool '{}' has an invalid input schema: {}", name, e))?;
        if let Err(errors) = compiled.validate(&args) {
            let detail = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(anyhow!("Invalid arguments for tool '{}': {}", name, detail));
        }

        let timeout_secs = timeout_override.unwrap_or_else(|| tool.timeout_secs());
        let timeout = Duration::from_secs(timeout_secs);

        match tokio::time::timeout(timeout, tool.execute(args)).await {
            Ok(result) => result.with_context(|| format!("Tool '{}' failed", name)),
            Err(_) => Err(anyhow!("Tool '{}' timed out after {}s", name, timeout_secs)),
        }
    }
}

/// Step handler dispatching tool-call steps to a [`ToolRegistry`]
///
/// The step's rendered input is the tool's argument object: JSON object
/// input passes through as-is, anything else is wrapped as `{"text": ...}`.
pub struct ToolStepHandler {
    registry: Arc<ToolRegistry>,
}

impl ToolStepHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    fn parse_args(input: &str) -> serde_json::Value {
        match serde_json::from_str::<serde_json::Value>(input) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => serde_json::json!({ "text": input }),
        }
    }
}

#[async_trait]
impl StepHandler for ToolStepHandler {
    async fn run(
        &self,
        step: &StepSpec,
        input: &str,
        ctx: &StepContext,
    ) -> Result<serde_json::Value> {
        let tool_name = match &step.kind {
            StepKind::ToolCall { tool } => tool.as_str(),
            other => {
                return Err(anyhow!(
                    "tool handler invoked for step kind '{}'",
                    other.tag()
                ))
            }
        };

        let args = Self::parse_args(input);

        tracing::debug!(
            step_id = %step.id,
            tool = %tool_name,
            "Invoking tool"
        );

        self.registry
            .execute(tool_name, args, ctx.timeout_seconds)
            .await
    }
}
