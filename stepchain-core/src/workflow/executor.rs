//! Step handler trait and registry

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::workflow::{StepKindTag, StepSpec};

/// Per-invocation data passed to a step handler
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Execution this step belongs to
    pub execution_id: Uuid,
    /// Identity of the requesting user
    pub user_id: String,
    /// Conversation the execution belongs to
    pub conversation_id: String,
    /// Effective timeout for this step, when one applies
    pub timeout_seconds: Option<u64>,
}

/// Trait for executing workflow steps
///
/// Handlers perform the external call (LLM or tool) for one step kind. Any
/// timeout or retry behavior lives behind this seam; the engine treats a
/// handler error as that step's failure and nothing more.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Execute a step with its fully rendered input
    ///
    /// # Arguments
    /// * `step` - Step definition (kind-specific configuration)
    /// * `input` - Rendered input template
    /// * `ctx` - Invocation context
    ///
    /// # Returns
    /// The step output, opaque to the engine
    async fn run(&self, step: &StepSpec, input: &str, ctx: &StepContext)
        -> Result<serde_json::Value>;
}

/// Registry mapping step kinds to their handlers
///
/// Built once at startup; the engine resolves each step's handler through
/// the closed [`StepKindTag`] set rather than matching on strings.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<StepKindTag, Arc<dyn StepHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a step kind, replacing any previous one
    pub fn register(&mut self, tag: StepKindTag, handler: Arc<dyn StepHandler>) {
        self.handlers.insert(tag, handler);
    }

    /// Handler for a step kind
    pub fn get(&self, tag: StepKindTag) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&tag).cloned()
    }

    /// Registered step kinds
    pub fn kinds(&self) -> Vec<StepKindTag> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::StepKind;

    struct EchoHandler;

    #[async_trait]
    impl StepHandler for EchoHandler {
        async fn run(
            &self,
            _step: &StepSpec,
            input: &str,
            _ctx: &StepContext,
        ) -> Result<serde_json::Value> {
            Ok(serde_json::Value::String(input.to_string()))
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = HandlerRegistry::new();
        registry.register(StepKindTag::LlmCall, Arc::new(EchoHandler));

        let handler = registry.get(StepKindTag::LlmCall).unwrap();
        let step = StepSpec {
            id: "echo".to_string(),
            kind: StepKind::LlmCall { model: None, temperature: None },
            input: "{{query}}".to_string(),
            required: true,
            timeout_seconds: None,
        };
        let ctx = StepContext {
            execution_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            conversation_id: "conv-1".to_string(),
            timeout_seconds: None,
        };

        let output = handler.run(&step, "hello", &ctx).await.unwrap();
        assert_eq!(output, serde_json::Value::String("hello".to_string()));

        assert!(registry.get(StepKindTag::ToolCall).is_none());
    }
}
