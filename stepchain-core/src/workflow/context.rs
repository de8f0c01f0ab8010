//! Execution-scoped request and context types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inputs for one workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Id of the workflow to run
    pub workflow_id: String,
    /// The user query driving the run
    pub query: String,
    /// Identity of the requesting user
    pub user_id: String,
    /// Conversation this run belongs to
    pub conversation_id: String,
    /// Named parameter overrides available to step templates
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl ExecutionRequest {
    /// Create a request with a generated conversation id and anonymous user
    pub fn new(workflow_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            query: query.into(),
            user_id: "anonymous".to_string(),
            conversation_id: Uuid::new_v4().to_string(),
            parameters: HashMap::new(),
        }
    }

    /// Set the user identity
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Set the conversation id (a fresh one is generated otherwise)
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    /// Add a named parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Mutable state owned by exactly one execution
///
/// The output cache maps step id to that step's output so later-step
/// templates can re-read earlier outputs without re-invoking the producing
/// step. It is created fresh per execution and discarded with it; nothing
/// here is shared across executions or users.
#[derive(Debug)]
pub struct ExecutionContext {
    query: String,
    user_id: String,
    conversation_id: String,
    parameters: HashMap<String, String>,
    cache: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    /// Build a fresh context from a request
    pub fn new(request: &ExecutionRequest) -> Self {
        Self {
            query: request.query.clone(),
            user_id: request.user_id.clone(),
            conversation_id: request.conversation_id.clone(),
            parameters: request.parameters.clone(),
            cache: HashMap::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Caller-supplied parameter by name
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(|s| s.as_str())
    }

    /// Cached output of a completed earlier step
    pub fn step_output(&self, step_id: &str) -> Option<&serde_json::Value> {
        self.cache.get(step_id)
    }

    /// Cache a completed step's output under its id
    pub fn cache_output(&mut self, step_id: impl Into<String>, output: serde_json::Value) {
        self.cache.insert(step_id.into(), output);
    }
}
