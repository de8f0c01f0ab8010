//! Built-in tools

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::handlers::tool::{Tool, ToolRegistry};

/// Response body cap for fetched pages
const MAX_BODY_BYTES: usize = 65536;

/// Fetch a URL and return its status and (truncated) body
pub struct HttpFetchTool {
    http: reqwest::Client,
}

impl HttpFetchTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpFetchTool {
    fn name(&self) -> &str {
        "http_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL over HTTP GET and return the response status and body"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let url = args["url"]
            .as_str()
            .context("'url' argument must be a string")?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        let truncated = body.len() > MAX_BODY_BYTES;
        let body = if truncated {
            let mut end = MAX_BODY_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body[..end].to_string()
        } else {
            body
        };

        Ok(serde_json::json!({
            "status": status,
            "body": body,
            "truncated": truncated,
        }))
    }

    fn timeout_secs(&self) -> u64 {
        30
    }
}

/// Current UTC timestamp
pub struct UtcNowTool;

#[async_trait]
impl Tool for UtcNowTool {
    fn name(&self) -> &str {
        "utc_now"
    }

    fn description(&self) -> &str {
        "Return the current UTC timestamp in RFC 3339 format"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "utc": chrono::Utc::now().to_rfc3339(),
        }))
    }

    fn timeout_secs(&self) -> u64 {
        5
    }
}

/// Registry with every built-in tool registered
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(HttpFetchTool::new());
    registry.register(UtcNowTool);
    registry
}
