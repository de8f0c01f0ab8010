//! Configuration data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

/// LLM step handler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Default model for llm_call steps without an override
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Default sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion token cap per request
    pub max_tokens: u32,
    /// Default request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            max_tokens: 2048,
            timeout_seconds: 60,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Logging verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Directory containing workflow definition YAML files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflows_dir: Option<PathBuf>,
    /// LLM handler settings
    #[serde(default)]
    pub llm: LlmConfig,
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: EngineConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Return default configuration if file doesn't exist
            Ok(EngineConfig::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn default_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("Could not determine config directory")?;
        Ok(config_dir.join("stepchain").join("config.toml"))
    }

    /// Get the default workflow definitions directory
    pub fn default_workflows_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".stepchain").join("workflows")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if url::Url::parse(&self.llm.base_url).is_err() {
            errors.push(format!("llm.base_url is not a valid URL: {}", self.llm.base_url));
        }

        if self.llm.model.is_empty() {
            errors.push("llm.model cannot be empty".to_string());
        }

        if self.llm.api_key_env.is_empty() {
            errors.push("llm.api_key_env cannot be empty".to_string());
        }

        if self.llm.timeout_seconds == 0 || self.llm.timeout_seconds > 600 {
            errors.push("llm.timeout_seconds must be between 1 and 600".to_string());
        }

        if self.llm.max_tokens == 0 {
            errors.push("llm.max_tokens must be at least 1".to_string());
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                errors.push("llm.temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
