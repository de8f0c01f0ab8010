//! Data models for stepchain

pub mod configuration;
pub mod workflow;

pub use configuration::{EngineConfig, LlmConfig, LogLevel};
