//! Step handler implementations

pub mod builtin;
pub mod llm;
pub mod tool;

pub use llm::LlmStepHandler;
pub use tool::{Tool, ToolRegistry, ToolStepHandler};
