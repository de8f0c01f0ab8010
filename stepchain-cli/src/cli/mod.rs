//! CLI command handlers

pub mod workflow_handlers;
