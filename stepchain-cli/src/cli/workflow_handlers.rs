//! Workflow command handlers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use stepchain_core::handlers::builtin::builtin_registry;
use stepchain_core::handlers::{LlmStepHandler, ToolStepHandler};
use stepchain_core::models::workflow::{ExecutionStatus, StepKindTag};
use stepchain_core::models::EngineConfig;
use stepchain_core::services::logging::init_logging;
use stepchain_core::workflow::{
    ExecutionRequest, HandlerRegistry, Transcript, WorkflowCatalog, WorkflowEngine,
    WorkflowValidator,
};

/// Resolve the configuration, from an explicit path or the default location
fn load_config(config: Option<String>) -> Result<EngineConfig> {
    let path = match config {
        Some(path) => PathBuf::from(path),
        None => EngineConfig::default_config_path()
            .map_err(|e| anyhow::anyhow!("Failed to determine config path: {}", e))?,
    };

    let config = EngineConfig::load_from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!("Invalid configuration {}: {}", path.display(), errors.join("; "));
    }

    Ok(config)
}

/// Resolve the workflow catalog directory
fn catalog_dir(catalog: Option<String>, config: &EngineConfig) -> PathBuf {
    catalog
        .map(PathBuf::from)
        .or_else(|| config.workflows_dir.clone())
        .unwrap_or_else(EngineConfig::default_workflows_dir)
}

/// Parse repeated `key=value` parameter flags
fn parse_params(params: &[String]) -> Result<Vec<(String, String)>> {
    params
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .with_context(|| format!("Invalid --param '{}' (expected key=value)", raw))
        })
        .collect()
}

/// Build the engine from configuration and a catalog directory
fn build_engine(config: &EngineConfig, dir: &PathBuf) -> Result<WorkflowEngine> {
    let catalog = WorkflowCatalog::load_dir(dir)
        .with_context(|| format!("Failed to load workflow catalog from {}", dir.display()))?;

    let mut handlers = HandlerRegistry::new();
    handlers.register(
        StepKindTag::LlmCall,
        Arc::new(LlmStepHandler::new(config.llm.clone())),
    );
    handlers.register(
        StepKindTag::ToolCall,
        Arc::new(ToolStepHandler::new(Arc::new(builtin_registry()))),
    );

    Ok(WorkflowEngine::new(Arc::new(catalog), Arc::new(handlers)))
}

/// Handle the run command
#[allow(clippy::too_many_arguments)]
pub async fn handle_run(
    workflow_id: String,
    query: String,
    user: String,
    conversation: Option<String>,
    params: Vec<String>,
    catalog: Option<String>,
    config: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let _ = init_logging(config.log_level.clone());

    let dir = catalog_dir(catalog, &config);
    let engine = build_engine(&config, &dir)?;

    let mut request = ExecutionRequest::new(workflow_id.clone(), query).with_user(user);
    if let Some(conversation) = conversation {
        request = request.with_conversation(conversation);
    }
    for (key, value) in parse_params(&params)? {
        request = request.with_parameter(key, value);
    }

    let execution = engine
        .execute(request)
        .await
        .with_context(|| format!("Failed to run workflow '{}'", workflow_id))?;

    let transcript = Transcript::from_execution(&execution);

    if json {
        let output = serde_json::json!({
            "execution": execution,
            "transcript": transcript,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", transcript.to_text());
    }

    if execution.status == ExecutionStatus::Failed {
        anyhow::bail!("Workflow '{}' failed", workflow_id);
    }

    Ok(())
}

/// Handle the list command
pub async fn handle_list(
    catalog: Option<String>,
    config: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let dir = catalog_dir(catalog, &config);
    let catalog = WorkflowCatalog::load_dir(&dir)
        .with_context(|| format!("Failed to load workflow catalog from {}", dir.display()))?;

    let definitions = catalog.list();

    if json {
        let output = serde_json::json!({
            "directory": dir.to_string_lossy(),
            "count": definitions.len(),
            "workflows": definitions.iter().map(|d| serde_json::json!({
                "id": d.id,
                "description": d.description,
                "steps": d.steps.len(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if definitions.is_empty() {
        println!("No workflow definitions found in {}", dir.display());
        println!();
        println!("Add workflow YAML files to that directory, or pass --catalog.");
    } else {
        println!("Available Workflows:");
        println!("===================");
        for definition in definitions {
            println!("  • {}", definition.id);
            if let Some(desc) = &definition.description {
                println!("    {}", desc);
            }
            let step_ids: Vec<_> = definition.steps.iter().map(|s| s.id.as_str()).collect();
            println!("    Steps: {}", step_ids.join(" → "));
        }
    }

    Ok(())
}

/// Handle the validate command
pub async fn handle_validate(workflow_file: String, json: bool) -> Result<()> {
    // Read and parse the workflow file
    let content = std::fs::read_to_string(&workflow_file)
        .with_context(|| format!("Failed to read workflow file: {}", workflow_file))?;
    let workflow = WorkflowCatalog::parse_definition(&content)?;

    // Validate workflow
    let validation = WorkflowValidator::validate_workflow(&workflow);

    if json {
        let output = serde_json::json!({
            "valid": validation.is_valid(),
            "errors": validation.errors.iter().map(|e| serde_json::json!({
                "field": e.field,
                "message": e.message,
            })).collect::<Vec<_>>(),
            "warnings": validation.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Validating workflow: {}", workflow.id);
        println!("File: {}", workflow_file);
        println!();

        if validation.is_valid() {
            println!("✓ Workflow is valid");
            println!();
            println!("Summary:");
            println!("  Id:          {}", workflow.id);
            if let Some(desc) = &workflow.description {
                println!("  Description: {}", desc);
            }
            println!("  Steps:       {}", workflow.steps.len());
            for step in &workflow.steps {
                let required = if step.required { "required" } else { "optional" };
                println!("    - {} ({}, {})", step.id, step.kind.tag(), required);
            }

            if !validation.warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &validation.warnings {
                    println!("  ⚠  {}", warning);
                }
            }
        } else {
            println!("✗ Workflow validation failed");
            println!();
            println!("Errors:");
            for error in &validation.errors {
                println!("  ✗ {}: {}", error.field, error.message);
            }

            if !validation.warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &validation.warnings {
                    println!("  ⚠  {}", warning);
                }
            }
        }
    }

    if !validation.is_valid() {
        anyhow::bail!("Workflow validation failed");
    }

    Ok(())
}
