//! Workflow catalog: definition lookup and YAML loading

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::workflow::WorkflowDefinition;
use crate::workflow::validator::WorkflowValidator;

/// Lookup from workflow id to its definition
///
/// Definitions are validated on registration, so anything the engine pulls
/// out of the catalog is structurally sound. The catalog is immutable data
/// from the engine's point of view; it holds no execution state.
#[derive(Debug, Default)]
pub struct WorkflowCatalog {
    definitions: HashMap<String, WorkflowDefinition>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition after validating it
    ///
    /// Replaces any previous definition with the same id. Validation
    /// warnings are logged; errors reject the definition.
    pub fn register(&mut self, definition: WorkflowDefinition) -> Result<()> {
        let validation = WorkflowValidator::validate_workflow(&definition);
        for warning in &validation.warnings {
            tracing::warn!(workflow_id = %definition.id, "{}", warning);
        }
        if !validation.is_valid() {
            let detail = validation
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            anyhow::bail!("Invalid workflow '{}': {}", definition.id, detail);
        }

        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Definition by workflow id
    pub fn get(&self, workflow_id: &str) -> Option<&WorkflowDefinition> {
        self.definitions.get(workflow_id)
    }

    /// Registered workflow ids, sorted
    pub fn list(&self) -> Vec<&WorkflowDefinition> {
        let mut definitions: Vec<_> = self.definitions.values().collect();
        definitions.sort_by(|a, b| a.id.cmp(&b.id));
        definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Parse a single YAML definition
    pub fn parse_definition(yaml: &str) -> Result<WorkflowDefinition> {
        serde_yaml::from_str(yaml).context("Failed to parse workflow YAML")
    }

    /// Load every `*.yaml`/`*.yml` definition in a directory
    ///
    /// A missing directory yields an empty catalog; an unparsable or
    /// invalid file is an error naming the file.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();

        if !dir.exists() {
            return Ok(catalog);
        }

        let entries =
            std::fs::read_dir(dir).with_context(|| format!("Failed to read workflow directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            let is_yaml = path.is_file()
                && matches!(
                    path.extension().and_then(|s| s.to_str()),
                    Some("yaml") | Some("yml")
                );
            if !is_yaml {
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
            let definition = Self::parse_definition(&content)
                .with_context(|| format!("Failed to parse workflow file {}", path.display()))?;

            tracing::debug!(
                workflow_id = %definition.id,
                file = %path.display(),
                "Loaded workflow definition"
            );

            catalog
                .register(definition)
                .with_context(|| format!("Invalid workflow file {}", path.display()))?;
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::{StepKind, StepSpec};
    use tempfile::tempdir;

    const FETCH_SUMMARIZE_YAML: &str = r#"
id: content-brief
description: Fetch a page and summarize it
steps:
  - id: fetch
    kind: tool_call
    tool: http_fetch
    input: '{"url": "{{params.url}}"}'
  - id: summarize
    kind: llm_call
    input: |
      Summarize for the query "{{query}}":

      {{steps.fetch}}
"#;

    #[test]
    fn test_parse_and_register() {
        let definition = WorkflowCatalog::parse_definition(FETCH_SUMMARIZE_YAML).unwrap();
        assert_eq!(definition.id, "content-brief");
        assert_eq!(definition.steps.len(), 2);

        let mut catalog = WorkflowCatalog::new();
        catalog.register(definition).unwrap();
        assert!(catalog.get("content-brief").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_register_rejects_invalid_definition() {
        let mut catalog = WorkflowCatalog::new();
        let invalid = WorkflowDefinition {
            id: "broken".to_string(),
            description: None,
            steps: vec![StepSpec {
                id: "a".to_string(),
                kind: StepKind::LlmCall { model: None, temperature: None },
                input: "{{steps.a}}".to_string(), // self reference
                required: true,
                timeout_seconds: None,
            }],
        };

        let err = catalog.register(invalid).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("brief.yaml"), FETCH_SUMMARIZE_YAML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a workflow").unwrap();

        let catalog = WorkflowCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("content-brief").is_some());
    }

    #[test]
    fn test_load_dir_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let catalog = WorkflowCatalog::load_dir(dir.path().join("nope")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_dir_invalid_file_names_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "id: [not, a, workflow").unwrap();

        let err = WorkflowCatalog::load_dir(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
    }

    #[test]
    fn test_list_is_sorted() {
        let mut catalog = WorkflowCatalog::new();
        for id in ["zeta", "alpha", "mid"] {
            catalog
                .register(WorkflowDefinition {
                    id: id.to_string(),
                    description: None,
                    steps: vec![StepSpec {
                        id: "only".to_string(),
                        kind: StepKind::LlmCall { model: None, temperature: None },
                        input: "{{query}}".to_string(),
                        required: true,
                        timeout_seconds: None,
                    }],
                })
                .unwrap();
        }

        let ids: Vec<_> = catalog.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }
}
