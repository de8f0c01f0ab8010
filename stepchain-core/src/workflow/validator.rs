//! Workflow definition validation logic

use std::collections::HashSet;

use crate::models::workflow::{StepKind, WorkflowDefinition};
use crate::workflow::template::{self, TemplateRef};

/// Validation error type
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: String, message: String) {
        self.errors.push(ValidationError { field, message });
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Workflow validator
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a workflow definition
    ///
    /// Checks identifier syntax, step id uniqueness, kind configuration,
    /// and that every template reference points at a known namespace and
    /// only at *earlier* steps - the linear chain admits no forward or
    /// self references.
    pub fn validate_workflow(workflow: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        if workflow.id.is_empty() {
            result.add_error("id".to_string(), "Workflow id cannot be empty".to_string());
        } else if !is_valid_identifier(&workflow.id) {
            result.add_error(
                "id".to_string(),
                format!("Workflow id '{}' is not a valid identifier", workflow.id),
            );
        }

        if workflow.steps.is_empty() {
            result.add_error("steps".to_string(), "Workflow has no steps".to_string());
        }

        // Step id uniqueness and syntax
        let mut seen = HashSet::new();
        for step in &workflow.steps {
            if step.id.is_empty() {
                result.add_error("steps".to_string(), "Step id cannot be empty".to_string());
                continue;
            }
            if !is_valid_identifier(&step.id) {
                result.add_error(
                    format!("steps.{}", step.id),
                    format!("Step id '{}' is not a valid identifier", step.id),
                );
            }
            if !seen.insert(step.id.clone()) {
                result.add_error(
                    format!("steps.{}", step.id),
                    format!("Duplicate step id '{}'", step.id),
                );
            }
        }

        // Kind-specific configuration
        for step in &workflow.steps {
            match &step.kind {
                StepKind::ToolCall { tool } => {
                    if tool.is_empty() {
                        result.add_error(
                            format!("steps.{}.tool", step.id),
                            "Tool step must name a tool".to_string(),
                        );
                    }
                }
                StepKind::LlmCall { model, temperature } => {
                    if let Some(model) = model {
                        if model.is_empty() {
                            result.add_error(
                                format!("steps.{}.model", step.id),
                                "Model override cannot be empty".to_string(),
                            );
                        }
                    }
                    if let Some(temperature) = temperature {
                        if !(0.0..=2.0).contains(temperature) {
                            result.add_error(
                                format!("steps.{}.temperature", step.id),
                                "Temperature must be between 0.0 and 2.0".to_string(),
                            );
                        }
                    }
                }
            }
        }

        Self::validate_references(workflow, &mut result);

        result
    }

    /// Check every step's template references against chain order
    fn validate_references(workflow: &WorkflowDefinition, result: &mut ValidationResult) {
        for (position, step) in workflow.steps.iter().enumerate() {
            let refs = match template::references(&step.input) {
                Ok(refs) => refs,
                Err(e) => {
                    result.add_error(format!("steps.{}.input", step.id), e.to_string());
                    continue;
                }
            };

            for reference in refs {
                if let TemplateRef::StepOutput(target) = reference {
                    match workflow.step_index(&target) {
                        None => {
                            result.add_error(
                                format!("steps.{}.input", step.id),
                                format!("References unknown step '{}'", target),
                            );
                        }
                        Some(target_position) if target_position >= position => {
                            result.add_error(
                                format!("steps.{}.input", step.id),
                                format!(
                                    "References step '{}' which does not run earlier in the chain",
                                    target
                                ),
                            );
                        }
                        Some(target_position) => {
                            if !workflow.steps[target_position].required {
                                result.add_warning(format!(
                                    "Step '{}' references optional step '{}', whose output may be absent at run time",
                                    step.id, target
                                ));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Validate an identifier according to naming convention
fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 64 {
        return false;
    }

    let first_char = name.chars().next().unwrap();
    if !first_char.is_ascii_alphabetic() && !first_char.is_ascii_digit() {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::StepSpec;

    fn step(id: &str, input: &str, required: bool) -> StepSpec {
        StepSpec {
            id: id.to_string(),
            kind: StepKind::LlmCall { model: None, temperature: None },
            input: input.to_string(),
            required,
            timeout_seconds: None,
        }
    }

    fn workflow(steps: Vec<StepSpec>) -> WorkflowDefinition {
        WorkflowDefinition {
            id: "test-workflow".to_string(),
            description: None,
            steps,
        }
    }

    #[test]
    fn test_valid_chain() {
        let wf = workflow(vec![
            step("fetch", "{{query}}", true),
            step("summarize", "{{steps.fetch}}", true),
        ]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_workflow_rejected() {
        let wf = workflow(vec![]);
        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("no steps")));
    }

    #[test]
    fn test_duplicate_step_ids_rejected() {
        let wf = workflow(vec![
            step("fetch", "{{query}}", true),
            step("fetch", "{{query}}", true),
        ]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("Duplicate step id")));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let wf = workflow(vec![
            step("fetch", "{{steps.summarize}}", true),
            step("summarize", "{{steps.fetch}}", true),
        ]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "steps.fetch.input" && e.message.contains("does not run earlier")));
    }

    #[test]
    fn test_self_reference_rejected() {
        let wf = workflow(vec![step("fetch", "{{steps.fetch}}", true)]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_unknown_step_reference_rejected() {
        let wf = workflow(vec![
            step("fetch", "{{query}}", true),
            step("summarize", "{{steps.missing}}", true),
        ]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("unknown step 'missing'")));
    }

    #[test]
    fn test_optional_dependency_warns() {
        let wf = workflow(vec![
            step("fetch", "{{query}}", false),
            step("summarize", "{{steps.fetch}}", true),
        ]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("optional step 'fetch'"));
    }

    #[test]
    fn test_tool_step_without_tool_rejected() {
        let wf = workflow(vec![StepSpec {
            id: "fetch".to_string(),
            kind: StepKind::ToolCall { tool: String::new() },
            input: "{{query}}".to_string(),
            required: true,
            timeout_seconds: None,
        }]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "steps.fetch.tool"));
    }

    #[test]
    fn test_malformed_template_rejected() {
        let wf = workflow(vec![step("fetch", "{{query", true)]);

        let result = WorkflowValidator::validate_workflow(&wf);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("unclosed placeholder")));
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("valid-workflow"));
        assert!(is_valid_identifier("valid_workflow"));
        assert!(is_valid_identifier("workflow123"));
        assert!(is_valid_identifier("a"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("-invalid-start"));
        assert!(!is_valid_identifier("invalid space"));
        assert!(!is_valid_identifier("invalid@symbol"));
        assert!(!is_valid_identifier(&"a".repeat(65))); // Too long
    }
}
