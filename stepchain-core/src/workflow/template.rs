//! Step input template rendering
//!
//! Templates reference execution data through `{{...}}` placeholders:
//!
//! - `{{query}}`, `{{user_id}}`, `{{conversation_id}}`
//! - `{{params.NAME}}` - a caller-supplied parameter
//! - `{{steps.STEP_ID}}` - the cached output of a completed earlier step
//!
//! String outputs substitute verbatim; other JSON values substitute as
//! compact JSON.

use crate::workflow::context::ExecutionContext;
use thiserror::Error;

/// A template failed to render against the execution context
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at byte {0}")]
    Unclosed(usize),

    #[error("unknown placeholder '{{{{{0}}}}}'")]
    UnknownPlaceholder(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("no output available for step '{0}'")]
    MissingStepOutput(String),
}

/// A single reference found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Query,
    UserId,
    ConversationId,
    Parameter(String),
    StepOutput(String),
}

/// Parse out every placeholder in a template, without resolving anything
///
/// Used by the validator to check references at definition time. Malformed
/// placeholders surface the same errors rendering would.
pub fn references(template: &str) -> Result<Vec<TemplateRef>, TemplateError> {
    let mut refs = Vec::new();
    walk(template, |expr, _| {
        refs.push(classify(expr)?);
        Ok(String::new())
    })?;
    Ok(refs)
}

/// Render a template against an execution context
pub fn render(template: &str, ctx: &ExecutionContext) -> Result<String, TemplateError> {
    walk(template, |expr, _| match classify(expr)? {
        TemplateRef::Query => Ok(ctx.query().to_string()),
        TemplateRef::UserId => Ok(ctx.user_id().to_string()),
        TemplateRef::ConversationId => Ok(ctx.conversation_id().to_string()),
        TemplateRef::Parameter(name) => ctx
            .parameter(&name)
            .map(|v| v.to_string())
            .ok_or(TemplateError::UnknownParameter(name)),
        TemplateRef::StepOutput(step_id) => ctx
            .step_output(&step_id)
            .map(value_to_text)
            .ok_or(TemplateError::MissingStepOutput(step_id)),
    })
}

/// Text form of an opaque step output
pub fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn classify(expr: &str) -> Result<TemplateRef, TemplateError> {
    match expr {
        "query" => Ok(TemplateRef::Query),
        "user_id" => Ok(TemplateRef::UserId),
        "conversation_id" => Ok(TemplateRef::ConversationId),
        _ => {
            if let Some(name) = expr.strip_prefix("params.") {
                if name.is_empty() {
                    return Err(TemplateError::UnknownPlaceholder(expr.to_string()));
                }
                Ok(TemplateRef::Parameter(name.to_string()))
            } else if let Some(step_id) = expr.strip_prefix("steps.") {
                if step_id.is_empty() {
                    return Err(TemplateError::UnknownPlaceholder(expr.to_string()));
                }
                Ok(TemplateRef::StepOutput(step_id.to_string()))
            } else {
                Err(TemplateError::UnknownPlaceholder(expr.to_string()))
            }
        }
    }
}

/// Scan `template` replacing each `{{expr}}` with `resolve(expr, offset)`
fn walk<F>(template: &str, mut resolve: F) -> Result<String, TemplateError>
where
    F: FnMut(&str, usize) -> Result<String, TemplateError>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + start))?;
        let expr = after_open[..end].trim();
        out.push_str(&resolve(expr, offset + start)?);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::context::ExecutionRequest;

    fn test_context() -> ExecutionContext {
        let request = ExecutionRequest::new("wf", "rust workflow engines")
            .with_user("user-1")
            .with_conversation("conv-1")
            .with_parameter("topic", "retries");
        let mut ctx = ExecutionContext::new(&request);
        ctx.cache_output("fetch", serde_json::json!("page body"));
        ctx.cache_output("stats", serde_json::json!({"words": 120}));
        ctx
    }

    #[test]
    fn test_render_builtins_and_params() {
        let ctx = test_context();
        let rendered = render("q={{query}} u={{user_id}} t={{params.topic}}", &ctx).unwrap();
        assert_eq!(rendered, "q=rust workflow engines u=user-1 t=retries");
    }

    #[test]
    fn test_render_step_output_verbatim() {
        let ctx = test_context();
        let rendered = render("Summarize:\n{{steps.fetch}}", &ctx).unwrap();
        assert_eq!(rendered, "Summarize:\npage body");
    }

    #[test]
    fn test_render_structured_output_as_json() {
        let ctx = test_context();
        let rendered = render("{{steps.stats}}", &ctx).unwrap();
        assert_eq!(rendered, r#"{"words":120}"#);
    }

    #[test]
    fn test_whitespace_inside_placeholder() {
        let ctx = test_context();
        let rendered = render("{{ query }}", &ctx).unwrap();
        assert_eq!(rendered, "rust workflow engines");
    }

    #[test]
    fn test_missing_step_output() {
        let ctx = test_context();
        let err = render("{{steps.summarize}}", &ctx).unwrap_err();
        assert_eq!(err, TemplateError::MissingStepOutput("summarize".to_string()));
    }

    #[test]
    fn test_unknown_parameter() {
        let ctx = test_context();
        let err = render("{{params.missing}}", &ctx).unwrap_err();
        assert_eq!(err, TemplateError::UnknownParameter("missing".to_string()));
    }

    #[test]
    fn test_unknown_namespace() {
        let ctx = test_context();
        let err = render("{{secrets.key}}", &ctx).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("secrets.key".to_string()));
    }

    #[test]
    fn test_unclosed_placeholder() {
        let ctx = test_context();
        let err = render("prefix {{query", &ctx).unwrap_err();
        assert_eq!(err, TemplateError::Unclosed(7));
    }

    #[test]
    fn test_references_extraction() {
        let refs = references("{{query}} then {{steps.fetch}} and {{params.topic}}").unwrap();
        assert_eq!(
            refs,
            vec![
                TemplateRef::Query,
                TemplateRef::StepOutput("fetch".to_string()),
                TemplateRef::Parameter("topic".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_without_placeholders_passes_through() {
        let ctx = test_context();
        let rendered = render("no placeholders here", &ctx).unwrap();
        assert_eq!(rendered, "no placeholders here");
    }
}
