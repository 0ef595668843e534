//! Prompt builder for rendering templates against a request context.

use crate::types::{BuiltPrompt, PromptDefinition};
use ccna_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::Value;

/// Build a prompt from a definition and a JSON context.
///
/// Both the system and user templates are rendered with the same context.
/// HTML escaping is disabled; answers containing `<` or `&` reach the model
/// as typed.
///
/// # Example
/// ```no_run
/// use ccna_prompt::{build_prompt, PromptDefinition};
/// use serde_json::json;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let context = json!({
///     "query": "OSPF",
///     "items": [{
///         "number": 1,
///         "question": "What does OSPF stand for?",
///         "correct_answer": "Open Shortest Path First",
///         "user_answer": "Open Shortest Path First"
///     }]
/// });
///
/// let built = build_prompt(&def, &context)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(definition: &PromptDefinition, context: &Value) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, context)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, context))
        .transpose()?;

    let resolved_variables = context
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        resolved_variables,
    ))
}

/// Render a Handlebars template with a JSON context.
fn render_template(template: &str, context: &Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", context)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_prompt, FEEDBACK_PROMPT_ID};
    use crate::types::{PromptBehavior, PromptOutputSpec};
    use serde_json::json;

    fn definition(template: &str, system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior::default(),
            system: system.map(str::to_string),
            template: template.to_string(),
            output: PromptOutputSpec::default(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Topic: {{query}}", &json!({"query": "VLAN trunking"}));
        assert_eq!(result.unwrap(), "Topic: VLAN trunking");
    }

    #[test]
    fn test_answers_are_not_html_escaped() {
        let result = render_template("{{answer}}", &json!({"answer": "<none> & all"}));
        assert_eq!(result.unwrap(), "<none> & all");
    }

    #[test]
    fn test_system_template_is_rendered() {
        let def = definition("{{query}}", Some("Coach for {{query}}"));
        let built = build_prompt(&def, &json!({"query": "STP"})).unwrap();

        assert_eq!(built.system.as_deref(), Some("Coach for STP"));
        assert_eq!(built.user, "STP");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert_eq!(built.metadata.resolved_variables, vec!["query".to_string()]);
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let def = definition("{{#each items}}no end", None);
        assert!(build_prompt(&def, &json!({})).is_err());
    }

    #[test]
    fn test_feedback_prompt_lists_every_question() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let def = load_prompt(temp_dir.path(), FEEDBACK_PROMPT_ID).unwrap();
        let context = json!({
            "query": "OSPF",
            "items": [
                {
                    "number": 1,
                    "question": "What does OSPF stand for?",
                    "correct_answer": "Open Shortest Path First",
                    "user_answer": "Open Shortest Path First"
                },
                {
                    "number": 2,
                    "question": "What is the OSPF administrative distance?",
                    "correct_answer": "110",
                    "user_answer": "120"
                }
            ]
        });

        let built = build_prompt(&def, &context).unwrap();

        assert_eq!(built.system.as_deref(), Some("You are a CCNA exam coach."));
        assert!(built.user.contains("here is my query: \"OSPF\""));
        assert!(built.user.contains("Question 1: What does OSPF stand for?"));
        assert!(built.user.contains("Question 2: What is the OSPF administrative distance?"));
        assert!(built.user.contains("Correct Answer: 110"));
        assert!(built.user.contains("My Answer: 120"));
        assert!(built
            .user
            .trim_end()
            .ends_with("Provide a summary of the overall performance and learning recommendations."));
    }
}
