//! Prompt loader for YAML prompt definitions.
//!
//! Prompts are looked up in the workspace's `.ccna/prompts/` first, so an
//! operator can reword the coaching instructions without a rebuild. Prompts
//! shipped with the binary are the fallback.

use crate::types::PromptDefinition;
use ccna_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the prompt used to grade practice answers.
pub const FEEDBACK_PROMPT_ID: &str = "coach.feedback";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    FEEDBACK_PROMPT_ID,
    include_str!("../prompts/coach.feedback.yml"),
)];

/// Load a prompt definition by ID.
///
/// Searches for `<id>.yml` in the workspace's `.ccna/prompts/` directory and
/// falls back to the built-in prompt of the same ID.
///
/// # Example
/// ```no_run
/// use ccna_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "coach.feedback")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".ccna/prompts")
        .join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))?;

    tracing::debug!("Using built-in prompt: {}", prompt_id);
    parse_prompt(contents, prompt_id)
}

fn parse_prompt(contents: &str, source: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", source, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
