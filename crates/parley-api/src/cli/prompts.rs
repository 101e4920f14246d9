//! Offline batch prompt generation for workflow definitions.
//!
//! `parley prompts --input workflows.json --output prompts.jsonl` reads a
//! JSON array of workflow definitions, asks the model for a natural-language
//! prompt describing each one, and writes one JSON object per line:
//! `{"prompt": ..., "name": ..., "workflow": ...}`.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use parley_core::llm::gateway::CompletionGateway;
use parley_types::config::GlobalConfig;
use parley_types::llm::{CompletionRequest, Message, MessageRole};

const PROMPT_DIRECTIVE: &str = "Generate a prompt for the following workflow:";
const UNNAMED_WORKFLOW: &str = "Unnamed Workflow";

/// Generate one JSONL line per workflow definition.
///
/// Workflows that fail serialization or completion are skipped with a
/// warning so a single bad entry does not abort the batch.
pub async fn generate_prompt_lines<G: CompletionGateway>(
    gateway: &G,
    config: &GlobalConfig,
    workflows: &[Value],
) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(workflows.len());

    for (i, workflow) in workflows.iter().enumerate() {
        let name = workflow
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(UNNAMED_WORKFLOW)
            .to_string();

        let serialized = serde_json::to_string_pretty(workflow)
            .with_context(|| format!("failed to serialize workflow #{i}"))?;

        let request = CompletionRequest {
            model: config.prompt_model.clone(),
            messages: vec![
                Message {
                    role: MessageRole::System,
                    content: PROMPT_DIRECTIVE.to_string(),
                },
                Message {
                    role: MessageRole::User,
                    content: serialized,
                },
            ],
            max_tokens: config.prompt_max_tokens,
            temperature: None,
        };

        let prompt = match gateway.complete(&request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                tracing::warn!(workflow = %name, error = %e, "prompt generation failed, skipping");
                continue;
            }
        };

        let record = serde_json::json!({
            "prompt": prompt,
            "name": name,
            "workflow": workflow,
        });
        lines.push(record.to_string());
    }

    Ok(lines)
}

/// Run the full batch: read the input file, generate, write the JSONL output.
pub async fn run<G: CompletionGateway>(
    gateway: &G,
    config: &GlobalConfig,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let workflows: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of workflows", input.display()))?;

    println!(
        "  {} Generating prompts for {} workflow(s) with {}",
        console::style("⚙").bold(),
        workflows.len(),
        console::style(&config.prompt_model).cyan()
    );

    let lines = generate_prompt_lines(gateway, config, &workflows).await?;

    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(output, body)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "  {} Wrote {} prompt(s) to {}",
        console::style("✓").green(),
        lines.len(),
        console::style(output.display()).cyan()
    );

    Ok(())
}
