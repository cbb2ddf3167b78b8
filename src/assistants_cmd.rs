//! Assistant management commands: list, create, delete.

use std::path::Path;

use anyhow::Result;

use crate::auth::{advise, client_for};
use crate::config::Config;
use crate::create::CreateAssistantParams;
use crate::progress::ProgressMode;
use crate::registry::AssistantRegistry;

pub async fn run_list(config: &Config) -> Result<()> {
    let client = client_for(config)?;
    let mut registry = AssistantRegistry::new();
    registry
        .refresh(&client)
        .await
        .map_err(|e| advise(config, e))?;

    if registry.assistants().is_empty() {
        println!("No assistants. Create one with `dc assistants create <file.pdf> --name <name>`.");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<28} {:<6} TOP_K",
        "ID", "NAME", "FILE", "TEMP"
    );
    for a in registry.assistants() {
        println!(
            "{:<6} {:<24} {:<28} {:<6.1} {}",
            a.id, a.name, a.file_name, a.temperature, a.top_k
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_create(
    config: &Config,
    file: &Path,
    name: &str,
    temperature: Option<f64>,
    top_k: Option<i64>,
    chunk_size: Option<i64>,
    chunk_overlap: Option<i64>,
    progress: ProgressMode,
) -> Result<()> {
    let client = client_for(config)?;
    let mut registry = AssistantRegistry::new();

    let params = CreateAssistantParams {
        name: name.to_string(),
        temperature: temperature.unwrap_or(config.creation.temperature),
        top_k: top_k.unwrap_or(config.creation.top_k),
        chunk_size: chunk_size.unwrap_or(config.creation.chunk_size),
        chunk_overlap: chunk_overlap.unwrap_or(config.creation.chunk_overlap),
    };

    let reporter = progress.reporter();
    let id = registry
        .create(&client, &params, file, reporter.as_ref())
        .await
        .map_err(|e| advise(config, e))?;

    println!("created assistant: {}", id);
    Ok(())
}

pub async fn run_delete(config: &Config, id: i64) -> Result<()> {
    let client = client_for(config)?;
    let mut registry = AssistantRegistry::new();
    registry
        .delete(&client, id)
        .await
        .map_err(|e| advise(config, e))?;
    println!("deleted assistant: {}", id);
    Ok(())
}
