use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::types::{ResultRecord, TokenUsageMap};

/// Load the exported result dataset (a JSON array of records).
///
/// Model identifiers are renamed through `aliases` so that names used by the
/// collection scripts line up with the names used in reports.
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be read, or is not a
/// JSON array of result records.
pub fn load_results(path: &Path, aliases: &BTreeMap<String, String>) -> Result<Vec<ResultRecord>> {
    if !path.exists() {
        anyhow::bail!("Results file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file at {}", path.display()))?;

    let mut records: Vec<ResultRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results: invalid JSON in {}", path.display()))?;

    for record in &mut records {
        if let Some(alias) = aliases.get(&record.model) {
            record.model = alias.clone();
        }
    }

    tracing::debug!(count = records.len(), path = %path.display(), "loaded result records");
    Ok(records)
}

/// Load the token-usage dataset (a JSON object keyed by model).
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be read, or does not
/// match the token-usage schema.
pub fn load_token_usage(path: &Path, aliases: &BTreeMap<String, String>) -> Result<TokenUsageMap> {
    if !path.exists() {
        anyhow::bail!("Token usage file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token usage file at {}", path.display()))?;

    let raw: TokenUsageMap = serde_json::from_str(&content).with_context(|| {
        format!("Failed to parse token usage: invalid JSON in {}", path.display())
    })?;

    let usage: TokenUsageMap = raw
        .into_iter()
        .map(|(model, usage)| {
            let model = aliases.get(&model).cloned().unwrap_or(model);
            (model, usage)
        })
        .collect();

    tracing::debug!(models = usage.len(), path = %path.display(), "loaded token usage");
    Ok(usage)
}
