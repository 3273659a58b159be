use super::CliError;
use anyhow::Context;
use scenario_core::common::config::ModelConfig;
use scenario_core::domain::ParameterDictionary;
use scenario_core::modules::SynthesisReport;
use std::fs;
use std::path::Path;

pub(super) fn load_model_config(path: &Path) -> Result<ModelConfig, CliError> {
    let config =
        ModelConfig::from_path(path).map_err(|error| CliError::Compute(error.into()))?;
    tracing::debug!(
        config = %path.display(),
        model = %config.model_type,
        families = config.families.len(),
        "loaded model config"
    );
    Ok(config)
}

/// Reads an experiment's parameters from a flat JSON object.
pub(super) fn load_parameters(path: &Path) -> Result<ParameterDictionary, CliError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameters '{}'", path.display()))?;
    serde_json::from_str::<ParameterDictionary>(&content)
        .with_context(|| format!("failed to parse parameters '{}'", path.display()))
        .map_err(CliError::from)
}

pub(super) fn render_report(report: &SynthesisReport) -> String {
    let mut lines = Vec::new();
    for outcome in &report.applied {
        lines.push(format!(
            "applied {} ({}): {} file(s)",
            outcome.name,
            outcome.kind,
            outcome.artifacts.len()
        ));
    }
    for name in &report.skipped {
        lines.push(format!("skipped {}", name));
    }
    for failure in &report.failures {
        lines.push(format!("failed {}: {}", failure.name, failure.error));
    }
    lines.join("\n")
}
