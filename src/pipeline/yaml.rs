use super::dto::PipelineDto;
use super::lower::lower_dto;
use super::model::PipelineDefinition;
use super::validate::validate_dto;
use crate::errors::{CompilationErrorKind, CompilationFailed, Phase};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Parse a YAML string into a PipelineDto.
///
/// Validation is NOT performed here. Call `validate_dto()`, or use
/// `load_pipeline_str()` which validates and lowers.
pub fn parse_pipeline_yaml(yaml_str: &str) -> Result<PipelineDto> {
    let dto: PipelineDto = serde_yaml::from_str(yaml_str)?;
    Ok(dto)
}

/// Parse, validate and lower a pipeline description.
///
/// Every problem found is returned together, tagged with the `load` phase.
pub fn load_pipeline_str(
    yaml_str: &str,
    strict_aspect_config: bool,
) -> std::result::Result<PipelineDefinition, CompilationFailed> {
    let dto: PipelineDto = serde_yaml::from_str(yaml_str).map_err(|e| {
        CompilationFailed::from_kinds(
            Phase::Load,
            [CompilationErrorKind::InvalidPipeline {
                rule: "yaml".to_string(),
                reason: e.to_string(),
            }],
        )
    })?;

    let errors = validate_dto(&dto);
    if !errors.is_empty() {
        return Err(CompilationFailed::from_kinds(Phase::Load, errors));
    }

    let definition = lower_dto(&dto, strict_aspect_config)
        .map_err(|errors| CompilationFailed::from_kinds(Phase::Load, errors))?;

    info!(
        "Loaded pipeline '{}': {} steps, {} aspects",
        definition.app_name,
        definition.steps.len(),
        definition.aspects.len()
    );
    Ok(definition)
}

/// Read and load a pipeline description file.
pub fn load_pipeline_file(
    path: impl AsRef<Path>,
    strict_aspect_config: bool,
) -> Result<PipelineDefinition> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline {}", path.display()))?;
    let definition = load_pipeline_str(&content, strict_aspect_config)
        .with_context(|| format!("Invalid pipeline {}", path.display()))?;
    Ok(definition)
}
