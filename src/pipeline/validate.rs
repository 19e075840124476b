use super::dto::*;
use super::model::{parse_target_steps, TARGET_STEPS_KEY};
use crate::errors::CompilationErrorKind;
use std::collections::HashSet;

fn invalid(rule: &str, reason: String) -> CompilationErrorKind {
    CompilationErrorKind::InvalidPipeline {
        rule: rule.to_string(),
        reason,
    }
}

/// Validate a PipelineDto before lowering. Returns all errors found.
pub fn validate_dto(dto: &PipelineDto) -> Vec<CompilationErrorKind> {
    let mut errors = Vec::new();

    // P1: appName must be present
    if dto.app_name.trim().is_empty() {
        errors.push(invalid("P1", "appName must not be empty".to_string()));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (position, step) in dto.steps.iter().enumerate() {
        // P2: step names must be non-empty
        if step.name.trim().is_empty() {
            errors.push(invalid("P2", format!("Step #{} has an empty name", position + 1)));
            continue;
        }

        // P3: step names must be unique
        if !seen.insert(step.name.as_str()) {
            errors.push(invalid("P3", format!("Duplicate step name: {}", step.name)));
        }

        // P4: operator and delegate are mutually exclusive
        if step.operator.is_some() && step.delegate.is_some() {
            errors.push(invalid(
                "P4",
                format!(
                    "Step '{}' declares both operator and delegate; choose one",
                    step.name
                ),
            ));
        }
    }

    for (name, aspect) in &dto.aspects {
        // P5: aspect names must be non-empty
        if name.trim().is_empty() {
            errors.push(invalid("P5", "Aspect with an empty name".to_string()));
            continue;
        }

        // Malformed targetSteps values are reported when the config is lowered.
        let targets = match aspect.config.get(TARGET_STEPS_KEY) {
            Some(value) => match parse_target_steps(value) {
                Some(targets) => targets,
                None => continue,
            },
            None => Vec::new(),
        };

        // P6: STEPS scope needs at least one target
        if aspect.scope == ScopeDto::Steps && targets.is_empty() {
            errors.push(invalid(
                "P6",
                format!(
                    "Aspect '{}' has scope STEPS but no {} configured",
                    name, TARGET_STEPS_KEY
                ),
            ));
        }

        // P7: no duplicate targets inside one aspect
        let mut seen_targets: HashSet<&str> = HashSet::new();
        for target in &targets {
            if !seen_targets.insert(target.as_str()) {
                errors.push(invalid(
                    "P7",
                    format!("Aspect '{}' lists target step '{}' more than once", name, target),
                ));
            }
        }
    }

    errors
}
