//! DTO → typed model lowering.
//!
//! Runs after `validate_dto` has passed; only aspect config parsing can still
//! fail here.

use super::dto::*;
use super::model::*;
use crate::errors::CompilationErrorKind;
use tracing::warn;

pub fn lower_dto(
    dto: &PipelineDto,
    strict_aspect_config: bool,
) -> Result<PipelineDefinition, Vec<CompilationErrorKind>> {
    let steps = dto
        .steps
        .iter()
        .map(|step| lower_step(step, dto.transport))
        .collect();

    let mut aspects = Vec::with_capacity(dto.aspects.len());
    let mut errors = Vec::new();
    for (name, aspect) in &dto.aspects {
        match lower_aspect(name, aspect, strict_aspect_config) {
            Ok(model) => aspects.push(model),
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PipelineDefinition {
        app_name: dto.app_name.clone(),
        base_package: dto.base_package.clone(),
        transport: dto.transport,
        steps,
        aspects,
    })
}

fn lower_step(step: &StepDto, transport: Transport) -> StepDefinition {
    let (reference, kind) = match (&step.operator, &step.delegate) {
        (Some(op), _) => (Some(op.trim().to_string()), StepKind::Operator),
        (None, Some(delegate)) => (Some(delegate.trim().to_string()), StepKind::Delegate),
        (None, None) => (None, StepKind::Internal),
    };
    StepDefinition {
        name: step.name.clone(),
        operator_reference: reference,
        kind,
        expose_as_http: step.expose_as_http.unwrap_or(transport == Transport::Rest),
        expose_as_rpc: step.expose_as_rpc.unwrap_or(transport == Transport::Grpc),
    }
}

fn lower_aspect(
    name: &str,
    aspect: &AspectDto,
    strict: bool,
) -> Result<AspectModel, Vec<CompilationErrorKind>> {
    let config = AspectConfig::from_map(name, &aspect.config, strict)?;

    let scope = match aspect.scope {
        ScopeDto::Global => {
            if !config.target_steps.is_empty() {
                warn!(
                    "Aspect '{}' is GLOBAL; ignoring {} {:?}",
                    name, TARGET_STEPS_KEY, config.target_steps
                );
            }
            AspectScope::Global
        }
        ScopeDto::Steps => AspectScope::Steps(config.target_steps.clone()),
    };

    let position = match aspect.position {
        PositionDto::BeforeStep => AspectPosition::BeforeStep,
        PositionDto::AfterStep => AspectPosition::AfterStep,
    };

    Ok(AspectModel {
        name: name.to_string(),
        scope,
        position,
        order: aspect.order,
        config,
        enabled: aspect.enabled,
    })
}
