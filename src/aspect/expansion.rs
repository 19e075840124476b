//! Aspect expansion.
//!
//! Each resolved step becomes `[before..., step, after...]`. Aspects sharing a
//! position run in ascending `order`; equal orders keep declaration order.
//! The original step is carried through as the same `Arc`, never rebuilt.

use super::naming::synthetic_step_name;
use crate::errors::CompilationErrorKind;
use crate::pipeline::{AspectModel, AspectPosition, AspectScope};
use crate::shape::{NormalizedType, ResolvedOperator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use symbol_index::TypeRef;
use tracing::{debug, info, warn};

/// How a step is deployed by the emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentRole {
    /// A declared step hosted by the pipeline's own services.
    PipelineServer,
    /// A side-effect service hosted by a plugin.
    PluginServer,
    /// The generated caller binding for a plugin-hosted service.
    PluginClient,
}

/// A step manufactured from an aspect. Input and output types are the same
/// observed type; the payload passes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticStep {
    pub name: String,
    pub aspect: String,
    pub position: AspectPosition,
    pub order: i32,
    pub target_step: String,
    pub observed: NormalizedType,
    pub plugin_implementation_class: Option<String>,
    pub role: DeploymentRole,
    pub client_role: DeploymentRole,
    pub side_effect: bool,
    pub expose_as_http: bool,
    pub expose_as_rpc: bool,
}

impl SyntheticStep {
    pub fn input_type(&self) -> &TypeRef {
        self.observed.element()
    }

    pub fn output_type(&self) -> &TypeRef {
        self.observed.element()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpandedStep {
    Original(Arc<ResolvedOperator>),
    Synthetic(SyntheticStep),
}

impl ExpandedStep {
    pub fn name(&self) -> &str {
        match self {
            ExpandedStep::Original(op) => op.name(),
            ExpandedStep::Synthetic(s) => &s.name,
        }
    }

    pub fn role(&self) -> DeploymentRole {
        match self {
            ExpandedStep::Original(_) => DeploymentRole::PipelineServer,
            ExpandedStep::Synthetic(s) => s.role,
        }
    }

    pub fn is_side_effect(&self) -> bool {
        matches!(self, ExpandedStep::Synthetic(s) if s.side_effect)
    }

    pub fn as_original(&self) -> Option<&Arc<ResolvedOperator>> {
        match self {
            ExpandedStep::Original(op) => Some(op),
            ExpandedStep::Synthetic(_) => None,
        }
    }

    pub fn as_synthetic(&self) -> Option<&SyntheticStep> {
        match self {
            ExpandedStep::Synthetic(s) => Some(s),
            ExpandedStep::Original(_) => None,
        }
    }
}

pub struct AspectExpander<'a> {
    no_value_type: &'a str,
}

impl<'a> AspectExpander<'a> {
    pub fn new(no_value_type: &'a str) -> Self {
        Self { no_value_type }
    }

    /// Weave `aspects` around `steps`. Dangling targets fail the whole
    /// expansion before any output is produced.
    pub fn expand(
        &self,
        steps: &[Arc<ResolvedOperator>],
        aspects: &[AspectModel],
    ) -> Result<Vec<ExpandedStep>, Vec<CompilationErrorKind>> {
        let mut active: Vec<&AspectModel> = Vec::with_capacity(aspects.len());
        for aspect in aspects {
            if aspect.enabled {
                active.push(aspect);
            } else {
                warn!("Aspect '{}' is disabled; skipping", aspect.name);
            }
        }

        let known: HashSet<&str> = steps.iter().map(|s| s.name()).collect();
        let mut dangling = Vec::new();
        for aspect in &active {
            if let AspectScope::Steps(targets) = &aspect.scope {
                for target in targets.iter().filter(|t| !known.contains(t.as_str())) {
                    dangling.push(CompilationErrorKind::DanglingAspectTarget {
                        aspect: aspect.name.clone(),
                        step: target.clone(),
                    });
                }
            }
        }
        if !dangling.is_empty() {
            return Err(dangling);
        }

        // Stable: equal orders keep declaration order.
        active.sort_by_key(|aspect| aspect.order);

        let mut expanded = Vec::with_capacity(steps.len());
        let mut synthetic_count = 0;
        for step in steps {
            for aspect in self.applicable(&active, step, AspectPosition::BeforeStep) {
                expanded.push(ExpandedStep::Synthetic(self.synthesize(aspect, step)));
                synthetic_count += 1;
            }
            expanded.push(ExpandedStep::Original(Arc::clone(step)));
            for aspect in self.applicable(&active, step, AspectPosition::AfterStep) {
                expanded.push(ExpandedStep::Synthetic(self.synthesize(aspect, step)));
                synthetic_count += 1;
            }
        }

        info!(
            "Aspect expansion: {} steps, {} synthetic steps inserted",
            steps.len(),
            synthetic_count
        );
        Ok(expanded)
    }

    fn applicable<'s>(
        &self,
        active: &'s [&'s AspectModel],
        step: &'s ResolvedOperator,
        position: AspectPosition,
    ) -> impl Iterator<Item = &'s AspectModel> + 's {
        active
            .iter()
            .copied()
            .filter(move |aspect| {
                aspect.position == position && aspect.scope.applies_to(step.name())
            })
    }

    fn synthesize(&self, aspect: &AspectModel, step: &ResolvedOperator) -> SyntheticStep {
        let observed = match aspect.position {
            AspectPosition::BeforeStep => step
                .normalized_input
                .clone()
                .unwrap_or_else(|| NormalizedType::Single(TypeRef::class(self.no_value_type))),
            AspectPosition::AfterStep => step.normalized_return_type.clone(),
        };
        let name = synthetic_step_name(&aspect.name, observed.element());
        debug!(
            "Aspect '{}' {:?} '{}' → {}",
            aspect.name,
            aspect.position,
            step.name(),
            name
        );

        SyntheticStep {
            name,
            aspect: aspect.name.clone(),
            position: aspect.position,
            order: aspect.order,
            target_step: step.name().to_string(),
            observed,
            plugin_implementation_class: aspect.config.plugin_implementation_class.clone(),
            role: DeploymentRole::PluginServer,
            client_role: DeploymentRole::PluginClient,
            side_effect: true,
            expose_as_http: step.step.expose_as_http,
            expose_as_rpc: step.step.expose_as_rpc,
        }
    }
}
