//! Main pipeline compiler implementation.

use crate::aspect::{AspectExpander, DeploymentRole, ExpandedStep};
use crate::config::CompilerConfig;
use crate::coverage::check_coverage;
use crate::errors::{CompilationErrorKind, CompilationFailed, Phase};
use crate::mapper::{MapperInference, MapperRegistry};
use crate::pipeline::{PipelineDefinition, StepKind};
use crate::resolve::OperatorResolver;
use crate::shape::{policy_for, OperatorCategory, ResolvedOperator, TypeClassifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use symbol_index::SymbolIndex;
use tracing::{debug, info};

/// Runs the passes in order: resolve → normalize → policy → mappers →
/// coverage → aspects. Each pass collects all of its errors; the first pass
/// with any error ends the compilation.
#[derive(Debug, Clone, Default)]
pub struct PipelineCompiler {
    config: CompilerConfig,
}

impl PipelineCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a loaded pipeline against a symbol index.
    pub fn compile(
        &self,
        pipeline: &PipelineDefinition,
        index: &dyn SymbolIndex,
    ) -> Result<CompiledPipeline, CompilationFailed> {
        let operators = self.resolve_operators(pipeline, index)?;
        self.enforce_policy(&operators)?;
        let registry = self.infer_mappers(index)?;

        let gaps = check_coverage(
            operators.iter().map(Arc::as_ref),
            &registry,
            index,
            &self.config,
        );
        fail_if_any(Phase::Coverage, gaps)?;

        let steps = AspectExpander::new(&self.config.no_value_type)
            .expand(&operators, &pipeline.aspects)
            .map_err(|errors| CompilationFailed::from_kinds(Phase::Aspects, errors))?;

        info!(
            "Compiled pipeline '{}': {} operators, {} mappers, {} expanded steps",
            pipeline.app_name,
            operators.len(),
            registry.len(),
            steps.len()
        );
        Ok(CompiledPipeline {
            app_name: pipeline.app_name.clone(),
            registry,
            operators,
            steps,
        })
    }

    /// Resolve and normalize every non-internal step.
    pub fn resolve_operators(
        &self,
        pipeline: &PipelineDefinition,
        index: &dyn SymbolIndex,
    ) -> Result<Vec<Arc<ResolvedOperator>>, CompilationFailed> {
        let resolver = OperatorResolver::new(index, &self.config.root_type);
        let mut resolved = Vec::new();
        let mut errors = Vec::new();
        for step in &pipeline.steps {
            if step.is_internal() {
                debug!("Step '{}' is internal; not resolved here", step.name);
                continue;
            }
            match resolver.resolve(step) {
                Ok(method) => resolved.push((step, method)),
                Err(err) => errors.push(err),
            }
        }
        fail_if_any(Phase::Resolve, errors)?;
        info!("Resolved {} operators", resolved.len());

        let classifier = TypeClassifier::new(&self.config).with_index(index);
        let mut operators = Vec::with_capacity(resolved.len());
        let mut errors = Vec::new();
        for (step, method) in resolved {
            match classifier.classify_operator(step, method) {
                Ok(operator) => {
                    debug!(
                        "Step '{}': {:?}, input {}, output {}",
                        operator.name(),
                        operator.category,
                        operator
                            .normalized_input
                            .as_ref()
                            .map_or_else(|| "none".to_string(), |s| s.to_string()),
                        operator.normalized_return_type
                    );
                    operators.push(Arc::new(operator));
                }
                Err(mut errs) => errors.append(&mut errs),
            }
        }
        fail_if_any(Phase::Normalize, errors)?;
        Ok(operators)
    }

    fn enforce_policy(&self, operators: &[Arc<ResolvedOperator>]) -> Result<(), CompilationFailed> {
        let policy = policy_for(self.config.shape_policy);
        let errors: Vec<CompilationErrorKind> =
            operators.iter().flat_map(|op| policy.check(op)).collect();
        debug!("Shape policy '{}': {} violations", policy.name(), errors.len());
        fail_if_any(Phase::Policy, errors)
    }

    /// Discover mappers and build the registry.
    pub fn infer_mappers(
        &self,
        index: &dyn SymbolIndex,
    ) -> Result<MapperRegistry, CompilationFailed> {
        let (mappers, mut errors) =
            MapperInference::new(index, &self.config.mapper_contract, &self.config.root_type)
                .discover();
        info!("Discovered {} mappers", mappers.len());

        match MapperRegistry::build(mappers, self.config.mapper_keying) {
            Ok(registry) => {
                fail_if_any(Phase::Mappers, errors)?;
                Ok(registry)
            }
            Err(mut build_errors) => {
                errors.append(&mut build_errors);
                Err(CompilationFailed::from_kinds(Phase::Mappers, errors))
            }
        }
    }
}

fn fail_if_any(phase: Phase, errors: Vec<CompilationErrorKind>) -> Result<(), CompilationFailed> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CompilationFailed::from_kinds(phase, errors))
    }
}

/// The two hand-off objects for the emitters.
#[derive(Debug, Clone)]
pub struct CompiledPipeline {
    pub app_name: String,
    pub registry: MapperRegistry,
    /// Resolved operators in declaration order; shared with `steps`
    pub operators: Vec<Arc<ResolvedOperator>>,
    pub steps: Vec<ExpandedStep>,
}

impl CompiledPipeline {
    /// Distinct synthetic service names, sorted.
    pub fn synthetic_services(&self) -> BTreeSet<&str> {
        self.steps
            .iter()
            .filter_map(ExpandedStep::as_synthetic)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            app_name: self.app_name.clone(),
            steps: self.steps.iter().map(StepSummary::from).collect(),
            mappers: mapper_table(&self.registry),
        }
    }
}

/// Serializable view of a compiled pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub app_name: String,
    pub steps: Vec<StepSummary>,
    pub mappers: Vec<MapperSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub name: String,
    pub kind: StepSummaryKind,
    pub role: DeploymentRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<OperatorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub output: String,
    pub side_effect: bool,
    pub expose_as_http: bool,
    pub expose_as_rpc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSummaryKind {
    Operator,
    Delegate,
    Synthetic,
}

impl From<&ExpandedStep> for StepSummary {
    fn from(step: &ExpandedStep) -> Self {
        match step {
            ExpandedStep::Original(op) => StepSummary {
                name: op.name().to_string(),
                kind: match op.step.kind {
                    StepKind::Delegate => StepSummaryKind::Delegate,
                    StepKind::Operator | StepKind::Internal => StepSummaryKind::Operator,
                },
                role: step.role(),
                operator: Some(op.method.signature()),
                category: Some(op.category),
                input: op.normalized_input.as_ref().map(|s| s.to_string()),
                output: op.normalized_return_type.to_string(),
                side_effect: false,
                expose_as_http: op.step.expose_as_http,
                expose_as_rpc: op.step.expose_as_rpc,
            },
            ExpandedStep::Synthetic(s) => StepSummary {
                name: s.name.clone(),
                kind: StepSummaryKind::Synthetic,
                role: s.role,
                operator: s.plugin_implementation_class.clone(),
                category: None,
                input: Some(s.observed.to_string()),
                output: s.observed.to_string(),
                side_effect: s.side_effect,
                expose_as_http: s.expose_as_http,
                expose_as_rpc: s.expose_as_rpc,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperSummary {
    pub key: String,
    pub mapper: String,
    pub external: String,
    pub wire_dto: String,
    pub domain: String,
}

/// Registry rows in key order.
pub fn mapper_table(registry: &MapperRegistry) -> Vec<MapperSummary> {
    registry
        .entries()
        .map(|entry| MapperSummary {
            key: entry.key.to_string(),
            mapper: entry.mapper_class.name.clone(),
            external: entry.signature.external.to_string(),
            wire_dto: entry.signature.wire_dto.to_string(),
            domain: entry.signature.domain.to_string(),
        })
        .collect()
}
