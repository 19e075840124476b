//! Typed pipeline model produced by the loader.
//!
//! Everything here is immutable once built: later passes borrow it and never
//! write back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dto::Transport;
use crate::errors::CompilationErrorKind;

/// Config key naming the side-effect implementation class.
pub const PLUGIN_IMPLEMENTATION_CLASS_KEY: &str = "pluginImplementationClass";
/// Config key listing target step names for `scope: STEPS`.
pub const TARGET_STEPS_KEY: &str = "targetSteps";

/// How a step's processing logic is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Direct method reference.
    Operator,
    /// Adapter to an external implementation; resolved the same way.
    Delegate,
    /// No reference; resolved elsewhere.
    Internal,
}

/// One declared step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub operator_reference: Option<String>,
    pub kind: StepKind,
    pub expose_as_http: bool,
    pub expose_as_rpc: bool,
}

impl StepDefinition {
    pub fn operator(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::with_reference(name, Some(reference.into()), StepKind::Operator)
    }

    pub fn delegate(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::with_reference(name, Some(reference.into()), StepKind::Delegate)
    }

    pub fn internal(name: impl Into<String>) -> Self {
        Self::with_reference(name, None, StepKind::Internal)
    }

    fn with_reference(name: impl Into<String>, reference: Option<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            operator_reference: reference,
            kind,
            expose_as_http: false,
            expose_as_rpc: true,
        }
    }

    /// Builder: set both exposure flags.
    pub fn exposed(mut self, http: bool, rpc: bool) -> Self {
        self.expose_as_http = http;
        self.expose_as_rpc = rpc;
        self
    }

    pub fn is_internal(&self) -> bool {
        self.kind == StepKind::Internal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectScope {
    Global,
    Steps(Vec<String>),
}

impl AspectScope {
    pub fn applies_to(&self, step_name: &str) -> bool {
        match self {
            AspectScope::Global => true,
            AspectScope::Steps(targets) => targets.iter().any(|t| t == step_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AspectPosition {
    BeforeStep,
    AfterStep,
}

/// Typed replacement for the free-form aspect `config` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectConfig {
    pub plugin_implementation_class: Option<String>,
    pub target_steps: Vec<String>,
}

impl AspectConfig {
    /// Parse the raw map. Unknown keys are errors when `strict`, otherwise
    /// logged and dropped.
    pub fn from_map(
        aspect: &str,
        raw: &IndexMap<String, serde_yaml::Value>,
        strict: bool,
    ) -> Result<Self, Vec<CompilationErrorKind>> {
        let mut config = AspectConfig::default();
        let mut errors = Vec::new();

        for (key, value) in raw {
            match key.as_str() {
                PLUGIN_IMPLEMENTATION_CLASS_KEY => match value {
                    serde_yaml::Value::String(s) if !s.trim().is_empty() => {
                        config.plugin_implementation_class = Some(s.trim().to_string());
                    }
                    _ => errors.push(CompilationErrorKind::InvalidAspectConfig {
                        aspect: aspect.to_string(),
                        key: key.clone(),
                        reason: "expected a non-empty class name".to_string(),
                    }),
                },
                TARGET_STEPS_KEY => match parse_target_steps(value) {
                    Some(targets) => config.target_steps = targets,
                    None => errors.push(CompilationErrorKind::InvalidAspectConfig {
                        aspect: aspect.to_string(),
                        key: key.clone(),
                        reason: "expected a list of step names or a comma-separated string"
                            .to_string(),
                    }),
                },
                _ if strict => errors.push(CompilationErrorKind::UnknownAspectConfigKey {
                    aspect: aspect.to_string(),
                    key: key.clone(),
                }),
                _ => warn!("Aspect '{}': ignoring unknown config key '{}'", aspect, key),
            }
        }

        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

/// `targetSteps` accepts a YAML list or a comma-separated string.
pub(crate) fn parse_target_steps(value: &serde_yaml::Value) -> Option<Vec<String>> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .collect(),
        serde_yaml::Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// A cross-cutting behaviour woven around steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectModel {
    pub name: String,
    pub scope: AspectScope,
    pub position: AspectPosition,
    pub order: i32,
    pub config: AspectConfig,
    pub enabled: bool,
}

impl AspectModel {
    pub fn global(name: impl Into<String>, position: AspectPosition) -> Self {
        Self {
            name: name.into(),
            scope: AspectScope::Global,
            position,
            order: 0,
            config: AspectConfig::default(),
            enabled: true,
        }
    }

    pub fn for_steps(name: impl Into<String>, position: AspectPosition, targets: &[&str]) -> Self {
        let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        Self {
            scope: AspectScope::Steps(targets.clone()),
            config: AspectConfig {
                plugin_implementation_class: None,
                target_steps: targets,
            },
            ..Self::global(name, position)
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The loaded pipeline: ordered steps plus aspects in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub app_name: String,
    pub base_package: Option<String>,
    pub transport: Transport,
    pub steps: Vec<StepDefinition>,
    pub aspects: Vec<AspectModel>,
}

impl PipelineDefinition {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            base_package: None,
            transport: Transport::default(),
            steps: Vec::new(),
            aspects: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_aspect(mut self, aspect: AspectModel) -> Self {
        self.aspects.push(aspect);
        self
    }

    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.name == name)
    }
}
