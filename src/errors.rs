//! Typed compilation error model.
//!
//! Every failure maps to exactly one `CompilationErrorKind` variant and is
//! tagged with the `Phase` that produced it:
//!
//! ```text
//! load      → InvalidPipeline | UnknownAspectConfigKey | InvalidAspectConfig
//! resolve   → MalformedReference | ClassNotFound | DeclaringClassNotConcrete | MethodNotFound
//!             | AmbiguousMethod | MethodNotPublic | MethodAbstract | TooManyParameters
//! normalize → RawWrapper | WrapperArity | NestedWrapper | NonConcreteType
//! policy    → UnsupportedShape
//! mappers   → InvalidMapper | AmbiguousMapper | RegistryInconsistency
//! coverage  → MissingMapper | DomainTypeNotIndexed
//! aspects   → DanglingAspectTarget
//! ```
//!
//! Nothing here is recoverable: the compiler reports and the build stops.
//! Passes collect every error of their phase before the driver aborts, so a
//! single run lists every fix needed.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The compiler pass that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Load,
    Resolve,
    Normalize,
    Policy,
    Mappers,
    Coverage,
    Aspects,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Resolve => "resolve",
            Phase::Normalize => "normalize",
            Phase::Policy => "policy",
            Phase::Mappers => "mappers",
            Phase::Coverage => "coverage",
            Phase::Aspects => "aspects",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompilationErrorKind
// ---------------------------------------------------------------------------

/// All compilation failure modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error_kind", rename_all = "snake_case")]
pub enum CompilationErrorKind {
    /// Pipeline description violates a structural rule.
    #[error("[{rule}] {reason}")]
    InvalidPipeline { rule: String, reason: String },

    /// Aspect config contains a key outside the supported option set.
    #[error("Aspect '{aspect}': unknown config key '{key}' (supported: pluginImplementationClass, targetSteps)")]
    UnknownAspectConfigKey { aspect: String, key: String },

    /// Aspect config value has the wrong shape.
    #[error("Aspect '{aspect}': invalid value for '{key}': {reason}")]
    InvalidAspectConfig {
        aspect: String,
        key: String,
        reason: String,
    },

    /// Operator/delegate string does not match `Class::method`.
    #[error("Step '{step}': malformed operator reference '{reference}': {reason}")]
    MalformedReference {
        step: String,
        reference: String,
        reason: String,
    },

    /// Referenced class absent from the symbol index.
    #[error("Step '{step}': class '{class}' not found in the symbol index")]
    ClassNotFound { step: String, class: String },

    /// Operator reference names an abstract class or an interface.
    #[error("Step '{step}': operator class '{class}' is abstract or an interface; reference a concrete class")]
    DeclaringClassNotConcrete { step: String, class: String },

    /// No method of that name on the class or its supertypes.
    #[error("Step '{step}': no method '{method}' on '{class}' or its supertypes")]
    MethodNotFound {
        step: String,
        class: String,
        method: String,
    },

    /// Overloaded operator method.
    #[error(
        "Step '{step}': ambiguous operator '{class}::{method}': {count} methods named '{method}' found ({}); overloaded operator methods are not supported",
        .candidates.join("; ")
    )]
    AmbiguousMethod {
        step: String,
        class: String,
        method: String,
        count: usize,
        candidates: Vec<String>,
    },

    #[error("Step '{step}': operator method '{method}' must be public")]
    MethodNotPublic { step: String, method: String },

    #[error("Step '{step}': operator method '{method}' is abstract; reference a concrete implementation")]
    MethodAbstract { step: String, method: String },

    #[error("Step '{step}': operator method '{method}' declares {count} parameters; operators take at most one")]
    TooManyParameters {
        step: String,
        method: String,
        count: usize,
    },

    /// Async wrapper used without its type argument.
    #[error("Method '{method}' declares a raw wrapper without a generic parameter: {wrapper}")]
    RawWrapper { method: String, wrapper: String },

    /// Async wrapper with the wrong number of type arguments.
    #[error("Method '{method}': wrapper {wrapper} must declare exactly one type argument, found {count}")]
    WrapperArity {
        method: String,
        wrapper: String,
        count: usize,
    },

    /// Async wrapper whose element is itself an async wrapper.
    #[error("Method '{method}': nested async wrapper '{ty}' cannot be normalized")]
    NestedWrapper { method: String, ty: String },

    /// Wildcard or type variable where a concrete type is needed.
    #[error("Method '{method}': {position} type '{ty}' is not concrete ({reason})")]
    NonConcreteType {
        method: String,
        position: String,
        ty: String,
        reason: String,
    },

    /// Normalized shape rejected by the active shape policy.
    #[error("Step '{step}': {detail} is not supported in this phase")]
    UnsupportedShape { step: String, detail: String },

    /// Mapper whose contract arguments cannot be extracted.
    #[error("Mapper '{mapper}' is invalid: {reason}")]
    InvalidMapper { mapper: String, reason: String },

    /// Two mapper implementations claim the same key.
    #[error("Ambiguous mapper for {key}: both '{first}' and '{second}' claim it")]
    AmbiguousMapper {
        key: String,
        first: String,
        second: String,
    },

    /// Forward and reverse registry maps disagree.
    #[error("Mapper registry inconsistency: {detail}")]
    RegistryInconsistency { detail: String },

    /// Domain type is indexed but nothing maps it.
    #[error("Step '{step}': no mapper for {direction} domain type '{domain_type}'")]
    MissingMapper {
        step: String,
        domain_type: String,
        direction: String,
    },

    /// Domain type is not in the symbol index at all.
    #[error("Step '{step}': {direction} domain type '{domain_type}' is not in the symbol index; check the classpath")]
    DomainTypeNotIndexed {
        step: String,
        domain_type: String,
        direction: String,
    },

    /// Aspect targets a step that does not exist among the resolved steps.
    #[error("Aspect '{aspect}' targets unknown step '{step}'")]
    DanglingAspectTarget { aspect: String, step: String },
}

impl CompilationErrorKind {
    /// Tag this kind with the phase that produced it.
    pub fn in_phase(self, phase: Phase) -> CompilationError {
        CompilationError::new(self, phase)
    }
}

// ---------------------------------------------------------------------------
// CompilationError / CompilationFailed
// ---------------------------------------------------------------------------

/// A typed compilation error plus the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{phase}] {kind}")]
pub struct CompilationError {
    pub kind: CompilationErrorKind,
    pub phase: Phase,
}

impl CompilationError {
    pub fn new(kind: CompilationErrorKind, phase: Phase) -> Self {
        Self { kind, phase }
    }
}

/// Aggregate failure returned by the compiler driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("compilation failed with {} error(s):\n{}", .errors.len(), render_lines(.errors))]
pub struct CompilationFailed {
    pub errors: Vec<CompilationError>,
}

impl CompilationFailed {
    /// Tag a batch of kinds from one phase.
    pub fn from_kinds(phase: Phase, kinds: impl IntoIterator<Item = CompilationErrorKind>) -> Self {
        Self {
            errors: kinds.into_iter().map(|k| k.in_phase(phase)).collect(),
        }
    }

    pub fn phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = Vec::new();
        for e in &self.errors {
            if !phases.contains(&e.phase) {
                phases.push(e.phase);
            }
        }
        phases
    }

    pub fn kinds(&self) -> impl Iterator<Item = &CompilationErrorKind> {
        self.errors.iter().map(|e| &e.kind)
    }
}

fn render_lines(errors: &[CompilationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
