//! Pipeline compiler
//!
//! Turns a declarative pipeline description into a resolved, type-checked
//! step graph ready for code generation. Nothing is loaded or executed: every
//! decision is made against a read-only [`SymbolIndex`].
//!
//! ```text
//! pipeline YAML ──► pipeline::load_pipeline_str ──► PipelineDefinition
//!                                                        │
//!                         PipelineCompiler::compile ◄────┘  (+ &dyn SymbolIndex)
//!                                │
//!   resolve ─► normalize ─► policy ─► mappers ─► coverage ─► aspects
//!                                │
//!                                ▼
//!                  CompiledPipeline { registry, steps }
//! ```
//!
//! Every failure is a typed [`CompilationErrorKind`]; passes collect all of
//! their errors before the driver aborts with [`CompilationFailed`].

pub mod aspect;
pub mod compiler;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod mapper;
pub mod pipeline;
pub mod resolve;
pub mod shape;

pub use aspect::{AspectExpander, DeploymentRole, ExpandedStep, SyntheticStep};
pub use compiler::{CompiledPipeline, PipelineCompiler, PipelineSummary, StepSummary};
pub use config::{CompilerConfig, ConfigLoader, MapperKeying, ShapePolicyKind};
pub use errors::{CompilationError, CompilationErrorKind, CompilationFailed, Phase};
pub use mapper::{MapperEntry, MapperKey, MapperRegistry};
pub use pipeline::{
    load_pipeline_file, load_pipeline_str, AspectModel, AspectPosition, AspectScope,
    PipelineDefinition, StepDefinition, StepKind,
};
pub use shape::{NormalizedType, OperatorCategory, ResolvedOperator};

pub use symbol_index::{MemorySymbolIndex, SymbolIndex, TypeRef};
