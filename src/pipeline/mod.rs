//! Pipeline description loader
//!
//! YAML text → `PipelineDto` (serde) → `validate_dto` (collects every
//! structural error) → `lower_dto` (typed `PipelineDefinition`).

pub mod dto;
pub mod lower;
pub mod model;
pub mod validate;
pub mod yaml;

pub use dto::{PipelineDto, Transport};
pub use model::{
    AspectConfig, AspectModel, AspectPosition, AspectScope, PipelineDefinition, StepDefinition,
    StepKind,
};
pub use yaml::{load_pipeline_file, load_pipeline_str, parse_pipeline_yaml};
