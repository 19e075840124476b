//! Compiler configuration
//!
//! `CompilerConfig` carries every tunable of the five passes; `ConfigLoader`
//! finds and validates the YAML file that overrides the defaults.

pub mod loader;
pub mod types;

pub use loader::{validate_config, ConfigLoader, CONFIG_ENV_VAR};
pub use types::{
    CompilerConfig, MapperKeying, ShapePolicyKind, TypeVocabulary, DEFAULT_MAPPER_CONTRACT,
    DEFAULT_NO_VALUE_TYPE, DEFAULT_ROOT_TYPE,
};
