//! Core trait and errors for the symbol index abstraction
//!
//! This module defines the `SymbolIndex` trait: the read-only query surface
//! the compiler passes use to look up classes, hierarchies, and method
//! signatures. Implementations never load or execute user code; they answer
//! from pre-parsed metadata (a classfile scanner, an IR dump, or the in-memory
//! `MemorySymbolIndex` used by the CLI and tests).

use crate::descriptor::ClassDescriptor;

/// The whole-program query surface.
///
/// Implementations are built once per compilation and only read afterwards,
/// so queries take `&self` and return borrowed descriptors.
pub trait SymbolIndex {
    /// Look up a class or interface by fully-qualified name.
    fn class_by_name(&self, name: &str) -> Option<&ClassDescriptor>;

    /// All known non-interface classes that implement `interface_name`,
    /// directly, through a superclass, or through an extending interface.
    ///
    /// Returned in name order so downstream diagnostics are deterministic.
    fn known_implementors_of(&self, interface_name: &str) -> Vec<&ClassDescriptor>;

    /// Check whether a type is present in the index.
    fn contains(&self, name: &str) -> bool {
        self.class_by_name(name).is_some()
    }
}

/// Errors that can occur while building an index from metadata files
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Failed to read index file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse index YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse index JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate class in index: {0}")]
    DuplicateClass(String),
    #[error("Unsupported index file extension: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}
