//! Symbol Index - Level 1 foundation types for the pipeline compiler
//!
//! A read-only, whole-program view of classes, their superclass/interface
//! lists and method signatures, queried without loading or executing code.
//!
//! ## Contents
//!
//! - `TypeRef` - generic type references in signature syntax
//! - `ClassDescriptor` / `MethodDescriptor` - pre-parsed metadata
//! - `SymbolIndex` - the query trait the compiler passes depend on
//! - `MemorySymbolIndex` - map-backed implementation loaded from YAML/JSON
//! - `HierarchyWalker` - supertype walks with type-variable substitution
//!
//! This crate depends on nothing else in the workspace.

pub mod descriptor;
pub mod hierarchy;
pub mod memory;
pub mod traits;
pub mod types;

pub use descriptor::{ClassDescriptor, ClassKind, MethodDescriptor};
pub use hierarchy::{bindings_for, substitute, HierarchyWalker, Supertype, TypeBindings};
pub use memory::{IndexFile, MemorySymbolIndex};
pub use traits::{IndexError, SymbolIndex};
pub use types::{Modifier, PrimitiveKind, TypeParseError, TypeRef, WildcardBound};
