//! Mapper inference
//!
//! `MapperInference` finds every implementor of the three-parameter mapping
//! contract and extracts its `(external, wire DTO, domain)` arguments;
//! `MapperRegistry` keys them and guarantees the key space is injective.

pub mod inference;
pub mod registry;

pub use inference::{DiscoveredMapper, MapperInference, MapperSignature, CONTRACT_ARGUMENTS};
pub use registry::{MapperEntry, MapperKey, MapperRegistry};
