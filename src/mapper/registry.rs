//! Immutable, bidirectional mapper registry.

use super::inference::{DiscoveredMapper, MapperSignature};
use crate::config::MapperKeying;
use crate::errors::CompilationErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use symbol_index::{ClassDescriptor, TypeRef};
use tracing::info;

/// Registry key; the variant in use is fixed by `MapperKeying`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKey {
    Domain(TypeRef),
    DomainAndExternal { domain: TypeRef, external: TypeRef },
}

impl MapperKey {
    pub fn for_signature(signature: &MapperSignature, keying: MapperKeying) -> Self {
        match keying {
            MapperKeying::Domain => MapperKey::Domain(signature.domain.clone()),
            MapperKeying::DomainAndExternal => MapperKey::DomainAndExternal {
                domain: signature.domain.clone(),
                external: signature.external.clone(),
            },
        }
    }

    pub fn domain(&self) -> &TypeRef {
        match self {
            MapperKey::Domain(domain) | MapperKey::DomainAndExternal { domain, .. } => domain,
        }
    }
}

impl fmt::Display for MapperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperKey::Domain(domain) => write!(f, "domain type '{}'", domain),
            MapperKey::DomainAndExternal { domain, external } => {
                write!(f, "domain type '{}' with external type '{}'", domain, external)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapperEntry {
    pub key: MapperKey,
    pub mapper_class: ClassDescriptor,
    pub signature: MapperSignature,
}

/// Forward (`key → mapper`) and reverse (`mapper → key`) lookups, built once
/// and checked to be exact inverses.
#[derive(Debug, Clone, Default)]
pub struct MapperRegistry {
    keying: MapperKeying,
    forward: BTreeMap<MapperKey, MapperEntry>,
    reverse: BTreeMap<String, MapperKey>,
}

impl MapperRegistry {
    /// Build from discovered mappers. Every key collision is reported, each
    /// naming both competing classes.
    pub fn build(
        mappers: Vec<DiscoveredMapper>,
        keying: MapperKeying,
    ) -> Result<Self, Vec<CompilationErrorKind>> {
        let mut registry = Self {
            keying,
            ..Self::default()
        };
        let mut errors = Vec::new();

        for mapper in mappers {
            let key = MapperKey::for_signature(&mapper.signature, keying);
            if let Some(existing) = registry.forward.get(&key) {
                errors.push(CompilationErrorKind::AmbiguousMapper {
                    key: key.to_string(),
                    first: existing.mapper_class.name.clone(),
                    second: mapper.class.name.clone(),
                });
                continue;
            }
            registry.reverse.insert(mapper.class.name.clone(), key.clone());
            registry.forward.insert(
                key.clone(),
                MapperEntry {
                    key,
                    mapper_class: mapper.class,
                    signature: mapper.signature,
                },
            );
        }

        errors.extend(registry.verify_inverse());
        if !errors.is_empty() {
            return Err(errors);
        }

        info!("Mapper registry built: {} mappers ({:?} keying)", registry.len(), keying);
        Ok(registry)
    }

    /// Check that forward and reverse maps are exact inverses.
    fn verify_inverse(&self) -> Vec<CompilationErrorKind> {
        let mut errors = Vec::new();
        for (key, entry) in &self.forward {
            if entry.key != *key {
                errors.push(CompilationErrorKind::RegistryInconsistency {
                    detail: format!("entry for {} records key {}", key, entry.key),
                });
            }
            match self.reverse.get(&entry.mapper_class.name) {
                Some(back) if back == key => {}
                Some(back) => errors.push(CompilationErrorKind::RegistryInconsistency {
                    detail: format!(
                        "{} maps to '{}' but '{}' maps back to {}",
                        key, entry.mapper_class.name, entry.mapper_class.name, back
                    ),
                }),
                None => errors.push(CompilationErrorKind::RegistryInconsistency {
                    detail: format!("'{}' has no reverse entry", entry.mapper_class.name),
                }),
            }
        }
        for (mapper, key) in &self.reverse {
            let consistent = self
                .forward
                .get(key)
                .is_some_and(|entry| entry.mapper_class.name == *mapper);
            if !consistent {
                errors.push(CompilationErrorKind::RegistryInconsistency {
                    detail: format!(
                        "reverse entry '{}' → {} has no matching forward entry",
                        mapper, key
                    ),
                });
            }
        }
        errors
    }

    pub fn keying(&self) -> MapperKeying {
        self.keying
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Forward lookup.
    pub fn mapper_for(&self, key: &MapperKey) -> Option<&MapperEntry> {
        self.forward.get(key)
    }

    /// Reverse lookup by mapper class name.
    pub fn key_for(&self, mapper_class: &str) -> Option<&MapperKey> {
        self.reverse.get(mapper_class)
    }

    /// Every mapper whose domain type is exactly `domain`.
    pub fn mappers_for_domain(&self, domain: &TypeRef) -> Vec<&MapperEntry> {
        self.forward
            .values()
            .filter(|entry| entry.key.domain() == domain)
            .collect()
    }

    pub fn has_domain(&self, domain: &TypeRef) -> bool {
        self.forward.keys().any(|key| key.domain() == domain)
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &MapperEntry> {
        self.forward.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(sig: &str) -> TypeRef {
        TypeRef::parse(sig).unwrap()
    }

    fn mapper(class: &str, external: &str, domain: &str) -> DiscoveredMapper {
        DiscoveredMapper {
            class: ClassDescriptor::new(class),
            signature: MapperSignature {
                external: t(external),
                wire_dto: t("com.example.Dto"),
                domain: t(domain),
            },
        }
    }

    fn mappers() -> Vec<DiscoveredMapper> {
        vec![
            mapper(
                "com.example.GrpcPaymentMapper",
                "com.example.grpc.Payment",
                "com.example.Payment",
            ),
            mapper(
                "com.example.RestPaymentMapper",
                "com.example.rest.Payment",
                "com.example.Payment",
            ),
        ]
    }

    #[test]
    fn domain_keying_rejects_second_mapper_naming_both() {
        let errors = MapperRegistry::build(mappers(), MapperKeying::Domain).unwrap_err();
        assert_eq!(errors.len(), 1);
        let msg = errors[0].to_string();
        assert!(msg.contains("com.example.GrpcPaymentMapper"));
        assert!(msg.contains("com.example.RestPaymentMapper"));
    }

    #[test]
    fn pair_keying_allows_distinct_external_types() {
        let registry = MapperRegistry::build(mappers(), MapperKeying::DomainAndExternal).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.mappers_for_domain(&t("com.example.Payment")).len(), 2);

        let key = MapperKey::DomainAndExternal {
            domain: t("com.example.Payment"),
            external: t("com.example.rest.Payment"),
        };
        let entry = registry.mapper_for(&key).unwrap();
        assert_eq!(entry.mapper_class.name, "com.example.RestPaymentMapper");
        assert_eq!(registry.key_for("com.example.RestPaymentMapper"), Some(&key));
    }

    #[test]
    fn pair_keying_rejects_same_domain_and_external() {
        let mut discovered = mappers();
        discovered.push(mapper(
            "com.example.LegacyGrpcPaymentMapper",
            "com.example.grpc.Payment",
            "com.example.Payment",
        ));

        let errors =
            MapperRegistry::build(discovered, MapperKeying::DomainAndExternal).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            CompilationErrorKind::AmbiguousMapper { first, second, .. } => {
                assert_eq!(first, "com.example.GrpcPaymentMapper");
                assert_eq!(second, "com.example.LegacyGrpcPaymentMapper");
            }
            other => panic!("unexpected {other:?}"),
        }
        let msg = errors[0].to_string();
        assert!(msg.contains("com.example.grpc.Payment"));
    }

    #[test]
    fn broken_inverse_is_detected() {
        let mut registry =
            MapperRegistry::build(mappers()[..1].to_vec(), MapperKeying::Domain).unwrap();
        assert!(registry.verify_inverse().is_empty());

        registry.reverse.insert(
            "com.example.GrpcPaymentMapper".into(),
            MapperKey::Domain(t("com.example.Other")),
        );
        let errors = registry.verify_inverse();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, CompilationErrorKind::RegistryInconsistency { .. })));
    }
}
