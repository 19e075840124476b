//! Mapper discovery.
//!
//! Every non-interface implementor of the mapping contract is scanned for the
//! parameterized form of the contract it inherits. Interfaces are searched
//! recursively before the superclass chain, so a contract re-declared by an
//! intermediate interface (`RowMapper<D> extends Mapper<Row, RowDto, D>`) still
//! yields concrete arguments.

use crate::errors::CompilationErrorKind;
use serde::{Deserialize, Serialize};
use symbol_index::{ClassDescriptor, HierarchyWalker, SymbolIndex, TypeRef};
use tracing::debug;

/// Names of the contract's three type arguments, in declaration order.
pub const CONTRACT_ARGUMENTS: [&str; 3] = ["external", "wireDto", "domain"];

/// The `(external, wire DTO, domain)` triple of one mapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapperSignature {
    pub external: TypeRef,
    pub wire_dto: TypeRef,
    pub domain: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredMapper {
    pub class: ClassDescriptor,
    pub signature: MapperSignature,
}

pub struct MapperInference<'a> {
    index: &'a dyn SymbolIndex,
    contract: &'a str,
    root_type: &'a str,
}

impl<'a> MapperInference<'a> {
    pub fn new(index: &'a dyn SymbolIndex, contract: &'a str, root_type: &'a str) -> Self {
        Self {
            index,
            contract,
            root_type,
        }
    }

    /// Discover every concrete mapper. Invalid mappers are reported without
    /// stopping discovery of the rest.
    pub fn discover(&self) -> (Vec<DiscoveredMapper>, Vec<CompilationErrorKind>) {
        let mut mappers = Vec::new();
        let mut errors = Vec::new();

        for class in self.index.known_implementors_of(self.contract) {
            if class.is_abstract() {
                debug!("Skipping abstract mapper {}", class.name);
                continue;
            }
            match self.extract(class) {
                Ok(signature) => {
                    debug!(
                        "Mapper {}: {} <-> {} <-> {}",
                        class.name, signature.external, signature.wire_dto, signature.domain
                    );
                    mappers.push(DiscoveredMapper {
                        class: class.clone(),
                        signature,
                    });
                }
                Err(err) => errors.push(err),
            }
        }

        (mappers, errors)
    }

    /// Extract the contract arguments `class` supplies.
    pub fn extract(
        &self,
        class: &ClassDescriptor,
    ) -> Result<MapperSignature, CompilationErrorKind> {
        let invalid = |reason: String| CompilationErrorKind::InvalidMapper {
            mapper: class.name.clone(),
            reason,
        };

        let walker = HierarchyWalker::new(self.index).with_root_type(self.root_type);
        let applied = walker
            .find_parameterization(class, self.contract)
            .ok_or_else(|| {
                invalid(format!(
                    "no parameterized {} found in its hierarchy",
                    self.contract
                ))
            })?;

        let args = applied.args();
        if args.is_empty() {
            return Err(invalid(format!("implements raw {}", self.contract)));
        }
        if args.len() != CONTRACT_ARGUMENTS.len() {
            return Err(invalid(format!(
                "{} takes {} type arguments, found {}",
                self.contract,
                CONTRACT_ARGUMENTS.len(),
                args.len()
            )));
        }

        let problems: Vec<String> = CONTRACT_ARGUMENTS
            .iter()
            .zip(args)
            .filter_map(|(role, arg)| match arg.first_unresolved() {
                Some(TypeRef::Wildcard(_)) => {
                    Some(format!("{} type '{}' contains a wildcard", role, arg))
                }
                Some(var) => Some(format!(
                    "{} type '{}' leaves type variable {} unresolved",
                    role, arg, var
                )),
                None if arg.is_primitive() || arg.is_void() => {
                    Some(format!("{} type '{}' is not a reference type", role, arg))
                }
                None => None,
            })
            .collect();
        if !problems.is_empty() {
            return Err(invalid(problems.join("; ")));
        }

        Ok(MapperSignature {
            external: args[0].clone(),
            wire_dto: args[1].clone(),
            domain: args[2].clone(),
        })
    }
}
