//! Step/mapper coverage validation.
//!
//! Every domain type flowing into or out of a resolved operator needs a
//! mapper. A missing mapper for an indexed type is an omission in the mapper
//! set; a missing mapper for a type the index has never seen points at the
//! classpath instead, so the two are reported differently.

use crate::config::CompilerConfig;
use crate::errors::CompilationErrorKind;
use crate::mapper::MapperRegistry;
use crate::shape::ResolvedOperator;
use symbol_index::{SymbolIndex, TypeRef};

pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";

/// Check every operator; all gaps are returned together.
pub fn check_coverage<'o>(
    operators: impl IntoIterator<Item = &'o ResolvedOperator>,
    registry: &MapperRegistry,
    index: &dyn SymbolIndex,
    config: &CompilerConfig,
) -> Vec<CompilationErrorKind> {
    let mut errors = Vec::new();
    for operator in operators {
        let sides = operator
            .input_domain_type()
            .map(|ty| (INPUT, ty))
            .into_iter()
            .chain(std::iter::once((OUTPUT, operator.output_domain_type())));

        for (direction, domain) in sides {
            if let Some(err) =
                check_domain(operator.name(), direction, domain, registry, index, config)
            {
                errors.push(err);
            }
        }
    }
    errors
}

fn check_domain(
    step: &str,
    direction: &str,
    domain: &TypeRef,
    registry: &MapperRegistry,
    index: &dyn SymbolIndex,
    config: &CompilerConfig,
) -> Option<CompilationErrorKind> {
    let rendered = domain.to_string();
    if config.is_mapper_exempt(&rendered) || registry.has_domain(domain) {
        return None;
    }

    let indexed = domain.erasure().is_some_and(|name| index.contains(name));
    Some(if indexed {
        CompilationErrorKind::MissingMapper {
            step: step.to_string(),
            domain_type: rendered,
            direction: direction.to_string(),
        }
    } else {
        CompilationErrorKind::DomainTypeNotIndexed {
            step: step.to_string(),
            domain_type: rendered,
            direction: direction.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperKeying;
    use crate::mapper::{DiscoveredMapper, MapperSignature};
    use crate::pipeline::StepDefinition;
    use crate::shape::{NormalizedType, OperatorCategory};
    use symbol_index::{ClassDescriptor, MemorySymbolIndex, MethodDescriptor};

    fn t(sig: &str) -> TypeRef {
        TypeRef::parse(sig).unwrap()
    }

    fn operator(name: &str, input: Option<&str>, output: &str) -> ResolvedOperator {
        ResolvedOperator {
            step: StepDefinition::operator(name, "com.example.S::run"),
            declaring_class: ClassDescriptor::new("com.example.S"),
            method: MethodDescriptor::new("run", vec![], TypeRef::Void),
            input_type: input.map(t),
            raw_return_type: t(output),
            normalized_input: input.map(|i| NormalizedType::Single(t(i))),
            normalized_return_type: NormalizedType::Single(t(output)),
            category: OperatorCategory::NonReactive,
        }
    }

    #[test]
    fn distinguishes_missing_from_unindexed() {
        let index = MemorySymbolIndex::new()
            .with_class(ClassDescriptor::new("com.example.Folder"))
            .with_class(ClassDescriptor::new("com.example.File"))
            .with_class(ClassDescriptor::new("com.example.Payment"));
        let registry = MapperRegistry::build(
            vec![DiscoveredMapper {
                class: ClassDescriptor::new("com.example.FolderMapper"),
                signature: MapperSignature {
                    external: t("com.example.grpc.Folder"),
                    wire_dto: t("com.example.FolderDto"),
                    domain: t("com.example.Folder"),
                },
            }],
            MapperKeying::Domain,
        )
        .unwrap();

        let operators = vec![
            operator("a", Some("com.example.Folder"), "com.example.File"),
            operator("b", Some("com.example.Ghost"), "java.lang.Void"),
            operator("c", None, "com.example.Payment"),
        ];
        let errors = check_coverage(&operators, &registry, &index, &CompilerConfig::default());

        assert_eq!(errors.len(), 3);
        assert!(matches!(
            &errors[0],
            CompilationErrorKind::MissingMapper { step, direction, .. }
                if step == "a" && direction == OUTPUT
        ));
        assert!(matches!(
            &errors[1],
            CompilationErrorKind::DomainTypeNotIndexed { domain_type, .. }
                if domain_type == "com.example.Ghost"
        ));
        assert!(matches!(
            &errors[2],
            CompilationErrorKind::MissingMapper { step, .. } if step == "c"
        ));
    }
}
