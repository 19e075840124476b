//! Operator method resolution.
//!
//! Lookup order for `Class::method`:
//!
//! 1. methods declared on `Class` itself
//! 2. each superclass, nearest first, stopping at the root type
//! 3. every interface reachable from `Class` and its superclasses
//!
//! The first level with any match is the resolution point. More than one
//! match there is an ambiguity; overloads are never disambiguated.

use crate::errors::CompilationErrorKind;
use crate::pipeline::StepDefinition;
use crate::resolve::reference::OperatorReference;
use symbol_index::{
    substitute, ClassDescriptor, HierarchyWalker, MethodDescriptor, Modifier, SymbolIndex,
    TypeBindings, TypeRef,
};
use tracing::debug;

/// A step bound to exactly one method, before shape classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMethod {
    /// The class named in the reference
    pub declaring_class: ClassDescriptor,
    /// The method with supertype type variables substituted; its own
    /// `declaring_class` still names the type that declares it
    pub method: MethodDescriptor,
    /// The sole parameter, `None` for a niladic method
    pub input_type: Option<TypeRef>,
    pub return_type: TypeRef,
}

pub struct OperatorResolver<'a> {
    index: &'a dyn SymbolIndex,
    root_type: &'a str,
}

struct Candidate<'c> {
    method: &'c MethodDescriptor,
    owner_is_interface: bool,
    bindings: TypeBindings,
}

impl<'a> OperatorResolver<'a> {
    pub fn new(index: &'a dyn SymbolIndex, root_type: &'a str) -> Self {
        Self { index, root_type }
    }

    /// Resolve one step's reference.
    pub fn resolve(&self, step: &StepDefinition) -> Result<ResolvedMethod, CompilationErrorKind> {
        let Some(raw) = step.operator_reference.as_deref() else {
            return Err(CompilationErrorKind::MalformedReference {
                step: step.name.clone(),
                reference: String::new(),
                reason: "step declares no operator or delegate".to_string(),
            });
        };
        let reference = OperatorReference::parse(&step.name, raw)?;

        let class = self
            .index
            .class_by_name(&reference.class_name)
            .ok_or_else(|| CompilationErrorKind::ClassNotFound {
                step: step.name.clone(),
                class: reference.class_name.clone(),
            })?;
        if class.is_abstract() {
            return Err(CompilationErrorKind::DeclaringClassNotConcrete {
                step: step.name.clone(),
                class: reference.class_name.clone(),
            });
        }

        let candidates = self.find_candidates(class, &reference.method_name);
        let candidate = match candidates.len() {
            0 => {
                return Err(CompilationErrorKind::MethodNotFound {
                    step: step.name.clone(),
                    class: reference.class_name.clone(),
                    method: reference.method_name.clone(),
                })
            }
            1 => &candidates[0],
            count => {
                return Err(CompilationErrorKind::AmbiguousMethod {
                    step: step.name.clone(),
                    class: reference.class_name.clone(),
                    method: reference.method_name.clone(),
                    count,
                    candidates: candidates.iter().map(|c| c.method.signature()).collect(),
                })
            }
        };

        let method = specialize(candidate.method, &candidate.bindings);
        let signature = method.signature();

        if !method.is_public() {
            return Err(CompilationErrorKind::MethodNotPublic {
                step: step.name.clone(),
                method: signature,
            });
        }
        let is_abstract = method.is_abstract()
            || (candidate.owner_is_interface
                && !method.has_modifier(Modifier::Default)
                && !method.is_static());
        if is_abstract {
            return Err(CompilationErrorKind::MethodAbstract {
                step: step.name.clone(),
                method: signature,
            });
        }
        if method.parameters.len() > 1 {
            return Err(CompilationErrorKind::TooManyParameters {
                step: step.name.clone(),
                method: signature,
                count: method.parameters.len(),
            });
        }

        debug!("Step '{}' resolved to {}", step.name, signature);
        Ok(ResolvedMethod {
            declaring_class: class.clone(),
            input_type: method.parameters.first().cloned(),
            return_type: method.return_type.clone(),
            method,
        })
    }

    fn find_candidates<'c>(&self, class: &'c ClassDescriptor, name: &str) -> Vec<Candidate<'c>>
    where
        'a: 'c,
    {
        let own: Vec<Candidate<'c>> = class
            .declared_methods_named(name)
            .into_iter()
            .map(|method| Candidate {
                method,
                owner_is_interface: class.is_interface(),
                bindings: TypeBindings::new(),
            })
            .collect();
        if !own.is_empty() {
            return own;
        }

        let walker = HierarchyWalker::new(self.index).with_root_type(self.root_type);
        let levels = walker
            .superclass_chain(class)
            .into_iter()
            .chain(walker.interface_closure(class));

        for supertype in levels {
            let found: Vec<Candidate<'c>> = supertype
                .class
                .declared_methods_named(name)
                .into_iter()
                .map(|method| Candidate {
                    method,
                    owner_is_interface: supertype.class.is_interface(),
                    bindings: supertype.bindings.clone(),
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

fn specialize(method: &MethodDescriptor, bindings: &TypeBindings) -> MethodDescriptor {
    let mut method = method.clone();
    if bindings.is_empty() {
        return method;
    }
    method.parameters = method
        .parameters
        .iter()
        .map(|p| substitute(p, bindings))
        .collect();
    method.return_type = substitute(&method.return_type, bindings);
    method
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbol_index::MemorySymbolIndex;

    fn t(sig: &str) -> TypeRef {
        TypeRef::parse(sig).unwrap()
    }

    fn step(reference: &str) -> StepDefinition {
        StepDefinition::operator("step", reference)
    }

    fn index() -> MemorySymbolIndex {
        MemorySymbolIndex::new()
            .with_class(ClassDescriptor::new("java.lang.Object").with_method(MethodDescriptor::new(
                "toString",
                vec![],
                t("java.lang.String"),
            )))
            .with_class(
                ClassDescriptor::new("com.example.Foo")
                    .with_method(MethodDescriptor::new(
                        "bar",
                        vec![t("java.lang.String")],
                        t("java.lang.String"),
                    ))
                    .with_method(MethodDescriptor::new(
                        "bar",
                        vec![t("java.lang.Integer")],
                        t("java.lang.String"),
                    ))
                    .with_method(MethodDescriptor::new("<init>", vec![], TypeRef::Void))
                    .with_method(
                        MethodDescriptor::new("hidden", vec![], TypeRef::Void)
                            .with_modifiers(&[Modifier::Private]),
                    )
                    .with_method(MethodDescriptor::new(
                        "pair",
                        vec![t("java.lang.String"), t("java.lang.String")],
                        TypeRef::Void,
                    )),
            )
            .with_class(
                ClassDescriptor::new("com.example.BaseService")
                    .with_type_parameters(&["I", "O"])
                    .with_modifier(Modifier::Abstract)
                    .extending(t("java.lang.Object"))
                    .with_method(MethodDescriptor::new(
                        "process",
                        vec![TypeRef::TypeVar("I".into())],
                        t("io.smallrye.mutiny.Uni<O>"),
                    ))
                    .with_method(
                        MethodDescriptor::new("template", vec![], TypeRef::Void)
                            .with_modifiers(&[Modifier::Public, Modifier::Abstract]),
                    ),
            )
            .with_class(
                ClassDescriptor::new("com.example.CsvService").extending(t(
                    "com.example.BaseService<com.example.CsvFolder, com.example.CsvFile>",
                )),
            )
            .with_class(
                ClassDescriptor::interface("com.example.Greeter")
                    .with_method(
                        MethodDescriptor::new("greet", vec![], t("java.lang.String"))
                            .with_modifiers(&[Modifier::Public, Modifier::Default]),
                    )
                    .with_method(MethodDescriptor::new("name", vec![], t("java.lang.String"))),
            )
            .with_class(
                ClassDescriptor::new("com.example.Hello").implementing(t("com.example.Greeter")),
            )
            .with_class(
                ClassDescriptor::interface("com.example.Util").with_method(
                    MethodDescriptor::new("make", vec![], t("java.lang.String"))
                        .with_modifiers(&[Modifier::Public, Modifier::Static]),
                ),
            )
    }

    fn resolve(reference: &str) -> Result<ResolvedMethod, CompilationErrorKind> {
        let index = index();
        OperatorResolver::new(&index, "java.lang.Object").resolve(&step(reference))
    }

    #[test]
    fn overloads_are_ambiguous_with_count() {
        let err = resolve("com.example.Foo::bar").unwrap_err();
        match &err {
            CompilationErrorKind::AmbiguousMethod { class, method, count, .. } => {
                assert_eq!(
                    (class.as_str(), method.as_str(), *count),
                    ("com.example.Foo", "bar", 2)
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("com.example.Foo::bar"));
    }

    #[test]
    fn inherited_generic_method_is_specialized() {
        let resolved = resolve("com.example.CsvService::process").unwrap();
        assert_eq!(resolved.declaring_class.name, "com.example.CsvService");
        assert_eq!(resolved.method.declaring_class, "com.example.BaseService");
        assert_eq!(resolved.input_type, Some(t("com.example.CsvFolder")));
        assert_eq!(resolved.return_type, t("io.smallrye.mutiny.Uni<com.example.CsvFile>"));
    }

    #[test]
    fn walk_stops_at_root_type() {
        assert!(matches!(
            resolve("com.example.CsvService::toString"),
            Err(CompilationErrorKind::MethodNotFound { .. })
        ));
    }

    #[test]
    fn signature_constraints_have_distinct_errors() {
        assert!(matches!(
            resolve("com.example.Foo::hidden"),
            Err(CompilationErrorKind::MethodNotPublic { .. })
        ));
        assert!(matches!(
            resolve("com.example.CsvService::template"),
            Err(CompilationErrorKind::MethodAbstract { .. })
        ));
        assert!(matches!(
            resolve("com.example.Foo::pair"),
            Err(CompilationErrorKind::TooManyParameters { count: 2, .. })
        ));
        assert!(matches!(
            resolve("com.example.Foo::<init>"),
            Err(CompilationErrorKind::MalformedReference { .. })
        ));
        assert!(matches!(
            resolve("com.example.Nope::run"),
            Err(CompilationErrorKind::ClassNotFound { .. })
        ));
    }

    #[test]
    fn interface_methods_need_a_body() {
        let greet = resolve("com.example.Hello::greet").unwrap();
        assert_eq!(greet.input_type, None);
        assert!(matches!(
            resolve("com.example.Hello::name"),
            Err(CompilationErrorKind::MethodAbstract { .. })
        ));
    }

    #[test]
    fn declaring_class_must_be_concrete() {
        match resolve("com.example.BaseService::process") {
            Err(CompilationErrorKind::DeclaringClassNotConcrete { class, .. }) => {
                assert_eq!(class, "com.example.BaseService");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            resolve("com.example.Util::make"),
            Err(CompilationErrorKind::DeclaringClassNotConcrete { .. })
        ));
        assert!(matches!(
            resolve("com.example.Greeter::greet"),
            Err(CompilationErrorKind::DeclaringClassNotConcrete { .. })
        ));
    }
}
