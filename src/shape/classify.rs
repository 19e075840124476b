//! Return-type classification and two-shape normalization.
//!
//! Normalization rules, first match wins:
//!
//! | raw type                          | shape       |
//! |-----------------------------------|-------------|
//! | single-value wrapper `W<T>`       | `Single<T>` |
//! | multi-value wrapper `W<T>`        | `Many<T>`   |
//! | lazy sequence `S<T>`              | `Many<T>`   |
//! | future `F<T>`                     | `Single<T>` |
//! | collection-like `C<T>`            | `Many<T>`   |
//! | anything else (`void` → no-value) | `Single<T>` |
//!
//! Category is decided from the raw type alone, so a `void` method is
//! `NonReactive` yet still normalizes to `Single<no-value>`.

use crate::config::{CompilerConfig, TypeVocabulary};
use crate::errors::CompilationErrorKind;
use crate::pipeline::StepDefinition;
use crate::resolve::ResolvedMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use symbol_index::{ClassDescriptor, HierarchyWalker, MethodDescriptor, SymbolIndex, TypeRef};

/// Whether the raw return type was itself an async wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorCategory {
    Reactive,
    NonReactive,
}

/// Canonical asynchronous shape. The element is always a concrete reference type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", content = "element")]
pub enum NormalizedType {
    Single(TypeRef),
    Many(TypeRef),
}

impl NormalizedType {
    pub fn element(&self) -> &TypeRef {
        match self {
            NormalizedType::Single(t) | NormalizedType::Many(t) => t,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, NormalizedType::Single(_))
    }

    pub fn is_many(&self) -> bool {
        matches!(self, NormalizedType::Many(_))
    }

    /// The shape written back as the canonical wrapper type.
    pub fn as_type_ref(&self, vocabulary: &TypeVocabulary) -> TypeRef {
        match self {
            NormalizedType::Single(t) => {
                TypeRef::generic(vocabulary.canonical_single.clone(), vec![t.clone()])
            }
            NormalizedType::Many(t) => {
                TypeRef::generic(vocabulary.canonical_many.clone(), vec![t.clone()])
            }
        }
    }
}

impl fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedType::Single(t) => write!(f, "Single<{}>", t),
            NormalizedType::Many(t) => write!(f, "Many<{}>", t),
        }
    }
}

/// Async wrapper families listed in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperFamily {
    SingleValue,
    MultiValue,
    LazySequence,
    Future,
}

impl WrapperFamily {
    fn wrap(self, element: TypeRef) -> NormalizedType {
        match self {
            WrapperFamily::SingleValue | WrapperFamily::Future => NormalizedType::Single(element),
            WrapperFamily::MultiValue | WrapperFamily::LazySequence => {
                NormalizedType::Many(element)
            }
        }
    }
}

/// A step fully bound to a method with its shapes decided. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperator {
    pub step: StepDefinition,
    /// The class named in the step's reference
    pub declaring_class: ClassDescriptor,
    pub method: MethodDescriptor,
    /// `None` when the method takes no parameter
    pub input_type: Option<TypeRef>,
    pub raw_return_type: TypeRef,
    pub normalized_input: Option<NormalizedType>,
    pub normalized_return_type: NormalizedType,
    pub category: OperatorCategory,
}

impl ResolvedOperator {
    pub fn name(&self) -> &str {
        &self.step.name
    }

    /// Domain type consumed by the step, if it takes an input.
    pub fn input_domain_type(&self) -> Option<&TypeRef> {
        self.normalized_input.as_ref().map(NormalizedType::element)
    }

    /// Domain type produced by the step.
    pub fn output_domain_type(&self) -> &TypeRef {
        self.normalized_return_type.element()
    }
}

pub struct TypeClassifier<'a> {
    vocabulary: &'a TypeVocabulary,
    no_value_type: &'a str,
    index: Option<&'a dyn SymbolIndex>,
}

impl<'a> TypeClassifier<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self {
            vocabulary: &config.vocabulary,
            no_value_type: &config.no_value_type,
            index: None,
        }
    }

    /// Also treat indexed subtypes of the collection roots as collection-like.
    pub fn with_index(mut self, index: &'a dyn SymbolIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn family_of(&self, name: &str) -> Option<WrapperFamily> {
        let listed = |list: &[String]| list.iter().any(|w| w == name);
        if listed(&self.vocabulary.single_value) {
            Some(WrapperFamily::SingleValue)
        } else if listed(&self.vocabulary.multi_value) {
            Some(WrapperFamily::MultiValue)
        } else if listed(&self.vocabulary.lazy_sequence) {
            Some(WrapperFamily::LazySequence)
        } else if listed(&self.vocabulary.future) {
            Some(WrapperFamily::Future)
        } else {
            None
        }
    }

    fn is_collection_like(&self, name: &str) -> bool {
        if self.vocabulary.collection.iter().any(|c| c == name) {
            return true;
        }
        let Some(index) = self.index else {
            return false;
        };
        let Some(class) = index.class_by_name(name) else {
            return false;
        };
        let walker = HierarchyWalker::new(index);
        self.vocabulary
            .collection
            .iter()
            .any(|root| walker.is_subtype_of(class, root))
    }

    pub fn classify(&self, raw: &TypeRef) -> OperatorCategory {
        match raw.erasure() {
            Some(name) if self.family_of(name).is_some() => OperatorCategory::Reactive,
            _ => OperatorCategory::NonReactive,
        }
    }

    /// Normalize `raw`, found at `position` ("input" or "return") of `method`.
    pub fn normalize(
        &self,
        method: &str,
        position: &str,
        raw: &TypeRef,
    ) -> Result<NormalizedType, CompilationErrorKind> {
        let non_concrete = |ty: &TypeRef, reason: &str| CompilationErrorKind::NonConcreteType {
            method: method.to_string(),
            position: position.to_string(),
            ty: ty.to_string(),
            reason: reason.to_string(),
        };

        match raw {
            TypeRef::Void => Ok(NormalizedType::Single(TypeRef::class(self.no_value_type))),
            TypeRef::Primitive(p) => Ok(NormalizedType::Single(TypeRef::class(p.boxed()))),
            TypeRef::TypeVar(_) => Err(non_concrete(raw, "unresolved type variable")),
            TypeRef::Wildcard(_) => Err(non_concrete(raw, "wildcard")),
            TypeRef::Array(_) => match raw.first_unresolved() {
                Some(_) => Err(non_concrete(raw, "array of a non-concrete type")),
                None => Ok(NormalizedType::Single(raw.clone())),
            },
            TypeRef::Class { name, args } => {
                if let Some(family) = self.family_of(name) {
                    let element = match args.as_slice() {
                        [] => {
                            return Err(CompilationErrorKind::RawWrapper {
                                method: method.to_string(),
                                wrapper: raw.simple_name(),
                            })
                        }
                        [element] => element,
                        _ => {
                            return Err(CompilationErrorKind::WrapperArity {
                                method: method.to_string(),
                                wrapper: raw.simple_name(),
                                count: args.len(),
                            })
                        }
                    };
                    return self
                        .check_element(method, position, raw, element)
                        .map(|element| family.wrap(element));
                }

                if let [element] = args.as_slice() {
                    if self.is_collection_like(name) {
                        return self
                            .check_element(method, position, raw, element)
                            .map(NormalizedType::Many);
                    }
                }

                match raw.first_unresolved() {
                    Some(TypeRef::Wildcard(_)) => Err(non_concrete(raw, "wildcard argument")),
                    Some(_) => Err(non_concrete(raw, "unresolved type variable argument")),
                    None => Ok(NormalizedType::Single(raw.clone())),
                }
            }
        }
    }

    fn check_element(
        &self,
        method: &str,
        position: &str,
        raw: &TypeRef,
        element: &TypeRef,
    ) -> Result<TypeRef, CompilationErrorKind> {
        let reason = match element {
            TypeRef::Wildcard(_) => Some("wildcard element"),
            TypeRef::TypeVar(_) => Some("unresolved type variable element"),
            _ if !element.is_concrete() => Some("element has non-concrete arguments"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(CompilationErrorKind::NonConcreteType {
                method: method.to_string(),
                position: position.to_string(),
                ty: raw.to_string(),
                reason: reason.to_string(),
            });
        }
        if element.erasure().and_then(|n| self.family_of(n)).is_some() {
            return Err(CompilationErrorKind::NestedWrapper {
                method: method.to_string(),
                ty: raw.to_string(),
            });
        }
        Ok(element.clone())
    }

    /// Normalize an already-normalized shape through its canonical wrapper.
    pub fn renormalize(
        &self,
        shape: &NormalizedType,
    ) -> Result<NormalizedType, CompilationErrorKind> {
        self.normalize("<normalized>", "return", &shape.as_type_ref(self.vocabulary))
    }

    /// Classify and normalize a resolved method, collecting every shape error.
    pub fn classify_operator(
        &self,
        step: &StepDefinition,
        resolved: ResolvedMethod,
    ) -> Result<ResolvedOperator, Vec<CompilationErrorKind>> {
        let signature = resolved.method.signature();
        let category = self.classify(&resolved.return_type);

        let normalized_return = self.normalize(&signature, "return", &resolved.return_type);
        let normalized_input = resolved
            .input_type
            .as_ref()
            .map(|input| self.normalize(&signature, "input", input))
            .transpose();

        match (normalized_input, normalized_return) {
            (Ok(normalized_input), Ok(normalized_return_type)) => Ok(ResolvedOperator {
                step: step.clone(),
                declaring_class: resolved.declaring_class,
                method: resolved.method,
                input_type: resolved.input_type,
                raw_return_type: resolved.return_type,
                normalized_input,
                normalized_return_type,
                category,
            }),
            (input, ret) => Err(input.err().into_iter().chain(ret.err()).collect()),
        }
    }
}
