//! Generic-aware walks over the type hierarchy.
//!
//! Every supertype reached is reported with its type arguments expressed in
//! terms of the class the walk started from: `class CsvMapper implements
//! RowMapper<Payment>` with `interface RowMapper<D> extends Mapper<Row, Dto, D>`
//! reaches `Mapper<Row, Dto, Payment>`.
//!
//! Hierarchies may share ancestors through several paths and self-referencing
//! generic bounds can make them cyclic, so each walk keeps a visited set keyed
//! by class name. A revisited class is skipped, not reported.

use crate::descriptor::ClassDescriptor;
use crate::traits::SymbolIndex;
use crate::types::{TypeRef, WildcardBound};
use std::collections::{HashMap, HashSet};

/// Type parameter name -> argument supplied by a subtype.
pub type TypeBindings = HashMap<String, TypeRef>;

/// Bind `class`'s type parameters to the arguments of `applied`.
///
/// A raw use (`applied` has no arguments) binds nothing, leaving the
/// parameters as unresolved type variables.
pub fn bindings_for(class: &ClassDescriptor, applied: &TypeRef) -> TypeBindings {
    let args = applied.args();
    if args.len() != class.type_parameters.len() {
        return TypeBindings::new();
    }
    class
        .type_parameters
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

/// Replace bound type variables in `ty`.
pub fn substitute(ty: &TypeRef, bindings: &TypeBindings) -> TypeRef {
    if bindings.is_empty() {
        return ty.clone();
    }
    match ty {
        TypeRef::TypeVar(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        TypeRef::Class { name, args } => TypeRef::Class {
            name: name.clone(),
            args: args.iter().map(|a| substitute(a, bindings)).collect(),
        },
        TypeRef::Array(component) => TypeRef::Array(Box::new(substitute(component, bindings))),
        TypeRef::Wildcard(Some(WildcardBound::Extends(bound))) => TypeRef::Wildcard(Some(
            WildcardBound::Extends(Box::new(substitute(bound, bindings))),
        )),
        TypeRef::Wildcard(Some(WildcardBound::Super(bound))) => TypeRef::Wildcard(Some(
            WildcardBound::Super(Box::new(substitute(bound, bindings))),
        )),
        TypeRef::Void | TypeRef::Primitive(_) | TypeRef::Wildcard(None) => ty.clone(),
    }
}

/// A supertype reached during a walk.
#[derive(Debug, Clone)]
pub struct Supertype<'a> {
    pub class: &'a ClassDescriptor,
    /// The supertype as seen from the starting class
    pub applied: TypeRef,
    /// `class`'s own type parameters bound to `applied`'s arguments
    pub bindings: TypeBindings,
}

/// Walks superclass chains and interface graphs of an index.
pub struct HierarchyWalker<'a, I: SymbolIndex + ?Sized> {
    index: &'a I,
    root_type: Option<&'a str>,
}

impl<'a, I: SymbolIndex + ?Sized> HierarchyWalker<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self {
            index,
            root_type: None,
        }
    }

    /// Stop superclass walks when this type is reached (it is not reported).
    pub fn with_root_type(mut self, root_type: &'a str) -> Self {
        self.root_type = Some(root_type);
        self
    }

    fn is_root(&self, ty: &TypeRef) -> bool {
        matches!((self.root_type, ty.erasure()), (Some(root), Some(name)) if root == name)
    }

    /// Superclasses of `start`, nearest first, up to (excluding) the root type.
    /// Stops at the first superclass missing from the index.
    pub fn superclass_chain(&self, start: &ClassDescriptor) -> Vec<Supertype<'a>> {
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::from([start.name.clone()]);
        let mut next = start.superclass.clone();

        while let Some(applied) = next.take() {
            if self.is_root(&applied) {
                break;
            }
            let Some(name) = applied.erasure() else { break };
            if !visited.insert(name.to_string()) {
                break;
            }
            let Some(class) = self.index.class_by_name(name) else {
                break;
            };
            let bindings = bindings_for(class, &applied);
            next = class.superclass.as_ref().map(|s| substitute(s, &bindings));
            chain.push(Supertype {
                class,
                applied,
                bindings,
            });
        }
        chain
    }

    /// Every interface reachable from `start` and its superclasses, breadth
    /// first, each reported once. Interfaces missing from the index are skipped.
    pub fn interface_closure(&self, start: &ClassDescriptor) -> Vec<Supertype<'a>> {
        let mut queue: std::collections::VecDeque<TypeRef> =
            start.interfaces.iter().cloned().collect();
        for sup in self.superclass_chain(start) {
            queue.extend(sup.class.interfaces.iter().map(|i| substitute(i, &sup.bindings)));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut found = Vec::new();
        while let Some(applied) = queue.pop_front() {
            let Some(name) = applied.erasure() else { continue };
            if !visited.insert(name.to_string()) {
                continue;
            }
            let Some(class) = self.index.class_by_name(name) else {
                continue;
            };
            let bindings = bindings_for(class, &applied);
            queue.extend(class.interfaces.iter().map(|i| substitute(i, &bindings)));
            found.push(Supertype {
                class,
                applied,
                bindings,
            });
        }
        found
    }

    /// The form in which `start` inherits `target`, searching implemented
    /// interfaces recursively before moving up the superclass chain.
    ///
    /// The result may be raw or still contain type variables when the
    /// hierarchy never supplies concrete arguments.
    pub fn find_parameterization(&self, start: &ClassDescriptor, target: &str) -> Option<TypeRef> {
        let mut visited = HashSet::from([start.name.clone()]);
        self.search(start, &TypeBindings::new(), target, &mut visited)
    }

    fn search(
        &self,
        class: &ClassDescriptor,
        bindings: &TypeBindings,
        target: &str,
        visited: &mut HashSet<String>,
    ) -> Option<TypeRef> {
        for interface in &class.interfaces {
            let applied = substitute(interface, bindings);
            if let Some(found) = self.visit(applied, target, visited) {
                return Some(found);
            }
        }

        let superclass = class.superclass.as_ref()?;
        let applied = substitute(superclass, bindings);
        if self.is_root(&applied) && applied.erasure() != Some(target) {
            return None;
        }
        self.visit(applied, target, visited)
    }

    fn visit(
        &self,
        applied: TypeRef,
        target: &str,
        visited: &mut HashSet<String>,
    ) -> Option<TypeRef> {
        let name = applied.erasure()?;
        if name == target {
            return Some(applied);
        }
        if !visited.insert(name.to_string()) {
            return None;
        }
        let class = self.index.class_by_name(name)?;
        let bindings = bindings_for(class, &applied);
        self.search(class, &bindings, target, visited)
    }

    /// True when `start` is, extends, or implements `target`.
    pub fn is_subtype_of(&self, start: &ClassDescriptor, target: &str) -> bool {
        start.name == target || self.find_parameterization(start, target).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySymbolIndex;
    use pretty_assertions::assert_eq;

    fn t(sig: &str) -> TypeRef {
        TypeRef::parse(sig).unwrap()
    }

    fn mapper_hierarchy() -> MemorySymbolIndex {
        MemorySymbolIndex::new()
            .with_class(
                ClassDescriptor::interface("com.example.Mapper")
                    .with_type_parameters(&["E", "W", "D"]),
            )
            .with_class(
                ClassDescriptor::interface("com.example.RowMapper")
                    .with_type_parameters(&["D"])
                    .implementing(t("com.example.Mapper<com.example.Row, com.example.RowDto, D>")),
            )
            .with_class(
                ClassDescriptor::new("com.example.PaymentMapper")
                    .implementing(t("com.example.RowMapper<com.example.Payment>")),
            )
    }

    #[test]
    fn substitutes_through_intermediate_interface() {
        let index = mapper_hierarchy();
        let start = index.class_by_name("com.example.PaymentMapper").unwrap();
        let found = HierarchyWalker::new(&index)
            .find_parameterization(start, "com.example.Mapper")
            .unwrap();
        assert_eq!(
            found,
            t("com.example.Mapper<com.example.Row, com.example.RowDto, com.example.Payment>")
        );
    }

    #[test]
    fn superclass_arguments_flow_into_inherited_interfaces() {
        let index = mapper_hierarchy()
            .with_class(
                ClassDescriptor::new("com.example.BaseMapper")
                    .with_type_parameters(&["D"])
                    .with_modifier(crate::types::Modifier::Abstract)
                    .implementing(t("com.example.RowMapper<D>")),
            )
            .with_class(
                ClassDescriptor::new("com.example.InvoiceMapper")
                    .extending(t("com.example.BaseMapper<com.example.Invoice>")),
            );
        let start = index.class_by_name("com.example.InvoiceMapper").unwrap();
        let walker = HierarchyWalker::new(&index);
        assert_eq!(
            walker.find_parameterization(start, "com.example.Mapper"),
            Some(t("com.example.Mapper<com.example.Row, com.example.RowDto, com.example.Invoice>"))
        );

        let closure = walker.interface_closure(start);
        let names: Vec<_> = closure.iter().map(|s| s.class.name.as_str()).collect();
        assert_eq!(names, vec!["com.example.RowMapper", "com.example.Mapper"]);
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let index = MemorySymbolIndex::new()
            .with_class(
                ClassDescriptor::interface("com.example.A").implementing(t("com.example.B")),
            )
            .with_class(
                ClassDescriptor::interface("com.example.B").implementing(t("com.example.A")),
            )
            .with_class(ClassDescriptor::new("com.example.C").implementing(t("com.example.A")));
        let start = index.class_by_name("com.example.C").unwrap();
        let walker = HierarchyWalker::new(&index);
        assert_eq!(walker.find_parameterization(start, "com.example.Missing"), None);
        assert_eq!(walker.interface_closure(start).len(), 2);
    }

    #[test]
    fn superclass_chain_stops_at_root() {
        let index = MemorySymbolIndex::new()
            .with_class(ClassDescriptor::new("java.lang.Object"))
            .with_class(ClassDescriptor::new("com.example.Base").extending(t("java.lang.Object")))
            .with_class(ClassDescriptor::new("com.example.Leaf").extending(t("com.example.Base")));
        let start = index.class_by_name("com.example.Leaf").unwrap();

        let chain = HierarchyWalker::new(&index)
            .with_root_type("java.lang.Object")
            .superclass_chain(start);
        let names: Vec<_> = chain.iter().map(|s| s.class.name.as_str()).collect();
        assert_eq!(names, vec!["com.example.Base"]);

        let unbounded = HierarchyWalker::new(&index).superclass_chain(start);
        assert_eq!(unbounded.len(), 2);
    }

    #[test]
    fn raw_use_leaves_variables_unbound() {
        let class = ClassDescriptor::new("com.example.Box").with_type_parameters(&["T"]);
        assert!(bindings_for(&class, &t("com.example.Box")).is_empty());
        let bound = bindings_for(&class, &t("com.example.Box<java.lang.String>"));
        assert_eq!(bound.get("T"), Some(&t("java.lang.String")));
    }
}
