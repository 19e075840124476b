//! Class and method descriptors.

use crate::types::{simple_name_of, Modifier, TypeRef};
use serde::{Deserialize, Serialize};

/// Name under which constructors are recorded.
pub const CONSTRUCTOR_NAME: &str = "<init>";
/// Name under which static initializers are recorded.
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

/// Whether a descriptor describes a class or an interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

/// Pre-parsed metadata for one class or interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Fully-qualified name
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Declared type parameter names, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            modifiers: vec![Modifier::Public],
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Interface,
            modifiers: vec![Modifier::Public, Modifier::Abstract],
            ..Self::new(name)
        }
    }

    /// Builder: declare type parameters.
    pub fn with_type_parameters(mut self, params: &[&str]) -> Self {
        self.type_parameters = params.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Builder: set the superclass.
    pub fn extending(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Builder: add an implemented (or, for interfaces, extended) interface.
    pub fn implementing(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Builder: add a method. Its declaring class is set to this class.
    pub fn with_method(mut self, mut method: MethodDescriptor) -> Self {
        method.declaring_class = self.name.clone();
        self.methods.push(method);
        self
    }

    /// Builder: add a modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.contains(&Modifier::Abstract)
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Methods named `name`, excluding constructors, static initializers, and
    /// compiler-generated bridge/synthetic methods.
    pub fn declared_methods_named(&self, name: &str) -> Vec<&MethodDescriptor> {
        self.methods
            .iter()
            .filter(|m| m.name == name && m.is_user_declared())
            .collect()
    }
}

/// Pre-parsed metadata for one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// Filled in by the index when the owning class is inserted
    #[serde(default)]
    pub declaring_class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TypeRef>,
    #[serde(rename = "returns", default = "void_type")]
    pub return_type: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl MethodDescriptor {
    /// A public instance method.
    pub fn new(name: impl Into<String>, parameters: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declaring_class: String::new(),
            parameters,
            return_type,
            modifiers: vec![Modifier::Public],
            type_parameters: Vec::new(),
        }
    }

    /// Builder: replace the modifier set.
    pub fn with_modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers = modifiers.to_vec();
        self
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_public(&self) -> bool {
        self.has_modifier(Modifier::Public)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_modifier(Modifier::Abstract)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(Modifier::Static)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }

    /// False for constructors, static initializers, bridge and synthetic methods.
    pub fn is_user_declared(&self) -> bool {
        !(self.is_constructor()
            || self.is_static_initializer()
            || self.has_modifier(Modifier::Bridge)
            || self.has_modifier(Modifier::Synthetic))
    }

    /// `Class::method(Param, ...)` form used in diagnostics.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        format!("{}::{}({})", self.declaring_class, self.name, params.join(", "))
    }
}
