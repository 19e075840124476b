//! In-memory symbol index loaded from pre-parsed metadata files.
//!
//! ```yaml
//! classes:
//!   - name: com.example.ProcessFolderService
//!     interfaces:
//!       - "org.pipelineframework.service.ReactiveService<com.example.CsvFolder, com.example.CsvPaymentsInputFile>"
//!     methods:
//!       - name: process
//!         modifiers: [public]
//!         parameters: [com.example.CsvFolder]
//!         returns: io.smallrye.mutiny.Uni<com.example.CsvPaymentsInputFile>
//! ```

use crate::descriptor::ClassDescriptor;
use crate::hierarchy::HierarchyWalker;
use crate::traits::{IndexError, SymbolIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// On-disk layout of an index file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexFile {
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

/// Symbol index backed by a name-ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemorySymbolIndex {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl MemorySymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class, replacing any previous entry with the same name.
    ///
    /// Bare names that match a type parameter in scope (the class's, or for a
    /// method signature also the method's) become type variables, and each
    /// method's declaring class is set to this class.
    pub fn insert(&mut self, mut class: ClassDescriptor) {
        let class_scope = class.type_parameters.clone();
        class.superclass = class
            .superclass
            .take()
            .map(|s| s.link_type_vars(&class_scope));
        class.interfaces = class
            .interfaces
            .iter()
            .map(|i| i.link_type_vars(&class_scope))
            .collect();

        for method in &mut class.methods {
            method.declaring_class = class.name.clone();
            let mut scope = class_scope.clone();
            scope.extend(method.type_parameters.iter().cloned());
            method.return_type = method.return_type.link_type_vars(&scope);
            method.parameters = method
                .parameters
                .iter()
                .map(|p| p.link_type_vars(&scope))
                .collect();
        }

        self.classes.insert(class.name.clone(), class);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.insert(class);
        self
    }

    /// Build from a parsed index file. Duplicate class names are rejected.
    pub fn from_index_file(file: IndexFile) -> Result<Self, IndexError> {
        let mut index = Self::new();
        for class in file.classes {
            if index.classes.contains_key(&class.name) {
                return Err(IndexError::DuplicateClass(class.name));
            }
            index.insert(class);
        }
        Ok(index)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, IndexError> {
        Self::from_index_file(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, IndexError> {
        Self::from_index_file(serde_json::from_str(json)?)
    }

    /// Load a `.yaml`/`.yml` or `.json` index file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(IndexError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }
}

impl SymbolIndex for MemorySymbolIndex {
    fn class_by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    fn known_implementors_of(&self, interface_name: &str) -> Vec<&ClassDescriptor> {
        let walker = HierarchyWalker::new(self);
        self.classes
            .values()
            .filter(|c| !c.is_interface() && c.name != interface_name)
            .filter(|c| walker.is_subtype_of(c, interface_name))
            .collect()
    }
}
