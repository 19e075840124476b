//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Default fully-qualified name of the three-parameter mapping contract.
pub const DEFAULT_MAPPER_CONTRACT: &str = "org.pipelineframework.mapper.Mapper";
/// Default universal root type; superclass walks stop here.
pub const DEFAULT_ROOT_TYPE: &str = "java.lang.Object";
/// Default canonical "no value" reference type.
pub const DEFAULT_NO_VALUE_TYPE: &str = "java.lang.Void";

/// Configuration for one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Mapping contract whose implementors populate the mapper registry.
    pub mapper_contract: String,
    /// How mapper registry keys are formed.
    pub mapper_keying: MapperKeying,
    /// Universal root type of the class hierarchy.
    pub root_type: String,
    /// Reference type standing in for `void`.
    pub no_value_type: String,
    /// Wrapper families recognised by the classifier.
    pub vocabulary: TypeVocabulary,
    /// Which normalized shapes code generation currently accepts.
    pub shape_policy: ShapePolicyKind,
    /// Reject unknown aspect config keys instead of ignoring them.
    pub strict_aspect_config: bool,
    /// Domain types that never need a mapper.
    pub mapper_exempt_types: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            mapper_contract: DEFAULT_MAPPER_CONTRACT.to_string(),
            mapper_keying: MapperKeying::default(),
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            no_value_type: DEFAULT_NO_VALUE_TYPE.to_string(),
            vocabulary: TypeVocabulary::default(),
            shape_policy: ShapePolicyKind::default(),
            strict_aspect_config: true,
            mapper_exempt_types: Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Parse a (possibly partial) YAML config; missing fields take defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// True when `type_name` never needs a mapper.
    pub fn is_mapper_exempt(&self, type_name: &str) -> bool {
        type_name == self.no_value_type || self.mapper_exempt_types.iter().any(|t| t == type_name)
    }

    /// Builder: switch the mapper keying mode.
    pub fn with_mapper_keying(mut self, keying: MapperKeying) -> Self {
        self.mapper_keying = keying;
        self
    }

    /// Builder: switch the shape policy.
    pub fn with_shape_policy(mut self, policy: ShapePolicyKind) -> Self {
        self.shape_policy = policy;
        self
    }
}

/// Mapper registry key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKeying {
    /// At most one mapper per domain type.
    #[default]
    Domain,
    /// One mapper per (domain type, external type) pair.
    DomainAndExternal,
}

/// Shape policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapePolicyKind {
    /// Single-value inputs, and single-value outputs for reactive methods.
    #[default]
    SingleValueOnly,
    /// Every normalized shape.
    Unrestricted,
}

/// Fully-qualified names of the wrapper families the classifier recognises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeVocabulary {
    /// Single-value async wrappers.
    pub single_value: Vec<String>,
    /// Multi-value async wrappers.
    pub multi_value: Vec<String>,
    /// Lazily-produced sequences.
    pub lazy_sequence: Vec<String>,
    /// Future/promise style wrappers.
    pub future: Vec<String>,
    /// Collection roots; subtypes found in the index count too.
    pub collection: Vec<String>,
    /// Wrapper written out for a `Single<T>` shape.
    pub canonical_single: String,
    /// Wrapper written out for a `Many<T>` shape.
    pub canonical_many: String,
}

impl Default for TypeVocabulary {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            single_value: names(&["io.smallrye.mutiny.Uni"]),
            multi_value: names(&["io.smallrye.mutiny.Multi", "org.reactivestreams.Publisher"]),
            lazy_sequence: names(&["java.util.stream.Stream"]),
            future: names(&[
                "java.util.concurrent.CompletionStage",
                "java.util.concurrent.CompletableFuture",
                "java.util.concurrent.Future",
            ]),
            collection: names(&[
                "java.lang.Iterable",
                "java.util.Collection",
                "java.util.List",
                "java.util.Set",
                "java.util.Queue",
                "java.util.Deque",
            ]),
            canonical_single: "io.smallrye.mutiny.Uni".to_string(),
            canonical_many: "io.smallrye.mutiny.Multi".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = CompilerConfig::from_yaml_str(
            "mapper_keying: domain_and_external\nshape_policy: unrestricted\n",
        )
        .unwrap();
        assert_eq!(config.mapper_keying, MapperKeying::DomainAndExternal);
        assert_eq!(config.shape_policy, ShapePolicyKind::Unrestricted);
        assert_eq!(config.mapper_contract, DEFAULT_MAPPER_CONTRACT);
        assert!(config.strict_aspect_config);
        assert_eq!(config.vocabulary, TypeVocabulary::default());
    }

    #[test]
    fn vocabulary_override_replaces_lists() {
        let config = CompilerConfig::from_yaml_str(
            "vocabulary:\n  single_value: [reactor.core.publisher.Mono]\n  canonical_single: reactor.core.publisher.Mono\n",
        )
        .unwrap();
        assert_eq!(config.vocabulary.single_value, vec!["reactor.core.publisher.Mono"]);
        assert_eq!(config.vocabulary.canonical_many, "io.smallrye.mutiny.Multi");
    }

    #[test]
    fn no_value_type_is_always_exempt() {
        let config = CompilerConfig {
            mapper_exempt_types: vec!["java.lang.String".into()],
            ..CompilerConfig::default()
        };
        assert!(config.is_mapper_exempt("java.lang.Void"));
        assert!(config.is_mapper_exempt("java.lang.String"));
        assert!(!config.is_mapper_exempt("com.example.Payment"));
    }
}
