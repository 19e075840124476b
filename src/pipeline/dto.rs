use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Helper defaults for serde ──

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

// ── Top-level DTO ──

/// Pipeline description exactly as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDto {
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default)]
    pub steps: Vec<StepDto>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub aspects: IndexMap<String, AspectDto>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    #[default]
    Grpc,
    Rest,
}

// ── Step ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDto {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_as_http: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_as_rpc: Option<bool>,
}

// ── Aspect ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectDto {
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,
    #[serde(default)]
    pub scope: ScopeDto,
    pub position: PositionDto,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub order: i32,
    /// Free-form; parsed into a typed `AspectConfig` during lowering
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeDto {
    #[default]
    Global,
    Steps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionDto {
    BeforeStep,
    AfterStep,
}
