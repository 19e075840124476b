use crate::errors::CompilationErrorKind;
use std::fmt;

/// Separator between class and method in an operator reference.
pub const REFERENCE_SEPARATOR: &str = "::";

/// Parsed `fully.qualified.Class::methodName` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorReference {
    pub class_name: String,
    pub method_name: String,
}

impl OperatorReference {
    /// Parse the reference declared by `step`.
    pub fn parse(step: &str, reference: &str) -> Result<Self, CompilationErrorKind> {
        let malformed = |reason: &str| CompilationErrorKind::MalformedReference {
            step: step.to_string(),
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = reference.trim();
        let mut parts = trimmed.split(REFERENCE_SEPARATOR);
        let (Some(class_name), Some(method_name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected exactly one '::' separator"));
        };

        if class_name.is_empty() {
            return Err(malformed("class segment is empty"));
        }
        if method_name.is_empty() {
            return Err(malformed("method segment is empty"));
        }
        if !class_name.split('.').all(is_identifier) {
            return Err(malformed("class segment is not a qualified name"));
        }
        if !is_identifier(method_name) {
            return Err(malformed("method segment is not an identifier"));
        }

        Ok(Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
        })
    }
}

impl fmt::Display for OperatorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.class_name, REFERENCE_SEPARATOR, self.method_name)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
