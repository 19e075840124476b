//! Code-generation boundary checks over normalized shapes.

use super::classify::{OperatorCategory, ResolvedOperator};
use crate::config::ShapePolicyKind;
use crate::errors::CompilationErrorKind;

/// Decides which normalized shapes the emitters currently accept.
pub trait ShapePolicy {
    fn name(&self) -> &'static str;

    /// Every violation for one operator; empty when accepted.
    fn check(&self, operator: &ResolvedOperator) -> Vec<CompilationErrorKind>;
}

/// Single-value input only; reactive methods must produce a single value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleValueOnly;

impl ShapePolicy for SingleValueOnly {
    fn name(&self) -> &'static str {
        "single_value_only"
    }

    fn check(&self, operator: &ResolvedOperator) -> Vec<CompilationErrorKind> {
        let mut errors = Vec::new();
        if let Some(input) = operator.normalized_input.as_ref().filter(|s| s.is_many()) {
            errors.push(CompilationErrorKind::UnsupportedShape {
                step: operator.name().to_string(),
                detail: format!("streaming input {}", input),
            });
        }
        if operator.category == OperatorCategory::Reactive
            && operator.normalized_return_type.is_many()
        {
            errors.push(CompilationErrorKind::UnsupportedShape {
                step: operator.name().to_string(),
                detail: format!("multi-value reactive output {}", operator.normalized_return_type),
            });
        }
        errors
    }
}

/// Accepts every normalized shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl ShapePolicy for Unrestricted {
    fn name(&self) -> &'static str {
        "unrestricted"
    }

    fn check(&self, _operator: &ResolvedOperator) -> Vec<CompilationErrorKind> {
        Vec::new()
    }
}

pub fn policy_for(kind: ShapePolicyKind) -> Box<dyn ShapePolicy> {
    match kind {
        ShapePolicyKind::SingleValueOnly => Box::new(SingleValueOnly),
        ShapePolicyKind::Unrestricted => Box::new(Unrestricted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepDefinition;
    use crate::shape::NormalizedType;
    use symbol_index::{ClassDescriptor, MethodDescriptor, TypeRef};

    fn operator(
        input: Option<NormalizedType>,
        output: NormalizedType,
        category: OperatorCategory,
    ) -> ResolvedOperator {
        ResolvedOperator {
            step: StepDefinition::operator("s", "com.example.S::run"),
            declaring_class: ClassDescriptor::new("com.example.S"),
            method: MethodDescriptor::new("run", vec![], TypeRef::Void),
            input_type: input.as_ref().map(|s| s.element().clone()),
            raw_return_type: output.element().clone(),
            normalized_input: input,
            normalized_return_type: output,
            category,
        }
    }

    fn a() -> TypeRef {
        TypeRef::class("com.example.A")
    }

    #[test]
    fn single_value_only_rejects_streaming_shapes() {
        let policy = SingleValueOnly;
        let op = operator(
            Some(NormalizedType::Many(a())),
            NormalizedType::Many(a()),
            OperatorCategory::Reactive,
        );
        let errors = policy.check(&op);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("streaming input Many<com.example.A>"));
        assert!(errors[1].to_string().contains("not supported in this phase"));
    }

    #[test]
    fn non_reactive_collections_are_accepted() {
        let op = operator(
            Some(NormalizedType::Single(a())),
            NormalizedType::Many(a()),
            OperatorCategory::NonReactive,
        );
        assert!(SingleValueOnly.check(&op).is_empty());
    }

    #[test]
    fn unrestricted_accepts_everything() {
        let op = operator(
            Some(NormalizedType::Many(a())),
            NormalizedType::Many(a()),
            OperatorCategory::Reactive,
        );
        let policy = policy_for(ShapePolicyKind::Unrestricted);
        assert_eq!(policy.name(), "unrestricted");
        assert!(policy.check(&op).is_empty());
    }
}
