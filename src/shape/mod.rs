//! Reactive-shape classification, normalization and policy.

pub mod classify;
pub mod policy;

pub use classify::{
    NormalizedType, OperatorCategory, ResolvedOperator, TypeClassifier, WrapperFamily,
};
pub use policy::{policy_for, ShapePolicy, SingleValueOnly, Unrestricted};
