//! Aspect expansion into synthetic `Observe…SideEffectService` steps.

pub mod expansion;
pub mod naming;

pub use expansion::{AspectExpander, DeploymentRole, ExpandedStep, SyntheticStep};
pub use naming::{pascal_case, synthetic_step_name};
