//! Operator resolution
//!
//! Binds each step's `Class::method` reference to exactly one method in the
//! symbol index and enforces the operator signature rules.

pub mod operator;
pub mod reference;

pub use operator::{OperatorResolver, ResolvedMethod};
pub use reference::{OperatorReference, REFERENCE_SEPARATOR};
