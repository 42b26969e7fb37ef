//! Comparing the annotation graphs of several annotators.
//!
//! The [`DiffEngine`] trait is the contract the consensus builder depends on.
//! [`SpanDiff`] is a reference engine that anchors annotations at their layer
//! and span.

mod engine;
mod result;
mod span;

pub use engine::{CasMap, DiffAdapter, DiffEngine, LinkCompareBehavior};
pub use result::{Configuration, ConfigurationSet, DiffResult, Position};
pub use span::SpanDiff;
