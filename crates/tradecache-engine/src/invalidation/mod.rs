//! Invalidation rule engine: a runtime-mutable rule table mapping key
//! patterns to invalidation strategies, a lazy queue drained in the
//! background, and per-execution event records.

pub mod engine;
pub mod rules;

pub use engine::{InvalidationContext, InvalidationEngine, InvalidationStats};
pub use rules::{default_rules, InvalidationEvent, InvalidationRule, InvalidationStrategy};
