//! Rebalancing strategy.
//!
//! Contains the core logic for:
//! - Momentum-derived target notionals per symbol
//! - Diff-to-target sizing with the concentration cap
//! - Exchange-precision order quantization and the action threshold

mod engine;
mod momentum;

pub use engine::{RebalanceEngine, SkipReason, SymbolOutcome};
pub use momentum::{momentum_return, momentum_target, MOMENTUM_SAMPLES};
