//! # Momentum Rebalancer
//!
//! An automated momentum-based rebalancing bot for a basket of crypto pairs
//! traded against a fiat quote currency on the Roostoo mock exchange.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Gateway traits plus the Roostoo (trading) and Horus (market
//!   data) REST clients, and an in-memory mock for tests
//! - `rules`: Per-pair quantization rules loaded from exchange metadata
//! - `strategy`: Momentum targets, diff-to-target sizing, and order planning
//! - `risk`: Portfolio-level risk gate that can veto a rebalance cycle
//! - `scheduler`: Fixed-interval cycle loop with per-cycle failure isolation
//! - `utils`: Shared decimal arithmetic helpers

pub mod config;
pub mod exchange;
pub mod risk;
pub mod rules;
pub mod scheduler;
pub mod strategy;
pub mod utils;

pub use config::Config;
