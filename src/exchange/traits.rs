//! Capability traits the engine depends on.
//!
//! The rebalancing core never talks to a concrete venue directly: it is
//! handed a market-data gateway and an account gateway through these traits,
//! so tests can substitute deterministic fakes.

use crate::exchange::types::{ExchangeInfo, OrderAck, OrderSide, PriceSample, Symbol};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Source of current and historical prices for base assets.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Latest traded price for a base asset, in quote-currency units.
    async fn latest_price(&self, asset: &str) -> anyhow::Result<Decimal>;

    /// Short ordered series of historical prices at a fixed interval
    /// granularity, oldest first. The momentum signal needs at least two
    /// entries; fewer means "no signal" to the caller.
    async fn price_history(
        &self,
        asset: &str,
        interval: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<PriceSample>>;
}

/// Trading account operations on the venue.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Free (available) quantity per currency/asset.
    async fn balances(&self) -> anyhow::Result<HashMap<String, Decimal>>;

    /// Submit a market order. The ack is opaque to the core beyond
    /// success/failure.
    async fn place_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> anyhow::Result<OrderAck>;

    /// Exchange metadata with per-pair amount precision.
    async fn exchange_info(&self) -> anyhow::Result<ExchangeInfo>;
}
