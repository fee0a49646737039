//! In-memory exchange used by tests and paper-trading experiments.
//!
//! Implements both gateway traits over scripted state: prices and candle
//! histories keyed by base asset, a free-balance wallet, and per-pair
//! precision metadata. Failures can be injected per endpoint so callers can
//! assert the degrade paths.

use crate::exchange::traits::{AccountGateway, MarketDataGateway};
use crate::exchange::types::{
    ExchangeInfo, OrderAck, OrderIntent, OrderSide, PriceSample, Symbol, TradePairInfo,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Scripted in-memory exchange for deterministic tests.
#[derive(Default)]
pub struct MockExchange {
    prices: Arc<RwLock<HashMap<String, Decimal>>>,
    histories: Arc<RwLock<HashMap<String, Vec<PriceSample>>>>,
    balances: Arc<RwLock<HashMap<String, Decimal>>>,
    precisions: Arc<RwLock<HashMap<String, u32>>>,
    orders: Arc<RwLock<Vec<OrderIntent>>>,
    order_id_counter: AtomicI64,
    fail_orders: AtomicBool,
    fail_exchange_info: AtomicBool,
    fail_history: AtomicBool,
    fail_balances: AtomicBool,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_price(&self, asset: &str, price: Decimal) {
        self.prices.write().await.insert(asset.to_string(), price);
    }

    /// Script a candle series for an asset, oldest first, one hour apart
    /// and ending now.
    pub async fn set_history(&self, asset: &str, prices: &[Decimal]) {
        let now = Utc::now();
        let n = prices.len() as i64;
        let samples = prices
            .iter()
            .enumerate()
            .map(|(i, price)| PriceSample {
                price: *price,
                timestamp: now - ChronoDuration::hours(n - 1 - i as i64),
            })
            .collect();
        self.histories.write().await.insert(asset.to_string(), samples);
    }

    pub async fn set_balance(&self, currency: &str, free: Decimal) {
        self.balances
            .write()
            .await
            .insert(currency.to_string(), free);
    }

    pub async fn set_precision(&self, pair: &str, amount_precision: u32) {
        self.precisions
            .write()
            .await
            .insert(pair.to_string(), amount_precision);
    }

    /// Orders recorded so far, in submission order.
    pub async fn placed_orders(&self) -> Vec<OrderIntent> {
        self.orders.read().await.clone()
    }

    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn fail_exchange_info(&self, fail: bool) {
        self.fail_exchange_info.store(fail, Ordering::SeqCst);
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MarketDataGateway for MockExchange {
    async fn latest_price(&self, asset: &str) -> Result<Decimal> {
        self.prices
            .read()
            .await
            .get(asset)
            .copied()
            .ok_or_else(|| anyhow!("no price scripted for {asset}"))
    }

    async fn price_history(
        &self,
        asset: &str,
        _interval: &str,
        limit: u32,
    ) -> Result<Vec<PriceSample>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(anyhow!("scripted history failure"));
        }

        let histories = self.histories.read().await;
        let samples = histories.get(asset).cloned().unwrap_or_default();
        let start = samples.len().saturating_sub(limit as usize);
        Ok(samples[start..].to_vec())
    }
}

#[async_trait]
impl AccountGateway for MockExchange {
    async fn balances(&self) -> Result<HashMap<String, Decimal>> {
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(anyhow!("scripted balance failure"));
        }
        Ok(self.balances.read().await.clone())
    }

    async fn place_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderAck> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(anyhow!("scripted order failure"));
        }

        self.orders.write().await.push(OrderIntent {
            symbol: symbol.clone(),
            side,
            quantity,
            notional_usd: Decimal::ZERO,
        });

        Ok(OrderAck {
            order_id: Some(self.order_id_counter.fetch_add(1, Ordering::SeqCst) + 1),
            status: "FILLED".to_string(),
        })
    }

    async fn exchange_info(&self) -> Result<ExchangeInfo> {
        if self.fail_exchange_info.load(Ordering::SeqCst) {
            return Err(anyhow!("scripted exchange info failure"));
        }

        let trade_pairs = self
            .precisions
            .read()
            .await
            .iter()
            .map(|(pair, precision)| {
                (
                    pair.clone(),
                    TradePairInfo {
                        amount_precision: *precision,
                    },
                )
            })
            .collect();

        Ok(ExchangeInfo { trade_pairs })
    }
}
