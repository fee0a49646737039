//! Fixed-interval cycle scheduler and per-cycle orchestration.
//!
//! One cycle runs to completion before the next begins; the only suspension
//! is the inter-cycle sleep. A cycle-level failure is caught, logged, and
//! treated as a no-op for that cycle — the loop always reaches the next tick.

use crate::config::RuntimeConfig;
use crate::exchange::{AccountGateway, MarketDataGateway, OrderIntent, Symbol};
use crate::risk::RiskGate;
use crate::strategy::{momentum_return, RebalanceEngine, SymbolOutcome, MOMENTUM_SAMPLES};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Summary of one rebalance cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub total_value: Decimal,
    pub vetoed: bool,
    pub orders_submitted: usize,
    pub order_failures: usize,
    pub symbols_skipped: usize,
}

/// Owns the per-cycle control flow: gather data, snapshot the portfolio,
/// consult the risk gate, plan per symbol, and submit orders one at a time.
pub struct CycleRunner {
    market: Arc<dyn MarketDataGateway>,
    account: Arc<dyn AccountGateway>,
    engine: RebalanceEngine,
    gate: Box<dyn RiskGate>,
    symbols: Vec<Symbol>,
    interval: Duration,
    dry_run: bool,
}

impl CycleRunner {
    pub fn new(
        market: Arc<dyn MarketDataGateway>,
        account: Arc<dyn AccountGateway>,
        engine: RebalanceEngine,
        gate: Box<dyn RiskGate>,
        symbols: Vec<Symbol>,
        runtime: &RuntimeConfig,
    ) -> Self {
        Self {
            market,
            account,
            engine,
            gate,
            symbols,
            interval: Duration::from_secs(runtime.cycle_interval_secs),
            dry_run: runtime.dry_run,
        }
    }

    /// Run cycles until the shutdown flag is set. Never aborts on a failed
    /// cycle.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!(
            symbols = self.symbols.len(),
            interval_secs = self.interval.as_secs(),
            dry_run = self.dry_run,
            "Rebalancing loop started"
        );

        while !shutdown.load(Ordering::SeqCst) {
            match self.run_cycle().await {
                Ok(report) => {
                    info!(
                        total_value = %report.total_value,
                        vetoed = report.vetoed,
                        orders = report.orders_submitted,
                        failures = report.order_failures,
                        skipped = report.symbols_skipped,
                        "Cycle complete"
                    );
                }
                Err(e) => {
                    error!(error = %format!("{e:#}"), "Cycle failed, holding until next tick");
                }
            }

            // Sleep in short slices so shutdown stays responsive.
            let mut remaining = self.interval;
            while remaining > Duration::ZERO && !shutdown.load(Ordering::SeqCst) {
                let slice = remaining.min(Duration::from_secs(1));
                tokio::time::sleep(slice).await;
                remaining = remaining.saturating_sub(slice);
            }
        }

        info!("Rebalancing loop stopped");
    }

    /// One full pass: prices, balances, risk check, per-symbol planning and
    /// order submission.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let prices = self.fetch_prices().await;

        let balances = self
            .account
            .balances()
            .await
            .context("Failed to fetch account balances")?;

        // Fresh portfolio snapshot: cash in each quote currency plus the
        // value of every tracked position.
        let positions: HashMap<Symbol, Decimal> = self
            .symbols
            .iter()
            .map(|symbol| {
                let qty = balances.get(&symbol.base).copied().unwrap_or(Decimal::ZERO);
                let price = prices.get(symbol).copied().unwrap_or(Decimal::ZERO);
                (symbol.clone(), qty * price)
            })
            .collect();

        let quotes: HashSet<&str> = self.symbols.iter().map(|s| s.quote.as_str()).collect();
        let cash: Decimal = quotes
            .iter()
            .filter_map(|quote| balances.get(*quote))
            .copied()
            .sum();
        let total_value = cash + positions.values().copied().sum::<Decimal>();

        info!(total_value = %total_value.round_dp(2), cash = %cash.round_dp(2), "Portfolio snapshot");

        if !self.gate.permit(total_value, &positions) {
            return Ok(CycleReport {
                total_value,
                vetoed: true,
                orders_submitted: 0,
                order_failures: 0,
                symbols_skipped: self.symbols.len(),
            });
        }

        let mut orders_submitted = 0;
        let mut order_failures = 0;
        let mut symbols_skipped = 0;

        for symbol in &self.symbols {
            if !self.engine.is_tradable(symbol) {
                debug!(%symbol, "No trade rule, skipping");
                symbols_skipped += 1;
                continue;
            }

            let momentum = match self
                .market
                .price_history(&symbol.base, self.engine.momentum_interval(), MOMENTUM_SAMPLES)
                .await
            {
                Ok(samples) => momentum_return(&samples),
                Err(e) => {
                    warn!(%symbol, error = %format!("{e:#}"), "History fetch failed, holding");
                    None
                }
            };

            let price = prices.get(symbol).copied().unwrap_or(Decimal::ZERO);
            let base_balance = balances.get(&symbol.base).copied().unwrap_or(Decimal::ZERO);

            match self
                .engine
                .plan_symbol(symbol, momentum, price, base_balance, total_value)
            {
                SymbolOutcome::Order(order) => {
                    if self.submit(&order).await {
                        orders_submitted += 1;
                    } else {
                        order_failures += 1;
                    }
                }
                SymbolOutcome::Skip(reason) => {
                    debug!(%symbol, %reason, "No order");
                    symbols_skipped += 1;
                }
            }
        }

        Ok(CycleReport {
            total_value,
            vetoed: false,
            orders_submitted,
            order_failures,
            symbols_skipped,
        })
    }

    /// Latest price per symbol. A failed fetch degrades to zero, which the
    /// engine treats as "price unavailable" for that symbol only.
    async fn fetch_prices(&self) -> HashMap<Symbol, Decimal> {
        let mut prices = HashMap::with_capacity(self.symbols.len());

        for symbol in &self.symbols {
            let price = match self.market.latest_price(&symbol.base).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(%symbol, error = %format!("{e:#}"), "Price fetch failed");
                    Decimal::ZERO
                }
            };
            prices.insert(symbol.clone(), price);
        }

        prices
    }

    /// Submit one order; failures are logged and not retried this cycle.
    async fn submit(&self, order: &OrderIntent) -> bool {
        if self.dry_run {
            info!(
                symbol = %order.symbol,
                side = %order.side,
                quantity = %order.quantity,
                notional = %order.notional_usd.round_dp(0),
                "[DRY] Simulated order"
            );
            return true;
        }

        match self
            .account
            .place_order(&order.symbol, order.side, order.quantity)
            .await
        {
            Ok(ack) => {
                info!(
                    symbol = %order.symbol,
                    side = %order.side,
                    quantity = %order.quantity,
                    notional = %order.notional_usd.round_dp(0),
                    order_id = ?ack.order_id,
                    "Order submitted"
                );
                true
            }
            Err(e) => {
                error!(
                    symbol = %order.symbol,
                    error = %format!("{e:#}"),
                    "Order submission failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuntimeConfig, StrategyConfig};
    use crate::exchange::{MockExchange, OrderSide};
    use crate::risk::DrawdownGate;
    use crate::rules::RuleRegistry;
    use rust_decimal_macros::dec;

    struct DenyAll;

    impl RiskGate for DenyAll {
        fn permit(&mut self, _total: Decimal, _positions: &HashMap<Symbol, Decimal>) -> bool {
            false
        }
    }

    async fn seeded_mock() -> Arc<MockExchange> {
        let mock = Arc::new(MockExchange::new());
        mock.set_precision("BTC/USD", 4).await;
        mock.set_price("BTC", dec!(110)).await;
        mock.set_history("BTC", &[dec!(100), dec!(110)]).await;
        mock.set_balance("USD", dec!(10000)).await;
        mock
    }

    async fn runner_for(mock: &Arc<MockExchange>, runtime: RuntimeConfig) -> CycleRunner {
        let rules = RuleRegistry::load(mock.as_ref()).await;
        let engine = RebalanceEngine::new(StrategyConfig::default(), rules);
        CycleRunner::new(
            mock.clone(),
            mock.clone(),
            engine,
            Box::new(DrawdownGate::new(dec!(0.05))),
            vec!["BTC/USD".parse().unwrap()],
            &runtime,
        )
    }

    #[tokio::test]
    async fn full_cycle_submits_momentum_order() {
        let mock = seeded_mock().await;
        let mut runner = runner_for(&mock, RuntimeConfig::default()).await;

        let report = runner.run_cycle().await.unwrap();
        assert!(!report.vetoed);
        assert_eq!(report.orders_submitted, 1);
        assert_eq!(report.total_value, dec!(10000));

        let orders = mock.placed_orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Buy);
        // 10% move => $200 target; 200 / 110 floored to the 0.0001 step
        assert_eq!(orders[0].quantity, dec!(1.8181));
    }

    #[tokio::test]
    async fn veto_blocks_every_order() {
        let mock = seeded_mock().await;
        let rules = RuleRegistry::load(mock.as_ref()).await;
        let engine = RebalanceEngine::new(StrategyConfig::default(), rules);
        let mut runner = CycleRunner::new(
            mock.clone(),
            mock.clone(),
            engine,
            Box::new(DenyAll),
            vec!["BTC/USD".parse().unwrap()],
            &RuntimeConfig::default(),
        );

        let report = runner.run_cycle().await.unwrap();
        assert!(report.vetoed);
        assert_eq!(report.orders_submitted, 0);
        assert!(mock.placed_orders().await.is_empty());
    }

    #[tokio::test]
    async fn unregistered_symbol_never_trades() {
        let mock = seeded_mock().await;
        let rules = RuleRegistry::load(mock.as_ref()).await;
        let engine = RebalanceEngine::new(StrategyConfig::default(), rules);
        let mut runner = CycleRunner::new(
            mock.clone(),
            mock.clone(),
            engine,
            Box::new(DrawdownGate::new(dec!(0.05))),
            vec!["ETH/USD".parse().unwrap()],
            &RuntimeConfig::default(),
        );

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.orders_submitted, 0);
        assert_eq!(report.symbols_skipped, 1);
        assert!(mock.placed_orders().await.is_empty());
    }

    #[tokio::test]
    async fn history_failure_degrades_to_hold() {
        let mock = seeded_mock().await;
        mock.fail_history(true);
        let mut runner = runner_for(&mock, RuntimeConfig::default()).await;

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.orders_submitted, 0);
        assert_eq!(report.symbols_skipped, 1);
    }

    #[tokio::test]
    async fn short_history_degrades_to_hold() {
        let mock = seeded_mock().await;
        mock.set_history("BTC", &[dec!(110)]).await;
        let mut runner = runner_for(&mock, RuntimeConfig::default()).await;

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.orders_submitted, 0);
    }

    #[tokio::test]
    async fn balance_failure_fails_the_cycle_only() {
        let mock = seeded_mock().await;
        mock.fail_balances(true);
        let mut runner = runner_for(&mock, RuntimeConfig::default()).await;

        assert!(runner.run_cycle().await.is_err());

        // Next cycle recovers once the gateway does
        mock.fail_balances(false);
        assert!(runner.run_cycle().await.is_ok());
    }

    #[tokio::test]
    async fn dry_run_submits_nothing() {
        let mock = seeded_mock().await;
        let runtime = RuntimeConfig {
            dry_run: true,
            ..RuntimeConfig::default()
        };
        let mut runner = runner_for(&mock, runtime).await;

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.orders_submitted, 1);
        assert!(mock.placed_orders().await.is_empty());
    }

    #[tokio::test]
    async fn order_failure_is_not_retried() {
        let mock = seeded_mock().await;
        mock.fail_orders(true);
        let mut runner = runner_for(&mock, RuntimeConfig::default()).await;

        let report = runner.run_cycle().await.unwrap();
        assert_eq!(report.orders_submitted, 0);
        assert_eq!(report.order_failures, 1);
    }
}
