//! The rebalancing decision engine.
//!
//! Once per cycle, for each tracked symbol: turn the momentum return into a
//! target notional, diff it against current exposure, clip the increase to
//! the per-symbol concentration cap, quantize to the pair's tradable step,
//! and decide whether the remaining delta is worth an order.

use crate::config::StrategyConfig;
use crate::exchange::{OrderIntent, OrderSide, Symbol};
use crate::rules::RuleRegistry;
use crate::strategy::momentum::momentum_target;
use crate::utils::decimal::{round_down_to_lot, round_to_precision};
use rust_decimal::Decimal;
use std::fmt;

/// Why a symbol produced no order this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No trade rule for the pair; not tradable this session.
    NotTradable,
    /// Fewer than two price samples, a failed fetch, or a flat/zero target.
    NoSignal,
    /// Current price missing or non-positive.
    PriceUnavailable,
    /// Notional delta at or below the minimum actionable threshold.
    BelowThreshold,
    /// Quantization collapsed the order size to zero.
    DustQuantity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotTradable => write!(f, "not tradable"),
            SkipReason::NoSignal => write!(f, "no signal"),
            SkipReason::PriceUnavailable => write!(f, "price unavailable"),
            SkipReason::BelowThreshold => write!(f, "below threshold"),
            SkipReason::DustQuantity => write!(f, "dust quantity"),
        }
    }
}

/// Per-symbol outcome of one engine pass.
///
/// Degradation is a value, not an exception: every skip carries its reason so
/// callers (and tests) can tell "degraded" from "failed".
#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    Order(OrderIntent),
    Skip(SkipReason),
}

/// Pure rebalancing engine: a function of its inputs plus the immutable
/// trade-rule registry.
pub struct RebalanceEngine {
    strategy: StrategyConfig,
    rules: RuleRegistry,
}

impl RebalanceEngine {
    pub fn new(strategy: StrategyConfig, rules: RuleRegistry) -> Self {
        Self { strategy, rules }
    }

    /// Whether the registry knows the pair at all. Symbols without a rule are
    /// skipped before any data is fetched for them.
    pub fn is_tradable(&self, symbol: &Symbol) -> bool {
        self.rules.contains(symbol)
    }

    pub fn momentum_interval(&self) -> &str {
        &self.strategy.momentum_interval
    }

    /// Decide what, if anything, to do for one symbol this cycle.
    ///
    /// `momentum` is the precomputed one-period return (`None` when the data
    /// source failed or returned too few samples), `price` the current price,
    /// `base_balance` the free quantity of the base asset, and `total_value`
    /// the fresh portfolio snapshot value.
    pub fn plan_symbol(
        &self,
        symbol: &Symbol,
        momentum: Option<Decimal>,
        price: Decimal,
        base_balance: Decimal,
        total_value: Decimal,
    ) -> SymbolOutcome {
        let Some(rule) = self.rules.get(symbol) else {
            return SymbolOutcome::Skip(SkipReason::NotTradable);
        };

        if price <= Decimal::ZERO {
            return SymbolOutcome::Skip(SkipReason::PriceUnavailable);
        }

        let Some(ret) = momentum else {
            return SymbolOutcome::Skip(SkipReason::NoSignal);
        };

        let current_position_value = base_balance * price;
        let target_usd = momentum_target(
            ret,
            self.strategy.base_allocation,
            current_position_value,
            self.strategy.downside_clamp,
        );
        if target_usd == Decimal::ZERO {
            return SymbolOutcome::Skip(SkipReason::NoSignal);
        }

        // Concentration cap: clip any move that would leave the position
        // above max_allocation_pct of total value.
        let mut delta_usd = target_usd - current_position_value;
        let max_allowed = total_value * self.strategy.max_allocation_pct;
        if current_position_value + delta_usd > max_allowed {
            delta_usd = max_allowed - current_position_value;
        }

        // Quantize the magnitude toward zero and reapply the sign, so buys
        // and sells are both truncated at the step boundary.
        let raw_amount = delta_usd / price;
        let quantity = round_to_precision(
            round_down_to_lot(raw_amount.abs(), rule.step_size),
            rule.qty_precision,
        );

        if delta_usd.abs() <= self.strategy.min_trade_notional {
            return SymbolOutcome::Skip(SkipReason::BelowThreshold);
        }
        if quantity == Decimal::ZERO {
            return SymbolOutcome::Skip(SkipReason::DustQuantity);
        }

        let side = if delta_usd > Decimal::ZERO {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };

        SymbolOutcome::Order(OrderIntent {
            symbol: symbol.clone(),
            side,
            quantity,
            notional_usd: delta_usd.abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ExchangeInfo, TradePairInfo};
    use rust_decimal_macros::dec;

    fn registry(pairs: &[(&str, u32)]) -> RuleRegistry {
        let mut info = ExchangeInfo::default();
        for (pair, precision) in pairs {
            info.trade_pairs.insert(
                pair.to_string(),
                TradePairInfo {
                    amount_precision: *precision,
                },
            );
        }
        RuleRegistry::from_exchange_info(&info)
    }

    fn engine(pairs: &[(&str, u32)]) -> RebalanceEngine {
        RebalanceEngine::new(StrategyConfig::default(), registry(pairs))
    }

    fn btc() -> Symbol {
        "BTC/USD".parse().unwrap()
    }

    #[test]
    fn buys_into_positive_momentum() {
        // 10% move, $2,000 base allocation, no holdings => $200 target
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(0.1)), dec!(110), dec!(0), dec!(10000));

        match outcome {
            SymbolOutcome::Order(order) => {
                assert_eq!(order.side, OrderSide::Buy);
                // 200 / 110 = 1.8181..., floored to the 0.0001 step
                assert_eq!(order.quantity, dec!(1.8181));
                assert_eq!(order.notional_usd, dec!(200));
            }
            other => panic!("expected an order, got {other:?}"),
        }
    }

    #[test]
    fn negative_momentum_is_clamped_to_half_exposure() {
        // -5% requests -$100; exposure of $80 clamps the target at -$40,
        // so the delta is -$120 from the current $80 position.
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome =
            engine.plan_symbol(&btc(), Some(dec!(-0.05)), dec!(100), dec!(0.8), dec!(10000));

        match outcome {
            SymbolOutcome::Order(order) => {
                assert_eq!(order.side, OrderSide::Sell);
                assert_eq!(order.quantity, dec!(1.2));
                assert_eq!(order.notional_usd, dec!(120));
            }
            other => panic!("expected an order, got {other:?}"),
        }
    }

    #[test]
    fn cap_clips_increases_above_concentration_limit() {
        // Current $3,000, 500% move targets $10,000, but the 35% cap of a
        // $10,000 portfolio allows at most $3,500.
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(5)), dec!(100), dec!(30), dec!(10000));

        match outcome {
            SymbolOutcome::Order(order) => {
                assert_eq!(order.side, OrderSide::Buy);
                // Clipped delta is $500 => 5 units at $100
                assert_eq!(order.quantity, dec!(5));
                assert_eq!(order.notional_usd, dec!(500));
            }
            other => panic!("expected an order, got {other:?}"),
        }
    }

    #[test]
    fn post_cap_exposure_never_exceeds_limit() {
        let engine = engine(&[("BTC/USD", 8)]);
        let total = dec!(10000);
        let cap = total * dec!(0.35);

        for (ret, price, balance) in [
            (dec!(5), dec!(100), dec!(30)),
            (dec!(2), dec!(50), dec!(10)),
            (dec!(0.9), dec!(250), dec!(0)),
        ] {
            if let SymbolOutcome::Order(order) =
                engine.plan_symbol(&btc(), Some(ret), price, balance, total)
            {
                let current = balance * price;
                let signed = match order.side {
                    OrderSide::Buy => order.notional_usd,
                    OrderSide::Sell => -order.notional_usd,
                };
                assert!(current + signed <= cap + dec!(0.0001));
            }
        }
    }

    #[test]
    fn over_cap_position_is_sold_back_to_cap_when_target_exceeds_it() {
        // Current $4,000 with a $3,500 cap and a $3,800 target: the clip
        // produces a $500 reduction down to the cap.
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(1.9)), dec!(100), dec!(40), dec!(10000));

        match outcome {
            SymbolOutcome::Order(order) => {
                assert_eq!(order.side, OrderSide::Sell);
                assert_eq!(order.quantity, dec!(5));
                assert_eq!(order.notional_usd, dec!(500));
            }
            other => panic!("expected an order, got {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_is_not_tradable() {
        let engine = engine(&[("ETH/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(0.1)), dec!(100), dec!(0), dec!(10000));
        assert!(matches!(
            outcome,
            SymbolOutcome::Skip(SkipReason::NotTradable)
        ));
    }

    #[test]
    fn missing_momentum_is_a_hold() {
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), None, dec!(100), dec!(0), dec!(10000));
        assert!(matches!(outcome, SymbolOutcome::Skip(SkipReason::NoSignal)));
    }

    #[test]
    fn zero_price_is_unavailable() {
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(0.1)), dec!(0), dec!(0), dec!(10000));
        assert!(matches!(
            outcome,
            SymbolOutcome::Skip(SkipReason::PriceUnavailable)
        ));
    }

    #[test]
    fn small_deltas_stay_below_threshold() {
        // 1% move => $20 target, under the $50 minimum actionable delta
        let engine = engine(&[("BTC/USD", 4)]);
        let outcome = engine.plan_symbol(&btc(), Some(dec!(0.01)), dec!(100), dec!(0), dec!(10000));
        assert!(matches!(
            outcome,
            SymbolOutcome::Skip(SkipReason::BelowThreshold)
        ));
    }

    #[test]
    fn quantization_can_collapse_to_dust() {
        // $60 delta at $100,000 with integer-only quantities floors to zero
        let engine = engine(&[("BTC/USD", 0)]);
        let outcome =
            engine.plan_symbol(&btc(), Some(dec!(0.03)), dec!(100000), dec!(0), dec!(100000));
        assert!(matches!(
            outcome,
            SymbolOutcome::Skip(SkipReason::DustQuantity)
        ));
    }

    #[test]
    fn quantity_is_a_step_multiple() {
        let engine = engine(&[("BTC/USD", 3)]);
        if let SymbolOutcome::Order(order) =
            engine.plan_symbol(&btc(), Some(dec!(0.07)), dec!(113), dec!(0), dec!(10000))
        {
            let step = dec!(0.001);
            assert_eq!(order.quantity % step, Decimal::ZERO);
            assert!(order.quantity.scale() <= 3);
        } else {
            panic!("expected an order");
        }
    }
}
