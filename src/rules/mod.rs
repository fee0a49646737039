//! Trading-rule registry: per-pair quantization constraints.
//!
//! Loaded once at startup from the venue's exchange metadata and treated as
//! immutable for the process lifetime. A failed or malformed load degrades to
//! an empty registry, which leaves every symbol untradable for the session
//! rather than aborting the process.

use crate::exchange::{AccountGateway, ExchangeInfo, Symbol};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};

/// Quantization rule for one trading pair.
///
/// Invariant: `step_size == 10^(-qty_precision)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRule {
    pub step_size: Decimal,
    pub qty_precision: u32,
}

impl TradeRule {
    /// Derive the rule from the venue's amount-precision integer.
    pub fn from_precision(qty_precision: u32) -> Self {
        Self {
            step_size: Decimal::new(1, qty_precision),
            qty_precision,
        }
    }
}

/// Immutable mapping from tradable pair to its quantization rule.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<Symbol, TradeRule>,
}

impl RuleRegistry {
    /// Build the registry from an exchange metadata document.
    ///
    /// Pairs whose name does not parse as BASE/QUOTE are dropped with a
    /// warning; they would be unaddressable by the engine anyway.
    pub fn from_exchange_info(info: &ExchangeInfo) -> Self {
        let mut rules = HashMap::new();

        for (pair, conf) in &info.trade_pairs {
            // Decimal supports at most 28 fractional digits; anything past
            // that is malformed metadata.
            if conf.amount_precision > 28 {
                warn!(
                    pair = %pair,
                    precision = conf.amount_precision,
                    "Skipping pair with out-of-range amount precision"
                );
                continue;
            }

            match pair.parse::<Symbol>() {
                Ok(symbol) => {
                    rules.insert(symbol, TradeRule::from_precision(conf.amount_precision));
                }
                Err(_) => {
                    warn!(pair = %pair, "Skipping unparsable pair in exchange metadata");
                }
            }
        }

        Self { rules }
    }

    /// Fetch exchange metadata and build the registry.
    ///
    /// Any gateway failure degrades to an empty registry: the engine then
    /// skips every symbol, trading nothing this session.
    pub async fn load(gateway: &dyn AccountGateway) -> Self {
        match gateway.exchange_info().await {
            Ok(info) => {
                let registry = Self::from_exchange_info(&info);
                info!(pairs = registry.len(), "Trade rules loaded");
                registry
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to load exchange metadata, no pairs tradable");
                Self::default()
            }
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&TradeRule> {
        self.rules.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.rules.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{MockExchange, TradePairInfo};
    use rust_decimal_macros::dec;

    #[test]
    fn step_size_matches_precision() {
        assert_eq!(TradeRule::from_precision(0).step_size, dec!(1));
        assert_eq!(TradeRule::from_precision(2).step_size, dec!(0.01));
        assert_eq!(TradeRule::from_precision(6).step_size, dec!(0.000001));
    }

    #[test]
    fn builds_rules_from_metadata() {
        let mut info = ExchangeInfo::default();
        info.trade_pairs.insert(
            "BTC/USD".to_string(),
            TradePairInfo {
                amount_precision: 4,
            },
        );
        info.trade_pairs.insert(
            "not-a-pair".to_string(),
            TradePairInfo {
                amount_precision: 2,
            },
        );

        let registry = RuleRegistry::from_exchange_info(&info);
        assert_eq!(registry.len(), 1);

        let symbol: Symbol = "BTC/USD".parse().unwrap();
        let rule = registry.get(&symbol).unwrap();
        assert_eq!(rule.step_size, dec!(0.0001));
        assert_eq!(rule.qty_precision, 4);
    }

    #[test]
    fn out_of_range_precision_is_dropped() {
        let mut info = ExchangeInfo::default();
        info.trade_pairs.insert(
            "BTC/USD".to_string(),
            TradePairInfo {
                amount_precision: 40,
            },
        );

        let registry = RuleRegistry::from_exchange_info(&info);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn load_failure_degrades_to_empty() {
        let mock = MockExchange::new();
        mock.fail_exchange_info(true);

        let registry = RuleRegistry::load(&mock).await;
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn load_reads_precisions_from_gateway() {
        let mock = MockExchange::new();
        mock.set_precision("ETH/USD", 3).await;

        let registry = RuleRegistry::load(&mock).await;
        let symbol: Symbol = "ETH/USD".parse().unwrap();
        assert_eq!(registry.get(&symbol).unwrap().step_size, dec!(0.001));
    }
}
