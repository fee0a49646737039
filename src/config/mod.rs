//! Configuration management for the momentum rebalancer.
//!
//! Loads settings from environment variables and config files.

use crate::exchange::Symbol;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Roostoo trading venue credentials
    #[serde(default)]
    pub venue: VenueConfig,
    /// Horus market data credentials
    #[serde(default)]
    pub market_data: MarketDataConfig,
    /// Strategy parameters
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Runtime behaviour
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Risk gate parameters
    #[serde(default)]
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret key for signing requests
    #[serde(default)]
    pub api_secret: String,
    /// Venue base URL
    #[serde(default = "default_venue_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// API key for the price feed
    #[serde(default)]
    pub api_key: String,
    /// Market data base URL
    #[serde(default = "default_market_data_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Tradable pairs in BASE/QUOTE notation
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Notional allocated per unit of momentum return ($ per 100% move)
    #[serde(default = "default_base_allocation")]
    pub base_allocation: Decimal,
    /// Hard per-symbol concentration limit as a fraction of total value
    #[serde(default = "default_max_allocation_pct")]
    pub max_allocation_pct: Decimal,
    /// Fraction of current exposure a negative target may unwind per cycle
    #[serde(default = "default_downside_clamp")]
    pub downside_clamp: Decimal,
    /// Minimum actionable notional delta in quote currency
    #[serde(default = "default_min_trade_notional")]
    pub min_trade_notional: Decimal,
    /// Candle granularity for the momentum lookback
    #[serde(default = "default_momentum_interval")]
    pub momentum_interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Seconds between rebalance cycles
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Log orders instead of submitting them
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum drawdown from peak equity before the gate vetoes (0.0-1.0)
    #[serde(default = "default_max_drawdown")]
    pub max_drawdown: Decimal,
}

// Default value functions
fn default_venue_base_url() -> String {
    "https://mock-api.roostoo.com".to_string()
}

fn default_market_data_base_url() -> String {
    "https://api-horus.com".to_string()
}

fn default_symbols() -> Vec<String> {
    [
        "BTC/USD", "ETH/USD", "XRP/USD", "BNB/USD", "SOL/USD", "DOGE/USD", "TRX/USD", "ADA/USD",
        "XLM/USD", "WBTC/USD", "SUI/USD", "HBAR/USD", "LINK/USD", "BCH/USD", "WBETH/USD",
        "UNI/USD", "AVAX/USD", "SHIB/USD", "TON/USD", "LTC/USD", "DOT/USD", "PEPE/USD",
        "AAVE/USD", "ONDO/USD", "TAO/USD", "WLD/USD", "APT/USD", "NEAR/USD", "ARB/USD",
        "ICP/USD", "ETC/USD", "FIL/USD", "TRUMP/USD", "OP/USD", "ALGO/USD", "POL/USD",
        "BONK/USD", "ENA/USD", "ENS/USD", "VET/USD", "SEI/USD", "RENDER/USD", "FET/USD",
        "ATOM/USD", "VIRTUAL/USD", "SKY/USD", "BNSOL/USD", "RAY/USD", "TIA/USD", "JTO/USD",
        "JUP/USD", "QNT/USD", "FORM/USD", "INJ/USD", "STX/USD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_base_allocation() -> Decimal {
    Decimal::new(2000, 0) // $2,000 per 100% move
}

fn default_max_allocation_pct() -> Decimal {
    Decimal::new(35, 2) // 0.35
}

fn default_downside_clamp() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

fn default_min_trade_notional() -> Decimal {
    Decimal::new(50, 0) // $50
}

fn default_momentum_interval() -> String {
    "1h".to_string()
}

fn default_cycle_interval_secs() -> u64 {
    3600
}

fn default_max_drawdown() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("MRB"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.strategy.base_allocation > Decimal::ZERO,
            "base_allocation must be positive"
        );

        anyhow::ensure!(
            self.strategy.max_allocation_pct > Decimal::ZERO
                && self.strategy.max_allocation_pct <= Decimal::ONE,
            "max_allocation_pct must be between 0 and 1"
        );

        anyhow::ensure!(
            self.strategy.downside_clamp >= Decimal::ZERO
                && self.strategy.downside_clamp <= Decimal::ONE,
            "downside_clamp must be between 0 and 1"
        );

        anyhow::ensure!(
            self.strategy.min_trade_notional >= Decimal::ZERO,
            "min_trade_notional must not be negative"
        );

        anyhow::ensure!(
            self.runtime.cycle_interval_secs >= 1,
            "cycle_interval_secs must be at least 1"
        );

        anyhow::ensure!(
            self.risk.max_drawdown > Decimal::ZERO && self.risk.max_drawdown <= Decimal::ONE,
            "max_drawdown must be between 0 and 1"
        );

        self.strategy.parsed_symbols()?;

        Ok(())
    }
}

impl StrategyConfig {
    /// Symbol universe parsed into typed pairs.
    pub fn parsed_symbols(&self) -> Result<Vec<Symbol>> {
        self.symbols
            .iter()
            .map(|s| {
                s.parse::<Symbol>()
                    .with_context(|| format!("Invalid symbol in configuration: {s:?}"))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            market_data: MarketDataConfig::default(),
            strategy: StrategyConfig::default(),
            runtime: RuntimeConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: default_venue_base_url(),
        }
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_market_data_base_url(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            base_allocation: default_base_allocation(),
            max_allocation_pct: default_max_allocation_pct(),
            downside_clamp: default_downside_clamp(),
            min_trade_notional: default_min_trade_notional(),
            momentum_interval: default_momentum_interval(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            dry_run: false,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown: default_max_drawdown(),
        }
    }
}
