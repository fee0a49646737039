//! Venue integrations for the rebalancing bot.
//!
//! ## Roostoo
//! Signed REST access to the trading account: free balances, order
//! placement, and exchange metadata (per-pair amount precision).
//!
//! ## Horus
//! Read-only market data: latest price and short candle histories per base
//! asset, feeding the momentum signal.

mod horus;
pub mod mock;
mod roostoo;
mod traits;
mod types;

pub use horus::HorusClient;
pub use mock::MockExchange;
pub use roostoo::RoostooClient;
pub use traits::{AccountGateway, MarketDataGateway};
pub use types::*;
