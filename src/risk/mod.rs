//! Portfolio-level risk gate.
//!
//! The scheduler calls the gate once per cycle with a fresh snapshot and
//! honors its veto unconditionally: a `false` permit skips the entire
//! rebalance pass. The gate keeps whatever internal memory its policy needs
//! across cycles; that memory is opaque to the engine.

use crate::exchange::Symbol;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Veto mechanism consulted at the top of every cycle.
pub trait RiskGate: Send + Sync {
    /// Whether rebalancing may proceed this cycle, given total portfolio
    /// value and current per-symbol position values.
    fn permit(&mut self, total_value: Decimal, positions: &HashMap<Symbol, Decimal>) -> bool;
}

/// Drawdown-based gate: vetoes while equity sits too far below its peak.
///
/// Tracks peak portfolio value across cycles and withholds the permit while
/// the drawdown from that peak exceeds `max_drawdown`. Trading resumes once
/// equity recovers inside the limit.
pub struct DrawdownGate {
    max_drawdown: Decimal,
    peak_equity: Decimal,
    current_drawdown: Decimal,
}

impl DrawdownGate {
    pub fn new(max_drawdown: Decimal) -> Self {
        Self {
            max_drawdown,
            peak_equity: Decimal::ZERO,
            current_drawdown: Decimal::ZERO,
        }
    }

    pub fn current_drawdown(&self) -> Decimal {
        self.current_drawdown
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }
}

impl RiskGate for DrawdownGate {
    fn permit(&mut self, total_value: Decimal, positions: &HashMap<Symbol, Decimal>) -> bool {
        if total_value > self.peak_equity {
            self.peak_equity = total_value;
            self.current_drawdown = Decimal::ZERO;
        } else if self.peak_equity > Decimal::ZERO {
            self.current_drawdown = (self.peak_equity - total_value) / self.peak_equity;
        }

        debug!(
            total_value = %total_value,
            peak = %self.peak_equity,
            drawdown = %self.current_drawdown,
            positions = positions.len(),
            "Risk gate check"
        );

        if self.current_drawdown >= self.max_drawdown {
            warn!(
                drawdown = %self.current_drawdown,
                limit = %self.max_drawdown,
                "Drawdown limit breached, vetoing rebalance cycle"
            );
            return false;
        }

        true
    }
}
