//! Momentum signal: the instrument's own recent percentage move is the
//! sizing signal.

use crate::exchange::PriceSample;
use rust_decimal::Decimal;

/// Number of consecutive samples the signal needs.
pub const MOMENTUM_SAMPLES: u32 = 2;

/// One-period return from the last two samples of an ordered series.
///
/// Returns `None` when fewer than two samples are available or the earlier
/// price is not positive; the caller treats that as "no signal" and holds.
pub fn momentum_return(samples: &[PriceSample]) -> Option<Decimal> {
    if samples.len() < MOMENTUM_SAMPLES as usize {
        return None;
    }

    let prev = samples[samples.len() - 2].price;
    let last = samples[samples.len() - 1].price;
    if prev <= Decimal::ZERO {
        return None;
    }

    Some(last / prev - Decimal::ONE)
}

/// Desired notional exposure for a symbol given its momentum return.
///
/// A positive move requests proportionally larger long exposure; a negative
/// move requests a reduction, floor-clamped so a single cycle never unwinds
/// more than `downside_clamp` of the current exposure value.
pub fn momentum_target(
    ret: Decimal,
    base_allocation: Decimal,
    current_position_value: Decimal,
    downside_clamp: Decimal,
) -> Decimal {
    let target = ret * base_allocation;
    let floor = -current_position_value * downside_clamp;
    target.max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn samples(prices: &[Decimal]) -> Vec<PriceSample> {
        prices
            .iter()
            .map(|price| PriceSample {
                price: *price,
                timestamp: chrono::Utc::now(),
            })
            .collect()
    }

    #[test]
    fn ten_percent_move_yields_ten_percent_return() {
        let ret = momentum_return(&samples(&[dec!(100), dec!(110)])).unwrap();
        assert_eq!(ret, dec!(0.1));
    }

    #[test]
    fn uses_last_two_samples_of_longer_series() {
        let ret = momentum_return(&samples(&[dec!(90), dec!(100), dec!(105)])).unwrap();
        assert_eq!(ret, dec!(0.05));
    }

    #[test]
    fn too_few_samples_is_no_signal() {
        assert!(momentum_return(&samples(&[dec!(100)])).is_none());
        assert!(momentum_return(&[]).is_none());
    }

    #[test]
    fn non_positive_reference_price_is_no_signal() {
        assert!(momentum_return(&samples(&[dec!(0), dec!(110)])).is_none());
    }

    #[test]
    fn positive_target_scales_with_allocation() {
        // 10% move at $2,000 per unit return => $200 target
        let target = momentum_target(dec!(0.1), dec!(2000), dec!(0), dec!(0.5));
        assert_eq!(target, dec!(200));
    }

    #[test]
    fn negative_target_clamped_to_half_exposure() {
        // -5% move requests -$100, but exposure of $80 clamps at -$40
        let target = momentum_target(dec!(-0.05), dec!(2000), dec!(80), dec!(0.5));
        assert_eq!(target, dec!(-40));
    }

    #[test]
    fn clamp_is_inactive_with_no_exposure() {
        let target = momentum_target(dec!(-0.05), dec!(2000), dec!(0), dec!(0.5));
        assert_eq!(target, dec!(0));
    }
}
