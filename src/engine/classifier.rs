//! Price-move classifier.
//!
//! Compares a fresh BTC/ETH reading against the stored reference pair.
//! The four threshold checks run in a fixed order and the first match
//! wins: BTC up, BTC down, ETH up, ETH down. An ETH move is therefore only
//! seen while BTC is inside its band. That order is kept as-is; see
//! DESIGN.md before changing it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::types::{Asset, MoveTrigger, PriceMove, PricePair};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Default band half-width, in percent.
pub const DEFAULT_THRESHOLD_PCT: Decimal = dec!(1.5);

/// Upper/lower multipliers applied to the reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub upper: Decimal,
    pub lower: Decimal,
}

impl Thresholds {
    /// Build a symmetric band from a percentage (`1.5` → ×1.015 / ×0.985).
    pub fn from_pct(pct: Decimal) -> Self {
        let frac = pct / Decimal::ONE_HUNDRED;
        Self {
            upper: Decimal::ONE + frac,
            lower: Decimal::ONE - frac,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_pct(DEFAULT_THRESHOLD_PCT)
    }
}

/// Classify `current` against `reference`. `None` means stable.
///
/// Comparisons are strict: a price sitting exactly on the band edge is stable.
pub fn classify(
    reference: &PricePair,
    current: &PricePair,
    thresholds: &Thresholds,
) -> Option<MoveTrigger> {
    const ORDER: [(Asset, PriceMove); 4] = [
        (Asset::Btc, PriceMove::Up),
        (Asset::Btc, PriceMove::Down),
        (Asset::Eth, PriceMove::Up),
        (Asset::Eth, PriceMove::Down),
    ];

    ORDER.iter().find_map(|&(asset, direction)| {
        let previous = reference.get(asset);
        let now = current.get(asset);
        let crossed = match direction {
            PriceMove::Up => now > previous * thresholds.upper,
            PriceMove::Down => now < previous * thresholds.lower,
            PriceMove::Stable => false,
        };
        crossed.then_some(MoveTrigger {
            asset,
            direction,
            previous,
            current: now,
        })
    })
}

// ---------------------------------------------------------------------------
// Reference state
// ---------------------------------------------------------------------------

/// Baseline prices owned by the monitor.
///
/// Starts at zero, so the first positive reading always classifies as up.
/// Both fields advance together on every non-stable observation.
#[derive(Debug, Clone, Default)]
pub struct ReferencePrices {
    pair: PricePair,
    thresholds: Thresholds,
}

impl ReferencePrices {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            pair: PricePair::default(),
            thresholds,
        }
    }

    /// Current baseline.
    pub fn pair(&self) -> PricePair {
        self.pair
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a reading and, if it is not stable, adopt it as the new
    /// baseline for both assets.
    pub fn observe(&mut self, current: PricePair) -> (PriceMove, Option<MoveTrigger>) {
        debug!(reference = %self.pair, current = %current, "Comparing prices");

        match classify(&self.pair, &current, &self.thresholds) {
            Some(trigger) => {
                info!(
                    asset = %trigger.asset,
                    direction = %trigger.direction,
                    previous = %trigger.previous,
                    current = %trigger.current,
                    "Price moved beyond threshold"
                );
                self.pair = current;
                (trigger.direction, Some(trigger))
            }
            None => (PriceMove::Stable, None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
