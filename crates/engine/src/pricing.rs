//! Sentiment-driven price and quantity multipliers

use bazaar_core::{Gold, Sentiment, MAX_SENTIMENT};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Width of one sentiment bucket
const BUCKET_WIDTH: u32 = MAX_SENTIMENT / 10;

/// Price factor per bucket, lowest sentiment first
const PRICE_FACTORS: [f64; 10] = [0.55, 0.60, 0.65, 0.70, 0.75, 0.80, 0.85, 0.90, 0.95, 1.00];

/// Quantity factor per bucket, lowest sentiment first
const QUANTITY_FACTORS: [f64; 10] = [1.45, 1.35, 1.25, 1.15, 1.05, 0.95, 0.85, 0.75, 0.65, 0.55];

/// Read port for the global market sentiment
///
/// The economy only ever reads sentiment; whoever owns it writes elsewhere.
pub trait MarketSentimentProvider {
    fn current(&self) -> Sentiment;
}

/// Constant sentiment, for tests and fixed-economy shards
#[derive(Debug, Clone, Copy)]
pub struct FixedSentiment(pub Sentiment);

impl MarketSentimentProvider for FixedSentiment {
    fn current(&self) -> Sentiment {
        self.0
    }
}

/// Sentiment cell shared with the subsystem that owns it
#[derive(Debug, Clone, Default)]
pub struct SharedSentiment {
    value: Arc<AtomicU32>,
}

impl SharedSentiment {
    pub fn new(initial: Sentiment) -> Self {
        Self {
            value: Arc::new(AtomicU32::new(initial.value())),
        }
    }

    /// Writer side, handed to the owning subsystem
    pub fn set(&self, sentiment: Sentiment) {
        self.value.store(sentiment.value(), Ordering::Relaxed);
    }
}

impl MarketSentimentProvider for SharedSentiment {
    fn current(&self) -> Sentiment {
        Sentiment::new(self.value.load(Ordering::Relaxed))
    }
}

/// Pair of factors applied to catalog prices and stock amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplier {
    pub price: f64,
    pub quantity: f64,
}

impl Multiplier {
    /// Sentiment pricing disabled
    pub const NEUTRAL: Multiplier = Multiplier {
        price: 1.0,
        quantity: 1.0,
    };

    /// Scale a price; the result never drops below one unit
    pub fn apply_price(&self, price: Gold) -> Gold {
        Gold(scale_floor_one(price.as_u64(), self.price))
    }

    /// Scale a stock amount; the result never drops below one unit
    pub fn apply_quantity(&self, amount: u32) -> u32 {
        scale_floor_one(amount as u64, self.quantity).min(u32::MAX as u64) as u32
    }
}

fn scale_floor_one(value: u64, factor: f64) -> u64 {
    let scaled = (value as f64 * factor).round();
    if scaled < 1.0 {
        1
    } else {
        scaled as u64
    }
}

/// Map a sentiment reading to its multipliers.
///
/// Unfavorable (bad) vendors read the axis inverted. Within the effective
/// axis the price factor never decreases and the quantity factor never
/// increases as sentiment rises.
pub fn multiplier(sentiment: Sentiment, favorable: bool) -> Multiplier {
    let effective = if favorable {
        sentiment
    } else {
        sentiment.inverted()
    };
    let bucket = ((effective.value() / BUCKET_WIDTH) as usize).min(PRICE_FACTORS.len() - 1);

    Multiplier {
        price: PRICE_FACTORS[bucket],
        quantity: QUANTITY_FACTORS[bucket],
    }
}

/// Binds a sentiment source to the economy's pricing toggle
#[derive(Debug, Clone)]
pub struct PriceModifier<P> {
    provider: P,
    enabled: bool,
}

impl<P: MarketSentimentProvider> PriceModifier<P> {
    pub fn new(provider: P, enabled: bool) -> Self {
        Self { provider, enabled }
    }

    /// Multipliers for a vendor at the current sentiment, read once per call
    pub fn current(&self, favorable: bool) -> Multiplier {
        if !self.enabled {
            return Multiplier::NEUTRAL;
        }
        multiplier(self.provider.current(), favorable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_edges() {
        let low = multiplier(Sentiment::new(0), true);
        assert_eq!(low.price, 0.55);
        assert_eq!(low.quantity, 1.45);

        assert_eq!(multiplier(Sentiment::new(9_999), true).price, 0.55);
        assert_eq!(multiplier(Sentiment::new(10_000), true).price, 0.60);

        let top = multiplier(Sentiment::new(MAX_SENTIMENT), true);
        assert_eq!(top.price, 1.00);
        assert_eq!(top.quantity, 0.55);
    }

    #[test]
    fn test_unfavorable_vendor_reads_inverted_axis() {
        let s = Sentiment::new(15_000);
        assert_eq!(
            multiplier(s, false),
            multiplier(Sentiment::new(MAX_SENTIMENT - 15_000), true)
        );
    }

    #[test]
    fn test_factors_are_monotonic_in_effective_sentiment() {
        let mut prev = multiplier(Sentiment::new(0), true);
        for value in (0..=MAX_SENTIMENT).step_by(2_500) {
            let m = multiplier(Sentiment::new(value), true);
            assert!(m.price >= prev.price);
            assert!(m.quantity <= prev.quantity);
            prev = m;
        }
    }

    #[test]
    fn test_scaled_amounts_never_drop_below_one() {
        let m = multiplier(Sentiment::new(0), true);
        assert_eq!(m.apply_price(Gold(1)), Gold(1));
        assert_eq!(m.apply_price(Gold(100)), Gold(55));
        assert_eq!(multiplier(Sentiment::new(MAX_SENTIMENT), true).apply_quantity(1), 1);
        assert_eq!(m.apply_quantity(20), 29);
    }

    #[test]
    fn test_disabled_modifier_is_neutral() {
        let modifier = PriceModifier::new(FixedSentiment(Sentiment::new(0)), false);
        assert_eq!(modifier.current(true), Multiplier::NEUTRAL);

        let shared = SharedSentiment::new(Sentiment::new(0));
        let modifier = PriceModifier::new(shared.clone(), true);
        shared.set(Sentiment::new(95_000));
        assert_eq!(modifier.current(true).price, 1.00);
    }
}
