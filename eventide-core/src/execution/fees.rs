//! Commission schedules.
//!
//! A fee schedule only answers "what does a fill of `quantity` at `price`
//! cost". Every schedule charges at least its floor, and within one tier the
//! charge never decreases as quantity grows.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Commission model used by an execution backend when the venue does not
/// report one.
pub trait FeeSchedule: Send + Sync + Debug {
    fn commission(&self, quantity: u64, price: f64) -> f64;
}

/// No commission at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZeroFees;

impl FeeSchedule for ZeroFees {
    fn commission(&self, _quantity: u64, _price: f64) -> f64 {
        0.0
    }
}

/// Flat per-share rate with a minimum charge per order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerShareFees {
    pub rate: f64,
    pub floor: f64,
}

impl FeeSchedule for PerShareFees {
    fn commission(&self, quantity: u64, _price: f64) -> f64 {
        (self.rate * quantity as f64).max(self.floor)
    }
}

/// Two-tier per-share schedule with a floor.
///
/// Orders up to `share_threshold` shares pay `small_order_rate` per share,
/// larger orders pay `large_order_rate`. Defaults follow a US directed-API
/// broker schedule: 500 shares, 0.013 and 0.008 per share, 1.30 minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredFees {
    pub share_threshold: u64,
    pub small_order_rate: f64,
    pub large_order_rate: f64,
    pub floor: f64,
}

impl Default for TieredFees {
    fn default() -> Self {
        Self {
            share_threshold: 500,
            small_order_rate: 0.013,
            large_order_rate: 0.008,
            floor: 1.3,
        }
    }
}

impl FeeSchedule for TieredFees {
    fn commission(&self, quantity: u64, _price: f64) -> f64 {
        let rate = if quantity <= self.share_threshold {
            self.small_order_rate
        } else {
            self.large_order_rate
        };
        (rate * quantity as f64).max(self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fees_are_zero() {
        assert_eq!(ZeroFees.commission(1_000, 50.0), 0.0);
    }

    #[test]
    fn per_share_respects_floor() {
        let fees = PerShareFees {
            rate: 0.005,
            floor: 1.0,
        };
        assert_eq!(fees.commission(10, 50.0), 1.0);
        assert!((fees.commission(1_000, 50.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn tiered_small_and_large_orders() {
        let fees = TieredFees::default();
        // floor dominates small orders
        assert_eq!(fees.commission(100, 10.0), 1.3);
        assert!((fees.commission(500, 10.0) - 6.5).abs() < 1e-12);
        assert!((fees.commission(1_000, 10.0) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn tiered_monotone_within_tier() {
        let fees = TieredFees::default();
        let small: Vec<f64> = (1..=500).map(|q| fees.commission(q, 1.0)).collect();
        assert!(small.windows(2).all(|w| w[1] >= w[0]));
        let large: Vec<f64> = (501..=2_000).map(|q| fees.commission(q, 1.0)).collect();
        assert!(large.windows(2).all(|w| w[1] >= w[0]));
        assert!(small.iter().chain(&large).all(|c| *c >= fees.floor));
    }
}
