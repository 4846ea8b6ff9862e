//! Conservation check for allocated impact.
//!
//! The allocator assigns the direct effect to the origin and splits the
//! ripple of each sector by normalized weights, so for every sector `s`:
//!
//! ```text
//! sum over regions of production(r, s) + undistributed(s) == national(s)
//! ```
//!
//! This holds by construction up to floating-point rounding. The check
//! runs after every allocation anyway and reports an
//! [`AllocationAnomaly`] if the sums drift beyond [`RELATIVE_TOLERANCE`].

use std::collections::BTreeMap;

use crate::allocation::Allocation;

/// Allowed relative difference between allocated and national impact.
pub const RELATIVE_TOLERANCE: f64 = 1e-6;

/// Sectors whose allocated impact does not match the national impact.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationAnomaly {
    /// Sector index -> (expected, allocated).
    pub imbalances: BTreeMap<usize, (f64, f64)>,
    /// Human-readable summary.
    pub message: String,
}

impl core::fmt::Display for AllocationAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The result of a conservation check for one allocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// Every sector balances.
    Balanced,
    /// One or more sectors do not balance.
    Anomaly(AllocationAnomaly),
}

impl ConservationResult {
    /// Whether the allocation balanced.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify that `allocation` distributes exactly the `national` impact.
pub fn verify_allocation(national: &[f64], allocation: &Allocation) -> ConservationResult {
    let mut imbalances = BTreeMap::new();

    for (sector, expected) in national.iter().enumerate() {
        let discarded = allocation.undistributed.get(sector).copied().unwrap_or(0.0);
        let allocated = allocation.sector_total(sector) + discarded;
        let tolerance = RELATIVE_TOLERANCE * expected.abs().max(1.0);
        if !allocated.is_finite() || (allocated - expected).abs() > tolerance {
            imbalances.insert(sector, (*expected, allocated));
        }
    }

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(AllocationAnomaly {
            imbalances,
            message: format!("allocation does not conserve national impact for {count} sector(s)"),
        })
    }
}
