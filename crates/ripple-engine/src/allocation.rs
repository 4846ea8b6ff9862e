//! Gravity-model allocation of national impact onto regions.
//!
//! The national impact of every sector is split into two parts:
//!
//! - **Direct effect**: the shock value itself, assigned entirely to the
//!   origin region and origin sector.
//! - **Ripple**: everything else, `national(s) - direct(s)`, distributed
//!   over all regions (the origin included) by gravity weights.
//!
//! The gravity weight of region `r` for sector `s` combines economic size
//! and proximity to the shock origin:
//!
//! ```text
//! proximity(r) = exp(-friction * distance(r, origin))
//! weight(r, s) = share(r, s) * proximity(r)
//! ripple(r, s) = weight(r, s) / sum over regions of weight(., s) * ripple(s)
//! ```
//!
//! Distances are planar, between centroids, in the working coordinate
//! system of the boundary data. The normalisation cancels any common
//! factor, so each sector's weights are computed as
//! `share(r, s) * exp(-friction * (distance(r) - nearest(s)))`, where
//! `nearest(s)` is the distance of the closest region with activity in
//! `s`. The result is the same split, and it does not underflow to zero
//! when every active region lies far from the origin.
//!
//! A sector with no activity in any region keeps its ripple
//! undistributed; it is reported rather than divided by zero.

use tracing::{debug, warn};

use ripple_types::Shock;

use crate::baseline::RegionalBaseline;
use crate::error::EngineError;

/// Default distance-decay friction.
pub const DEFAULT_FRICTION: f64 = 0.4;

/// Ripple magnitudes below this are not worth reporting when discarded.
const NEGLIGIBLE_RIPPLE: f64 = 1e-12;

/// Per-region production impact produced by the allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Production impact, `[region][sector]`, regions in baseline order.
    pub production: Vec<Vec<f64>>,
    /// Distance of each region's centroid from the origin's centroid.
    pub distance: Vec<f64>,
    /// Distance-decay factor of each region.
    pub proximity: Vec<f64>,
    /// Value assigned directly to the origin region and sector.
    pub direct_effect: f64,
    /// Ripple per sector that was not distributed because all weights were zero.
    pub undistributed: Vec<f64>,
    /// Position of the origin region in the baseline.
    pub origin: usize,
}

impl Allocation {
    /// Production impact of one (region, sector) pair, zero if out of range.
    pub fn production_of(&self, region: usize, sector: usize) -> f64 {
        self.production
            .get(region)
            .and_then(|row| row.get(sector))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of production impact over all regions for `sector`.
    pub fn sector_total(&self, sector: usize) -> f64 {
        self.production
            .iter()
            .filter_map(|row| row.get(sector))
            .sum()
    }
}

/// Distributes national sectoral impact onto regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAllocator {
    friction: f64,
}

impl Default for SpatialAllocator {
    fn default() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
        }
    }
}

impl SpatialAllocator {
    /// Create an allocator with the given friction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] unless `friction` is
    /// finite and non-negative.
    pub fn new(friction: f64) -> Result<Self, EngineError> {
        if !friction.is_finite() || friction < 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "friction",
                reason: format!("must be finite and non-negative, got {friction}"),
            });
        }
        Ok(Self { friction })
    }

    /// The distance-decay friction.
    pub const fn friction(&self) -> f64 {
        self.friction
    }

    /// Distance-decay factor: 1.0 at distance zero, decreasing with distance.
    pub fn proximity(&self, distance: f64) -> f64 {
        (-self.friction * distance).exp()
    }

    /// Allocate the national impact of `shock` onto the regions of `baseline`.
    ///
    /// `national` is the per-sector output impact from the
    /// [`ShockPropagator`](crate::propagation::ShockPropagator).
    ///
    /// # Errors
    ///
    /// - [`EngineError::SectorCountMismatch`] if `national` and the baseline
    ///   disagree on the number of sectors.
    /// - [`EngineError::UnknownRegion`] / [`EngineError::UnknownSector`] if
    ///   the shock origin is not in the baseline.
    pub fn allocate(
        &self,
        baseline: &RegionalBaseline,
        shock: &Shock,
        national: &[f64],
    ) -> Result<Allocation, EngineError> {
        let sector_count = baseline.sector_count();
        if national.len() != sector_count {
            return Err(EngineError::SectorCountMismatch {
                expected: sector_count,
                actual: national.len(),
            });
        }
        let origin_sector = shock.sector.index();
        if origin_sector >= sector_count {
            return Err(EngineError::UnknownSector(shock.sector));
        }
        let origin = baseline
            .position(shock.region)
            .ok_or(EngineError::UnknownRegion(shock.region))?;
        let origin_centroid = baseline
            .region(shock.region)
            .map(|r| r.centroid)
            .ok_or(EngineError::UnknownRegion(shock.region))?;

        let regions = baseline.regions();
        let distance: Vec<f64> = regions
            .iter()
            .map(|r| (r.centroid.x() - origin_centroid.x()).hypot(r.centroid.y() - origin_centroid.y()))
            .collect();
        let proximity: Vec<f64> = distance.iter().map(|d| self.proximity(*d)).collect();

        let mut production = vec![vec![0.0; sector_count]; regions.len()];
        if let Some(cell) = production
            .get_mut(origin)
            .and_then(|row| row.get_mut(origin_sector))
        {
            *cell = shock.value;
        }

        let mut undistributed = vec![0.0; sector_count];
        for (sector, national_impact) in national.iter().enumerate() {
            let direct = if sector == origin_sector { shock.value } else { 0.0 };
            let ripple = national_impact - direct;

            let nearest = regions
                .iter()
                .zip(&distance)
                .filter(|(r, _)| r.share_of(sector) > 0.0)
                .map(|(_, d)| *d)
                .fold(f64::INFINITY, f64::min);
            let weights: Vec<f64> = regions
                .iter()
                .zip(&distance)
                .map(|(r, d)| {
                    let share = r.share_of(sector);
                    if share > 0.0 {
                        share * self.proximity(d - nearest)
                    } else {
                        0.0
                    }
                })
                .collect();
            let total: f64 = weights.iter().sum();

            if total > 0.0 && total.is_finite() {
                for (row, weight) in production.iter_mut().zip(&weights) {
                    if let Some(cell) = row.get_mut(sector) {
                        *cell += weight / total * ripple;
                    }
                }
            } else {
                if ripple.abs() > NEGLIGIBLE_RIPPLE {
                    warn!(sector, ripple, "Allocation weights sum to zero, ripple not distributed");
                }
                if let Some(slot) = undistributed.get_mut(sector) {
                    *slot = ripple;
                }
            }
        }

        debug!(
            origin = %shock.region,
            regions = regions.len(),
            friction = self.friction,
            "Impact allocated"
        );

        Ok(Allocation {
            production,
            distance,
            proximity,
            direct_effect: shock.value,
            undistributed,
            origin,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::boundary::RegionBoundary;
    use ripple_types::{EconomicRecord, RegionKey, SectorId};

    fn record(region: u32, sector: u16, value_added: f64) -> EconomicRecord {
        EconomicRecord {
            region: RegionKey(region),
            sector: SectorId(sector),
            value_added,
            employment: 0.0,
            businesses: 0,
        }
    }

    fn shock(region: u32, sector: u16, value: f64) -> Shock {
        Shock {
            region: RegionKey(region),
            sector: SectorId(sector),
            value,
        }
    }

    #[test]
    fn single_region_receives_everything() {
        let boundaries = vec![RegionBoundary::from_point(RegionKey(1), "Solo", 3.0, 4.0)];
        let records = vec![record(1, 0, 10.0), record(1, 1, 20.0)];
        let baseline = RegionalBaseline::build(&boundaries, &records, 2).unwrap();
        let national = [126.126, 9.009];

        let allocation = SpatialAllocator::default()
            .allocate(&baseline, &shock(1, 0, 100.0), &national)
            .unwrap();
        assert!((allocation.production_of(0, 0) - 126.126).abs() < 1e-9);
        assert!((allocation.production_of(0, 1) - 9.009).abs() < 1e-9);
        assert!((allocation.proximity[0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn origin_gets_larger_ripple_than_distant_region_with_equal_share() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "Origin", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "Far", 5.0, 0.0),
        ];
        let records = vec![record(1, 0, 50.0), record(2, 0, 50.0)];
        let baseline = RegionalBaseline::build(&boundaries, &records, 1).unwrap();
        let allocation = SpatialAllocator::new(0.4)
            .unwrap()
            .allocate(&baseline, &shock(1, 0, 100.0), &[150.0])
            .unwrap();

        let origin_ripple = allocation.production_of(0, 0) - 100.0;
        let far_ripple = allocation.production_of(1, 0);
        assert!(origin_ripple > far_ripple);
        assert!((origin_ripple + far_ripple - 50.0).abs() < 1e-9);

        // Weights are 1 and exp(-2), so the split is exact.
        let decay = (-2.0_f64).exp();
        assert!((far_ripple - 50.0 * decay / (1.0 + decay)).abs() < 1e-9);
    }

    #[test]
    fn closer_region_gets_more_than_farther_region() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "Origin", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "Near", 1.0, 0.0),
            RegionBoundary::from_point(RegionKey(3), "Far", 0.0, 3.0),
        ];
        let records = vec![record(1, 0, 10.0), record(2, 0, 45.0), record(3, 0, 45.0)];
        let baseline = RegionalBaseline::build(&boundaries, &records, 1).unwrap();
        let allocator = SpatialAllocator::new(1.0).unwrap();
        let allocation = allocator
            .allocate(&baseline, &shock(1, 0, 10.0), &[40.0])
            .unwrap();

        assert!(allocation.proximity[1] > allocation.proximity[2]);
        assert!(allocation.production_of(1, 0) > allocation.production_of(2, 0));
        assert!((allocation.distance[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn sector_totals_match_national_impact() {
        let boundaries: Vec<RegionBoundary> = (1..=6)
            .map(|k| RegionBoundary::from_point(RegionKey(k), format!("R{k}"), f64::from(k), f64::from(k % 3)))
            .collect();
        let records: Vec<EconomicRecord> = (1..=6)
            .flat_map(|k| (0..3).map(move |s| record(k, s, f64::from(k * 10 + u32::from(s)))))
            .collect();
        let baseline = RegionalBaseline::build(&boundaries, &records, 3).unwrap();
        let national = [130.0, 42.5, 17.25];
        let allocation = SpatialAllocator::default()
            .allocate(&baseline, &shock(4, 0, 100.0), &national)
            .unwrap();

        for (s, expected) in national.iter().enumerate() {
            let total = allocation.sector_total(s);
            assert!((total - expected).abs() <= 1e-6 * expected.abs());
        }
        assert!(allocation.production.iter().flatten().all(|v| *v >= 0.0));
        assert!(allocation.production_of(3, 0) >= 100.0);
    }

    #[test]
    fn zero_friction_allocates_by_share_alone() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "A", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "B", 100.0, 0.0),
        ];
        let records = vec![record(1, 0, 25.0), record(2, 0, 75.0)];
        let baseline = RegionalBaseline::build(&boundaries, &records, 1).unwrap();
        let allocation = SpatialAllocator::new(0.0)
            .unwrap()
            .allocate(&baseline, &shock(1, 0, 10.0), &[30.0])
            .unwrap();
        assert!((allocation.production_of(1, 0) - 15.0).abs() < 1e-9);
        assert!((allocation.production_of(0, 0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_sector_keeps_ripple_undistributed() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "A", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "B", 1.0, 0.0),
        ];
        let records = vec![
            record(1, 0, 10.0),
            record(2, 0, 10.0),
            record(1, 1, 0.0),
            record(2, 1, 0.0),
        ];
        let baseline = RegionalBaseline::build(&boundaries, &records, 2).unwrap();
        let allocation = SpatialAllocator::default()
            .allocate(&baseline, &shock(1, 0, 10.0), &[12.0, 3.0])
            .unwrap();
        assert!((allocation.undistributed[1] - 3.0).abs() < f64::EPSILON);
        assert!(allocation.sector_total(1).abs() < f64::EPSILON);
        assert!((allocation.sector_total(0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn distant_active_regions_still_receive_ripple() {
        // exp(-0.4 * 2000) underflows to zero; the origin has no industry.
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "Origin", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "Far", 2000.0, 0.0),
            RegionBoundary::from_point(RegionKey(3), "Farther", 2001.0, 0.0),
        ];
        let records = vec![
            record(1, 0, 100.0),
            record(2, 0, 100.0),
            record(3, 0, 100.0),
            record(1, 1, 0.0),
            record(2, 1, 500.0),
            record(3, 1, 500.0),
        ];
        let baseline = RegionalBaseline::build(&boundaries, &records, 2).unwrap();
        let national = [126.126, 9.009];
        let allocation = SpatialAllocator::default()
            .allocate(&baseline, &shock(1, 0, 100.0), &national)
            .unwrap();

        assert!(allocation.proximity[1] < f64::MIN_POSITIVE);
        assert!(allocation.undistributed[1].abs() < f64::EPSILON);
        assert!((allocation.sector_total(1) - 9.009).abs() <= 1e-6 * 9.009);
        assert!(allocation.production_of(0, 1).abs() < f64::EPSILON);

        // Equal shares one unit apart split 1 : exp(-0.4).
        let decay = (-0.4_f64).exp();
        let expected_far = 9.009 / (1.0 + decay);
        assert!((allocation.production_of(1, 1) - expected_far).abs() < 1e-9);
        assert!(allocation.production_of(1, 1) > allocation.production_of(2, 1));
        assert!(matches!(
            crate::conservation::verify_allocation(&national, &allocation),
            crate::conservation::ConservationResult::Balanced
        ));
    }

    #[test]
    fn origin_position_follows_baseline_order() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(7), "A", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(3), "B", 1.0, 0.0),
        ];
        let records = vec![record(7, 0, 1.0), record(3, 0, 1.0)];
        let baseline = RegionalBaseline::build(&boundaries, &records, 1).unwrap();
        let allocation = SpatialAllocator::default()
            .allocate(&baseline, &shock(3, 0, 5.0), &[8.0])
            .unwrap();
        assert_eq!(Some(allocation.origin), baseline.position(RegionKey(3)));
        assert!(allocation.production_of(allocation.origin, 0) >= 5.0);
        assert!(allocation.distance[allocation.origin].abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_friction_is_rejected() {
        assert!(SpatialAllocator::new(-0.1).is_err());
        assert!(SpatialAllocator::new(f64::NAN).is_err());
        assert!(SpatialAllocator::new(f64::INFINITY).is_err());
    }

    #[test]
    fn unknown_origin_and_mismatched_vector_are_errors() {
        let boundaries = vec![RegionBoundary::from_point(RegionKey(1), "A", 0.0, 0.0)];
        let baseline = RegionalBaseline::build(&boundaries, &[record(1, 0, 1.0)], 1).unwrap();
        let allocator = SpatialAllocator::default();
        assert!(matches!(
            allocator.allocate(&baseline, &shock(9, 0, 1.0), &[1.0]),
            Err(EngineError::UnknownRegion(RegionKey(9)))
        ));
        assert!(matches!(
            allocator.allocate(&baseline, &shock(1, 0, 1.0), &[1.0, 2.0]),
            Err(EngineError::SectorCountMismatch { .. })
        ));
    }
}
