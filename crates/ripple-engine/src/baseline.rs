//! Regional baseline: per-region, per-sector economic figures and centroids.
//!
//! The baseline joins the boundary dataset and the economic dataset on
//! [`RegionKey`]. It is built once and is read-only afterwards; every
//! simulation borrows it.
//!
//! # National share
//!
//! For every sector `s` and region `r`:
//!
//! ```text
//! share(r, s) = vab(r, s) / sum over regions of vab(., s)
//! ```
//!
//! Shares of a sector sum to one whenever the sector has any value-added
//! at all. A sector with zero national value-added gets all-zero shares.
//!
//! # Missing data
//!
//! A boundary region with no economic row for a sector receives the
//! median of that sector across the regions that do have data. The
//! substitution is recorded in [`RegionalBaseline::substitutions`] and
//! logged; it never aborts the build.

use std::collections::BTreeMap;

use geo::Point;
use tracing::{debug, info, warn};

use ripple_types::{
    BaselineSource, EconomicRecord, RegionKey, RegionProfile, SectorBaseline, SectorId,
    Substitution,
};

use crate::boundary::RegionBoundary;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Region baseline
// ---------------------------------------------------------------------------

/// Baseline figures for a single region, indexed by sector.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBaseline {
    /// Official region code.
    pub key: RegionKey,
    /// Region name from the boundary dataset.
    pub name: String,
    /// Centroid of the region geometry.
    pub centroid: Point<f64>,
    /// Baseline value-added per sector.
    pub value_added: Vec<f64>,
    /// Baseline employment per sector.
    pub employment: Vec<f64>,
    /// Business count per sector.
    pub businesses: Vec<u64>,
    /// Share of the national value-added per sector.
    pub national_share: Vec<f64>,
    /// Whether each sector's figures were imputed.
    pub imputed: Vec<bool>,
}

impl RegionBaseline {
    /// Baseline value-added for `sector`, zero if out of range.
    pub fn value_added_of(&self, sector: usize) -> f64 {
        self.value_added.get(sector).copied().unwrap_or(0.0)
    }

    /// National share for `sector`, zero if out of range.
    pub fn share_of(&self, sector: usize) -> f64 {
        self.national_share.get(sector).copied().unwrap_or(0.0)
    }

    /// Total baseline value-added across sectors.
    pub fn total_value_added(&self) -> f64 {
        self.value_added.iter().sum()
    }

    /// Provenance of the region's figures.
    pub fn source(&self) -> BaselineSource {
        if self.imputed.iter().any(|i| *i) {
            BaselineSource::Imputed
        } else {
            BaselineSource::Observed
        }
    }
}

// ---------------------------------------------------------------------------
// Regional baseline
// ---------------------------------------------------------------------------

/// Per-region accumulator used while joining economic rows.
#[derive(Debug, Clone, Copy, Default)]
struct Observed {
    value_added: f64,
    employment: f64,
    businesses: u64,
}

/// The baseline of every region in the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalBaseline {
    /// Regions in boundary order.
    regions: Vec<RegionBaseline>,
    /// Region key -> position in `regions`.
    index: BTreeMap<RegionKey, usize>,
    /// National value-added per sector.
    national_value_added: Vec<f64>,
    /// Number of sectors.
    sector_count: usize,
    /// Regions whose data was imputed.
    substitutions: Vec<Substitution>,
}

impl RegionalBaseline {
    /// Join boundaries and economic records into a baseline.
    ///
    /// Records for regions outside the boundary set, for unknown sectors,
    /// or with negative or non-finite value-added are skipped with a
    /// warning. Several records for the same (region, sector) are summed.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidParameter`] if `sector_count` is zero.
    /// - [`EngineError::EmptyBaseline`] if there are no boundaries or no
    ///   usable economic record.
    /// - [`EngineError::DuplicateRegion`] if two boundaries share a key.
    /// - [`EngineError::MissingCentroid`] if a geometry has no centroid.
    pub fn build(
        boundaries: &[RegionBoundary],
        records: &[EconomicRecord],
        sector_count: usize,
    ) -> Result<Self, EngineError> {
        if sector_count == 0 {
            return Err(EngineError::InvalidParameter {
                name: "sector_count",
                reason: String::from("at least one sector is required"),
            });
        }
        if boundaries.is_empty() {
            return Err(EngineError::EmptyBaseline("no boundary regions"));
        }

        let mut index = BTreeMap::new();
        let mut centroids = Vec::with_capacity(boundaries.len());
        for (position, boundary) in boundaries.iter().enumerate() {
            if index.insert(boundary.key, position).is_some() {
                return Err(EngineError::DuplicateRegion(boundary.key));
            }
            let centroid = boundary
                .centroid()
                .ok_or(EngineError::MissingCentroid(boundary.key))?;
            centroids.push(centroid);
        }

        let observed = join_records(&index, records, sector_count);
        if observed.is_empty() {
            return Err(EngineError::EmptyBaseline(
                "no economic record matches a boundary region",
            ));
        }
        let medians = sector_medians(&observed, sector_count);

        let mut regions = Vec::with_capacity(boundaries.len());
        let mut substitutions = Vec::new();
        for (boundary, centroid) in boundaries.iter().zip(centroids) {
            let mut region = RegionBaseline {
                key: boundary.key,
                name: boundary.name.clone(),
                centroid,
                value_added: Vec::with_capacity(sector_count),
                employment: Vec::with_capacity(sector_count),
                businesses: Vec::with_capacity(sector_count),
                national_share: Vec::new(),
                imputed: Vec::with_capacity(sector_count),
            };
            let mut missing = Vec::new();
            for (sector, median) in medians.iter().enumerate() {
                let (figures, imputed) = observed
                    .get(&(boundary.key, sector))
                    .map_or((*median, true), |o| (*o, false));
                region.value_added.push(figures.value_added);
                region.employment.push(figures.employment);
                region.businesses.push(figures.businesses);
                region.imputed.push(imputed);
                if imputed {
                    if let Ok(id) = u16::try_from(sector) {
                        missing.push(SectorId(id));
                    }
                }
            }
            if !missing.is_empty() {
                warn!(
                    region = %boundary.key,
                    name = boundary.name,
                    sectors = missing.len(),
                    "No economic data for region, using cross-region median"
                );
                substitutions.push(Substitution {
                    region: boundary.key,
                    name: boundary.name.clone(),
                    sectors: missing,
                });
            }
            regions.push(region);
        }

        let national_value_added: Vec<f64> = (0..sector_count)
            .map(|s| regions.iter().map(|r| r.value_added_of(s)).sum())
            .collect();
        for region in &mut regions {
            region.national_share = national_value_added
                .iter()
                .enumerate()
                .map(|(s, total)| {
                    if *total > 0.0 {
                        region.value_added_of(s) / total
                    } else {
                        0.0
                    }
                })
                .collect();
        }

        info!(
            regions = regions.len(),
            sectors = sector_count,
            substituted = substitutions.len(),
            "Regional baseline built"
        );

        Ok(Self {
            regions,
            index,
            national_value_added,
            sector_count,
            substitutions,
        })
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the baseline has no regions. Always `false` for a built baseline.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of sectors.
    pub const fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// All regions, in boundary order.
    pub fn regions(&self) -> &[RegionBaseline] {
        &self.regions
    }

    /// Look up a region by key.
    pub fn region(&self, key: RegionKey) -> Option<&RegionBaseline> {
        self.index.get(&key).and_then(|i| self.regions.get(*i))
    }

    /// Position of a region in [`RegionalBaseline::regions`].
    pub fn position(&self, key: RegionKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Look up a region by name, ignoring surrounding whitespace and case.
    ///
    /// This exists for callers that only have legacy name strings. Joins
    /// inside the engine always use [`RegionKey`].
    pub fn find_by_name(&self, name: &str) -> Option<&RegionBaseline> {
        let wanted = name.trim().to_lowercase();
        self.regions
            .iter()
            .find(|r| r.name.trim().to_lowercase() == wanted)
    }

    /// National value-added per sector.
    pub fn national_value_added(&self) -> &[f64] {
        &self.national_value_added
    }

    /// Sum of the national shares of `sector` over every region.
    pub fn share_total(&self, sector: usize) -> f64 {
        self.regions.iter().map(|r| r.share_of(sector)).sum()
    }

    /// Regions whose figures were partly or wholly imputed.
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// Display profile of a region.
    pub fn profile(&self, key: RegionKey) -> Option<RegionProfile> {
        let region = self.region(key)?;
        let sectors = (0..self.sector_count)
            .filter_map(|s| {
                let id = SectorId(u16::try_from(s).ok()?);
                Some(SectorBaseline {
                    sector: id,
                    value_added: region.value_added_of(s),
                    employment: region.employment.get(s).copied().unwrap_or(0.0),
                    businesses: region.businesses.get(s).copied().unwrap_or(0),
                    national_share: region.share_of(s),
                    imputed: region.imputed.get(s).copied().unwrap_or(false),
                })
            })
            .collect();
        Some(RegionProfile {
            region: region.key,
            name: region.name.clone(),
            centroid: (region.centroid.x(), region.centroid.y()),
            sectors,
            source: region.source(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sum usable economic records per (region, sector).
fn join_records(
    index: &BTreeMap<RegionKey, usize>,
    records: &[EconomicRecord],
    sector_count: usize,
) -> BTreeMap<(RegionKey, usize), Observed> {
    let mut observed: BTreeMap<(RegionKey, usize), Observed> = BTreeMap::new();
    let mut skipped: usize = 0;

    for record in records {
        let sector = record.sector.index();
        if sector >= sector_count {
            warn!(region = %record.region, sector = %record.sector, "Skipping record for unknown sector");
            skipped = skipped.saturating_add(1);
            continue;
        }
        if !index.contains_key(&record.region) {
            debug!(region = %record.region, "Skipping record for region outside boundary data");
            skipped = skipped.saturating_add(1);
            continue;
        }
        if !record.value_added.is_finite() || record.value_added < 0.0 {
            warn!(
                region = %record.region,
                sector = %record.sector,
                value_added = record.value_added,
                "Skipping record with invalid value-added"
            );
            skipped = skipped.saturating_add(1);
            continue;
        }
        let employment = if record.employment.is_finite() && record.employment >= 0.0 {
            record.employment
        } else {
            0.0
        };

        let entry = observed.entry((record.region, sector)).or_default();
        entry.value_added += record.value_added;
        entry.employment += employment;
        entry.businesses = entry.businesses.saturating_add(record.businesses);
    }

    if skipped > 0 {
        warn!(skipped, "Economic records skipped while joining baseline");
    }
    observed
}

/// Per-sector median of the observed figures.
fn sector_medians(
    observed: &BTreeMap<(RegionKey, usize), Observed>,
    sector_count: usize,
) -> Vec<Observed> {
    (0..sector_count)
        .map(|sector| {
            let rows: Vec<&Observed> = observed
                .iter()
                .filter(|((_, s), _)| *s == sector)
                .map(|(_, o)| o)
                .collect();
            let businesses: Vec<f64> = rows.iter().map(|o| u64_to_f64(o.businesses)).collect();
            Observed {
                value_added: median(rows.iter().map(|o| o.value_added).collect()),
                employment: median(rows.iter().map(|o| o.employment).collect()),
                businesses: f64_to_u64(median(businesses)),
            }
        })
        .collect()
}

/// Median of a sample; zero for an empty sample.
pub(crate) fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        let lower = values.get(mid.saturating_sub(1)).copied().unwrap_or(0.0);
        let upper = values.get(mid).copied().unwrap_or(0.0);
        (lower + upper) / 2.0
    } else {
        values.get(mid).copied().unwrap_or(0.0)
    }
}

#[allow(clippy::cast_precision_loss)]
const fn u64_to_f64(value: u64) -> f64 {
    value as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn f64_to_u64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn record(region: u32, sector: u16, value_added: f64) -> EconomicRecord {
        EconomicRecord {
            region: RegionKey(region),
            sector: SectorId(sector),
            value_added,
            employment: value_added * 20.0,
            businesses: 10,
        }
    }

    fn three_regions() -> Vec<RegionBoundary> {
        vec![
            RegionBoundary::from_point(RegionKey(1), "Alpha", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(2), "Beta", 1.0, 0.0),
            RegionBoundary::from_point(RegionKey(3), "Gamma", 0.0, 2.0),
        ]
    }

    #[test]
    fn shares_sum_to_one_per_sector() {
        let records = vec![
            record(1, 0, 10.0),
            record(2, 0, 30.0),
            record(3, 0, 60.0),
            record(1, 1, 5.0),
            record(2, 1, 5.0),
            record(3, 1, 0.5),
        ];
        let baseline = RegionalBaseline::build(&three_regions(), &records, 2).unwrap();
        for sector in 0..2 {
            assert!((baseline.share_total(sector) - 1.0).abs() < 1e-9);
        }
        let beta = baseline.region(RegionKey(2)).unwrap();
        assert!((beta.share_of(0) - 0.3).abs() < 1e-12);
        assert!(baseline.substitutions().is_empty());
    }

    #[test]
    fn missing_region_gets_median() {
        let records = vec![record(1, 0, 10.0), record(2, 0, 30.0)];
        let baseline = RegionalBaseline::build(&three_regions(), &records, 1).unwrap();
        let gamma = baseline.region(RegionKey(3)).unwrap();
        assert!((gamma.value_added[0] - 20.0).abs() < 1e-12);
        assert_eq!(gamma.source(), BaselineSource::Imputed);
        assert_eq!(baseline.substitutions().len(), 1);
        assert_eq!(baseline.substitutions()[0].region, RegionKey(3));
        assert_eq!(baseline.substitutions()[0].sectors, vec![SectorId(0)]);
    }

    #[test]
    fn duplicate_records_are_summed() {
        let records = vec![record(1, 0, 10.0), record(1, 0, 15.0), record(2, 0, 25.0)];
        let baseline = RegionalBaseline::build(&three_regions()[..2], &records, 1).unwrap();
        let alpha = baseline.region(RegionKey(1)).unwrap();
        assert!((alpha.value_added[0] - 25.0).abs() < 1e-12);
        assert_eq!(alpha.businesses[0], 20);
        assert!((alpha.share_of(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_records_are_skipped() {
        let records = vec![
            record(1, 0, 10.0),
            record(2, 0, -5.0),
            record(2, 0, f64::NAN),
            record(9, 0, 100.0),
            record(1, 7, 100.0),
        ];
        let baseline = RegionalBaseline::build(&three_regions()[..2], &records, 1).unwrap();
        // Beta had only invalid rows, so it gets the median of the valid ones.
        let beta = baseline.region(RegionKey(2)).unwrap();
        assert!((beta.value_added[0] - 10.0).abs() < 1e-12);
        assert_eq!(baseline.len(), 2);
    }

    #[test]
    fn zero_sector_has_zero_shares() {
        let records = vec![record(1, 0, 10.0), record(1, 1, 0.0), record(2, 1, 0.0)];
        let baseline = RegionalBaseline::build(&three_regions()[..2], &records, 2).unwrap();
        assert!(baseline.share_total(1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_inputs_are_fatal() {
        assert!(matches!(
            RegionalBaseline::build(&[], &[record(1, 0, 1.0)], 1),
            Err(EngineError::EmptyBaseline(_))
        ));
        assert!(matches!(
            RegionalBaseline::build(&three_regions(), &[], 1),
            Err(EngineError::EmptyBaseline(_))
        ));
        assert!(matches!(
            RegionalBaseline::build(&three_regions(), &[record(1, 0, 1.0)], 0),
            Err(EngineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn duplicate_boundary_is_fatal() {
        let boundaries = vec![
            RegionBoundary::from_point(RegionKey(1), "A", 0.0, 0.0),
            RegionBoundary::from_point(RegionKey(1), "B", 1.0, 0.0),
        ];
        assert!(matches!(
            RegionalBaseline::build(&boundaries, &[record(1, 0, 1.0)], 1),
            Err(EngineError::DuplicateRegion(RegionKey(1)))
        ));
    }

    #[test]
    fn empty_geometry_has_no_centroid() {
        let boundaries = vec![RegionBoundary::new(
            RegionKey(4),
            "Empty",
            geo::Geometry::MultiPoint(geo::MultiPoint::new(Vec::new())),
        )];
        assert!(matches!(
            RegionalBaseline::build(&boundaries, &[record(4, 0, 1.0)], 1),
            Err(EngineError::MissingCentroid(RegionKey(4)))
        ));
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let records = vec![record(1, 0, 10.0)];
        let baseline = RegionalBaseline::build(&three_regions(), &records, 1).unwrap();
        assert_eq!(baseline.find_by_name("  beta ").map(|r| r.key), Some(RegionKey(2)));
        assert!(baseline.find_by_name("Delta").is_none());
    }

    #[test]
    fn profile_reports_sector_figures() {
        let records = vec![record(1, 0, 10.0), record(2, 0, 30.0), record(1, 1, 4.0)];
        let baseline = RegionalBaseline::build(&three_regions()[..2], &records, 2).unwrap();
        let profile = baseline.profile(RegionKey(1)).unwrap();
        assert_eq!(profile.sectors.len(), 2);
        assert!((profile.total_value_added() - 14.0).abs() < 1e-12);
        assert!((profile.total_employment() - 280.0).abs() < 1e-9);
        assert!((baseline.national_value_added()[0] - 40.0).abs() < 1e-12);
        assert!((profile.sectors[0].national_share - 0.25).abs() < 1e-12);
        assert_eq!(profile.source, BaselineSource::Observed);
        let beta = baseline.profile(RegionKey(2)).unwrap();
        assert!(beta.sectors[1].imputed);
    }

    #[test]
    fn median_of_even_and_odd_samples() {
        assert!((median(vec![3.0, 1.0, 2.0]) - 2.0).abs() < f64::EPSILON);
        assert!((median(vec![4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < f64::EPSILON);
        assert!(median(Vec::new()).abs() < f64::EPSILON);
    }
}
