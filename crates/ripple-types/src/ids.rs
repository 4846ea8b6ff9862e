//! Type-safe identifier wrappers.
//!
//! Regions and sectors are keyed by small integers taken from the source
//! datasets: a [`RegionKey`] is the official numeric region code and a
//! [`SectorId`] is the row/column index of the sector in the technical
//! coefficient matrix. Simulation runs get a UUID v7 so results sort by
//! creation time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one simulation run and its result.
    SimulationId
}

/// Official numeric code of a region.
///
/// This is the join key between the boundary dataset and the economic
/// dataset. Codes are displayed zero-padded to six digits, matching the
/// statistical office's published format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionKey(pub u32);

impl RegionKey {
    /// Return the raw numeric code.
    pub const fn code(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

impl From<u32> for RegionKey {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

/// Index of a sector in the technical coefficient matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SectorId(pub u16);

impl SectorId {
    /// Return the matrix row/column index for this sector.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl core::fmt::Display for SectorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sector#{}", self.0)
    }
}

impl From<u16> for SectorId {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_ids_are_unique() {
        let a = SimulationId::new();
        let b = SimulationId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn region_key_display_is_zero_padded() {
        assert_eq!(RegionKey(3501).to_string(), "003501");
        assert_eq!(RegionKey(350_001).to_string(), "350001");
    }

    #[test]
    fn sector_id_maps_to_index() {
        assert_eq!(SectorId(3).index(), 3);
        assert_eq!(SectorId::from(0).index(), 0);
    }

    #[test]
    fn region_key_serializes_as_number() {
        let json = serde_json::to_string(&RegionKey(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }
}
