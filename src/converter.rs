//! Bidirectional mapping between positions and cell identifiers
//!
//! The converter composes an identifier layout with a [`SpatialIndex`], the
//! geometry collaborator that knows which region of the detector encloses a
//! point and which identifier addresses each region. Region resolution is
//! deliberately opaque here: the index may bin a uniform grid, walk a volume
//! hierarchy, or query an acceleration structure, and the converter contract
//! does not change.
//!
//! `position(cell_id(p))` is not exact inversion: the reconstructed point is
//! the region's representative (cell-center) position, so the round-trip
//! distance is bounded by the cell-center approximation, not zero. The
//! surrounding harness checks that bound; the converter itself only
//! guarantees determinism and totality over points inside the instrumented
//! volume.

use crate::error::ReadoutError;
use crate::geometry::Position;
use crate::ReadoutResult;

/// Opaque token for one detector region, minted and understood only by the
/// [`SpatialIndex`] that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(pub u64);

/// Geometry collaborator: point → region and region → identifier/center
///
/// Implementations must be deterministic; the converter relies on identical
/// inputs producing bit-identical outputs.
pub trait SpatialIndex {
    /// Region enclosing a point, or `None` outside the instrumented volume
    fn resolve(&self, point: &Position) -> Option<RegionHandle>;

    /// Representative position of a region (cell center)
    fn center(&self, region: RegionHandle) -> Position;

    /// Packed identifier addressing a region
    fn identifier(&self, region: RegionHandle) -> u64;

    /// Region addressed by an identifier, or `None` for an identifier no
    /// region answers to
    fn region_of(&self, id: u64) -> Option<RegionHandle>;
}

/// Position ↔ identifier converter over one spatial index
#[derive(Debug)]
pub struct PositionCellConverter<I> {
    index: I,
}

impl<I: SpatialIndex> PositionCellConverter<I> {
    pub fn new(index: I) -> Self {
        Self { index }
    }

    /// The underlying geometry collaborator
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Identifier of the cell enclosing a point
    ///
    /// Fails with `NoEnclosingRegion` for points outside the detector; the
    /// caller decides whether that is fatal (it is not, for the event loop).
    pub fn cell_id(&self, point: &Position) -> ReadoutResult<u64> {
        let region = self
            .index
            .resolve(point)
            .ok_or(ReadoutError::NoEnclosingRegion(*point))?;
        Ok(self.index.identifier(region))
    }

    /// Representative position of the cell behind an identifier
    pub fn position(&self, id: u64) -> ReadoutResult<Position> {
        let region = self
            .index
            .region_of(id)
            .ok_or(ReadoutError::UnknownIdentifier(id))?;
        Ok(self.index.center(region))
    }

    /// Distance between a point and the representative position of its cell
    ///
    /// The validation harness compares this against its configured
    /// cell-center tolerance.
    pub fn round_trip_distance(&self, point: &Position) -> ReadoutResult<f64> {
        let id = self.cell_id(point)?;
        let center = self.position(id)?;
        Ok(point.distance(&center))
    }
}
