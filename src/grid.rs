//! Uniform layered-grid geometry
//!
//! A concrete [`SpatialIndex`] for a box calorimeter read out as a stack of
//! layers, each layer a uniform row/column grid of cells. This is the
//! geometry the demo binary and the integration tests run against; the
//! converter never depends on its internals.
//!
//! Cells are addressed through an [`IdentifierSpec`] with at least the
//! fields `system`, `section`, `layer`, `row` and `column`. Any further
//! fields (sub-cell coordinates such as `x`/`y`) stay zero in canonical cell
//! identifiers; identifiers carrying non-zero sub-cell bits still resolve to
//! their enclosing cell.

use crate::converter::{RegionHandle, SpatialIndex};
use crate::geometry::Position;
use crate::idspec::{FieldHandle, IdentifierSpec};
use crate::ReadoutResult;
use serde::{Deserialize, Serialize};

/// Encoding string of the CZT calorimeter readout
pub const CZT_ENCODING: &str = "system:8,section:8,layer:8,row:8,column:8,x:-8,y:-8";

/// Geometry parameters of one layered grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Value of the `system` field for every cell of this grid
    pub system: i64,
    /// Value of the `section` field for every cell of this grid
    pub section: i64,
    /// Number of layers stacked along z
    pub layers: u32,
    /// Rows per layer (y direction)
    pub rows: u32,
    /// Columns per layer (x direction)
    pub columns: u32,
    /// Cell pitch in x and y, millimeters
    pub cell_pitch: f64,
    /// Layer thickness in z, millimeters
    pub layer_thickness: f64,
    /// Low corner of the instrumented volume, millimeters
    pub origin: Position,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            system: 2,
            section: 1,
            layers: 4,
            rows: 32,
            columns: 32,
            cell_pitch: 10.0,
            layer_thickness: 5.0,
            origin: Position::new(-160.0, -160.0, 100.0),
        }
    }
}

impl GridConfig {
    /// Largest possible distance between a point in a cell and the cell
    /// center: half the cell diagonal
    pub fn half_diagonal(&self) -> f64 {
        let dx = self.cell_pitch;
        let dz = self.layer_thickness;
        0.5 * (dx * dx + dx * dx + dz * dz).sqrt()
    }
}

/// Layered uniform grid implementing [`SpatialIndex`]
#[derive(Debug)]
pub struct GridIndex {
    spec: IdentifierSpec,
    config: GridConfig,
    h_system: FieldHandle,
    h_section: FieldHandle,
    h_layer: FieldHandle,
    h_row: FieldHandle,
    h_column: FieldHandle,
}

impl GridIndex {
    /// Build a grid over an identifier spec
    ///
    /// Field handles are resolved once here; a spec missing any of the grid
    /// fields fails with `UnknownField` at construction.
    pub fn new(spec: IdentifierSpec, config: GridConfig) -> ReadoutResult<Self> {
        let h_system = spec.handle("system")?;
        let h_section = spec.handle("section")?;
        let h_layer = spec.handle("layer")?;
        let h_row = spec.handle("row")?;
        let h_column = spec.handle("column")?;
        Ok(Self {
            spec,
            config,
            h_system,
            h_section,
            h_layer,
            h_row,
            h_column,
        })
    }

    /// Default CZT-style grid: parses [`CZT_ENCODING`] with the default
    /// geometry parameters
    pub fn czt() -> ReadoutResult<Self> {
        let spec = IdentifierSpec::parse("CztHits", CZT_ENCODING)?;
        Self::new(spec, GridConfig::default())
    }

    /// The identifier spec this grid encodes cells with
    pub fn spec(&self) -> &IdentifierSpec {
        &self.spec
    }

    /// Geometry parameters
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Canonical identifier of one cell (sub-cell fields zero)
    pub fn cell_identifier(&self, layer: i64, row: i64, column: i64) -> ReadoutResult<u64> {
        let mut id = 0u64;
        self.spec.set(&mut id, self.h_system, self.config.system)?;
        self.spec.set(&mut id, self.h_section, self.config.section)?;
        self.spec.set(&mut id, self.h_layer, layer)?;
        self.spec.set(&mut id, self.h_row, row)?;
        self.spec.set(&mut id, self.h_column, column)?;
        Ok(id)
    }

    /// Center of one cell, millimeters
    pub fn cell_center(&self, layer: i64, row: i64, column: i64) -> Position {
        let c = &self.config;
        Position::new(
            c.origin.x + (column as f64 + 0.5) * c.cell_pitch,
            c.origin.y + (row as f64 + 0.5) * c.cell_pitch,
            c.origin.z + (layer as f64 + 0.5) * c.layer_thickness,
        )
    }

    fn bin(value: f64, pitch: f64, count: u32) -> Option<i64> {
        if value < 0.0 {
            return None;
        }
        let index = (value / pitch).floor() as i64;
        (index < count as i64).then_some(index)
    }
}

impl SpatialIndex for GridIndex {
    fn resolve(&self, point: &Position) -> Option<RegionHandle> {
        let c = &self.config;
        let column = Self::bin(point.x - c.origin.x, c.cell_pitch, c.columns)?;
        let row = Self::bin(point.y - c.origin.y, c.cell_pitch, c.rows)?;
        let layer = Self::bin(point.z - c.origin.z, c.layer_thickness, c.layers)?;
        self.cell_identifier(layer, row, column)
            .ok()
            .map(RegionHandle)
    }

    fn center(&self, region: RegionHandle) -> Position {
        let layer = self.spec.get(region.0, self.h_layer);
        let row = self.spec.get(region.0, self.h_row);
        let column = self.spec.get(region.0, self.h_column);
        self.cell_center(layer, row, column)
    }

    fn identifier(&self, region: RegionHandle) -> u64 {
        region.0
    }

    fn region_of(&self, id: u64) -> Option<RegionHandle> {
        let c = &self.config;
        if self.spec.get(id, self.h_system) != c.system
            || self.spec.get(id, self.h_section) != c.section
        {
            return None;
        }
        let layer = self.spec.get(id, self.h_layer);
        let row = self.spec.get(id, self.h_row);
        let column = self.spec.get(id, self.h_column);
        let in_bounds = (0..c.layers as i64).contains(&layer)
            && (0..c.rows as i64).contains(&row)
            && (0..c.columns as i64).contains(&column);
        if !in_bounds {
            return None;
        }
        // Canonicalize: sub-cell bits do not take part in region identity
        self.cell_identifier(layer, row, column)
            .ok()
            .map(RegionHandle)
    }
}
