//! # Cell Readout Validation
//!
//! Validation of a detector-readout identifier scheme: packed 64-bit cell
//! identifiers, the bidirectional mapping between identifiers and spatial
//! positions, and identity-based aggregation of per-particle energy
//! contributions.
//!
//! ## Components
//!
//! - [`bitfield`] / [`idspec`] — named-field bit packing: a [`FieldLayout`]
//!   per field, an [`IdentifierSpec`] per readout subsystem, with the
//!   contract `decode(encode(v)) == v` for every in-range assignment and
//!   strict rejection (never truncation) of out-of-range values.
//! - [`converter`] — [`PositionCellConverter`] over a [`SpatialIndex`]
//!   geometry collaborator: point → enclosing cell identifier, identifier →
//!   representative cell position, and the round-trip distance the harness
//!   bounds.
//! - [`aggregate`] — forward/reverse dual-map collapse of hit contributions
//!   into per-particle totals, with an explicit consistency check between
//!   the two identity views.
//! - [`event`] — the sequential per-event validation loop, folding every
//!   check into [`stats::ReadoutStats`].
//! - [`grid`] — a uniform layered-grid [`SpatialIndex`] used by the demo
//!   binary and the integration tests.
//!
//! ## Units
//!
//! Positions are millimeters, energies GeV (histogrammed in MeV), matching
//! the simulation output the validator consumes.

pub mod aggregate;
pub mod bitfield;
pub mod converter;
pub mod error;
pub mod event;
pub mod geometry;
pub mod grid;
pub mod idspec;
pub mod stats;

#[cfg(test)]
mod tests;

pub use aggregate::{AggregationResult, Contribution, ObjectKey, ParticleId, ParticleRef};
pub use bitfield::FieldLayout;
pub use converter::{PositionCellConverter, RegionHandle, SpatialIndex};
pub use error::ReadoutError;
pub use event::{EventLoop, EventSource, Hit, RunSummary, ValidationConfig};
pub use geometry::Position;
pub use grid::{GridConfig, GridIndex};
pub use idspec::{FieldHandle, IdentifierSpec};
pub use stats::{Histogram, ReadoutStats};

/// Crate-wide result type
pub type ReadoutResult<T> = Result<T, ReadoutError>;
