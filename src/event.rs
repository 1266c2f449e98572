//! Sequential event-processing loop
//!
//! Pulls one event at a time from an [`EventSource`], and for every hit:
//! recomputes the cell identifier from the hit position and compares it with
//! the recorded one, bounds the identifier→position round trip, aggregates
//! the hit's contributions per particle identity, checks the energy balance,
//! and folds everything into [`ReadoutStats`].
//!
//! Geometry misses, identifier mismatches and aggregation inconsistencies
//! are soft: they are logged and counted, and the loop moves on. Codec-level
//! failures are hard contract violations and abort the run. All per-event
//! state is dropped before the next event is fetched; the loop is strictly
//! single-threaded and single-pass.

use crate::aggregate::{AggregationResult, Contribution};
use crate::converter::{PositionCellConverter, SpatialIndex};
use crate::geometry::Position;
use crate::stats::ReadoutStats;
use crate::ReadoutResult;

/// One calorimeter hit as delivered by the event source
#[derive(Debug, Clone)]
pub struct Hit {
    /// Packed cell identifier recorded with the hit
    pub cell_id: u64,
    /// Hit position, millimeters
    pub position: Position,
    /// Total deposited energy reported by the hit, GeV
    pub energy: f64,
    /// Per-particle partial deposits, ordered as produced
    pub contributions: Vec<Contribution>,
}

/// Source of hit collections, one event at a time
///
/// A synchronous pull interface; the loop never asks for more than one event
/// ahead.
pub trait EventSource {
    /// Number of events available
    fn entry_count(&self) -> usize;

    /// Hits of one event
    fn hits_for(&mut self, event: usize) -> ReadoutResult<Vec<Hit>>;
}

/// Tolerances and reporting cadence of one validation run
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Round-trip distance bound, millimeters. Reflects the cell-center
    /// approximation of the geometry in use, not exact inversion.
    pub tolerance_mm: f64,
    /// Allowed |hit energy − summed contributions|, GeV; covers
    /// floating-point accumulation only
    pub energy_balance_tolerance: f64,
    /// Progress log interval, in events
    pub log_every: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance_mm: 1e-3,
            energy_balance_tolerance: 1e-9,
            log_every: 100,
        }
    }
}

/// Totals of one completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub events: usize,
    pub hits: usize,
    pub stats: ReadoutStats,
}

impl RunSummary {
    /// Human-readable report
    pub fn summary(&self) -> String {
        format!(
            "processed {} events, {} hits\n{}",
            self.events,
            self.hits,
            self.stats.summary()
        )
    }
}

/// The validation loop over one converter and one event source
#[derive(Debug)]
pub struct EventLoop<I> {
    converter: PositionCellConverter<I>,
    config: ValidationConfig,
}

impl<I: SpatialIndex> EventLoop<I> {
    pub fn new(converter: PositionCellConverter<I>, config: ValidationConfig) -> Self {
        Self { converter, config }
    }

    /// The converter driving identifier/position checks
    pub fn converter(&self) -> &PositionCellConverter<I> {
        &self.converter
    }

    /// Run to completion over every event of the source
    pub fn run(&self, source: &mut dyn EventSource) -> ReadoutResult<RunSummary> {
        let mut stats = ReadoutStats::new();
        let mut total_hits = 0;
        let events = source.entry_count();

        for event in 0..events {
            if self.config.log_every > 0 && event % self.config.log_every == 0 {
                log::info!("reading event {}", event);
            }

            let hits = source.hits_for(event)?;
            total_hits += hits.len();
            let mut event_energy = 0.0;

            for hit in &hits {
                self.process_hit(hit, &mut stats);
                event_energy += hit.energy;
            }
            if !hits.is_empty() {
                stats.event_energy.fill(1000.0 * event_energy);
            }
            // Per-event state (the hit collection) is dropped here, before
            // the next event is fetched.
        }

        Ok(RunSummary {
            events,
            hits: total_hits,
            stats,
        })
    }

    fn process_hit(&self, hit: &Hit, stats: &mut ReadoutStats) {
        stats.hit_energy.fill(1000.0 * hit.energy);
        stats.theta.fill(hit.position.theta());
        stats.phi.fill(hit.position.phi());

        // Recorded identifier must match the one derived from the position
        match self.converter.cell_id(&hit.position) {
            Ok(derived) if derived == hit.cell_id => {}
            Ok(derived) => {
                stats.id_mismatches += 1;
                log::warn!(
                    "cell id mismatch at {}: recorded {:#x}, derived {:#x}",
                    hit.position,
                    hit.cell_id,
                    derived
                );
            }
            Err(err) => {
                stats.region_misses += 1;
                log::warn!("cell id lookup failed: {}", err);
            }
        }

        // Identifier → position round trip, bounded by the configured
        // cell-center tolerance
        match self.converter.position(hit.cell_id) {
            Ok(center) => {
                let distance = hit.position.distance(&center);
                if distance >= self.config.tolerance_mm {
                    stats.round_trip_failures += 1;
                    log::warn!(
                        "round trip {:.6} mm exceeds tolerance {:.6} mm for id {:#x}",
                        distance,
                        self.config.tolerance_mm,
                        hit.cell_id
                    );
                }
            }
            Err(err) => {
                stats.region_misses += 1;
                log::warn!("position lookup failed: {}", err);
            }
        }

        // Per-identity aggregation and energy balance
        let aggregated = AggregationResult::from_contributions(&hit.contributions);
        stats.contribution_count.fill(hit.contributions.len() as f64);
        stats.distinct_particles.fill(aggregated.distinct() as f64);

        let residual = hit.energy - aggregated.total_energy;
        stats.energy_residual.fill(residual);
        if residual.abs() > self.config.energy_balance_tolerance {
            stats.energy_imbalances += 1;
            log::warn!(
                "energy imbalance {:+.3e} GeV for id {:#x}",
                residual,
                hit.cell_id
            );
        }

        if aggregated.mismatch.is_some() {
            // Already logged by the aggregator; forward map stays
            // authoritative and processing continues.
            stats.distinctness_mismatches += 1;
        }
    }
}
