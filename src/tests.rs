//! Integration tests for cell readout validation
//!
//! Exercises the full chain the way the harness does: parse the encoding
//! string from collection metadata, build the geometry, convert positions
//! and identifiers both ways, aggregate contributions and run the event
//! loop end to end.

use crate::aggregate::{Contribution, ObjectKey, ParticleId, ParticleRef};
use crate::converter::PositionCellConverter;
use crate::event::{EventLoop, EventSource, Hit, ValidationConfig};
use crate::geometry::Position;
use crate::grid::{GridConfig, GridIndex, CZT_ENCODING};
use crate::idspec::IdentifierSpec;
use crate::ReadoutResult;

// ═══════════════════════════════════════════════════════════════════════════
// IDENTIFIER SPEC FROM COLLECTION METADATA
// ═══════════════════════════════════════════════════════════════════════════

mod metadata_tests {
    use super::*;

    #[test]
    fn test_encoding_string_reproduces_producer_semantics() {
        // The spec parsed from metadata must decode identifiers produced by
        // an identically configured spec, field for field.
        let producer = IdentifierSpec::parse("CztHits", CZT_ENCODING).unwrap();
        let consumer = IdentifierSpec::parse("CztHits", &producer.descriptor()).unwrap();

        let id = producer
            .encode(&[("system", 2), ("layer", 3), ("row", 13), ("x", -7)])
            .unwrap();
        assert_eq!(consumer.decode(id), producer.decode(id));
        assert_eq!(consumer.get_by_name(id, "x").unwrap(), -7);
    }

    #[test]
    fn test_target_id_built_two_ways() {
        // One field at a time versus one bulk encode call
        let spec = IdentifierSpec::parse("CztHits", CZT_ENCODING).unwrap();
        let assignment: Vec<(&str, i64)> = vec![
            ("system", 2),
            ("section", 1),
            ("layer", 0),
            ("row", 13),
            ("column", 14),
            ("x", 0),
            ("y", 0),
        ];

        let mut tid = 0u64;
        for (name, value) in &assignment {
            spec.set_by_name(&mut tid, name, *value).unwrap();
        }
        let tid2 = spec.encode(&assignment).unwrap();
        assert_eq!(tid, tid2, "compare target ids: {} - {}", tid, tid2);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// POSITION ↔ IDENTIFIER OVER REAL GEOMETRY
// ═══════════════════════════════════════════════════════════════════════════

mod conversion_tests {
    use super::*;

    #[test]
    fn test_every_cell_round_trips_to_its_own_center() {
        let grid = GridIndex::czt().unwrap();
        let conv = PositionCellConverter::new(grid);
        for layer in 0..4 {
            for row in [0i64, 15, 31] {
                for column in [0i64, 16, 31] {
                    let center = conv.index().cell_center(layer, row, column);
                    let id = conv.cell_id(&center).unwrap();
                    assert_eq!(id, conv.index().cell_identifier(layer, row, column).unwrap());
                    let back = conv.position(id).unwrap();
                    assert!(center.distance(&back) < 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_interior_points_stay_within_half_diagonal() {
        let grid = GridIndex::czt().unwrap();
        let bound = grid.config().half_diagonal();
        let conv = PositionCellConverter::new(grid);

        // Deterministic sample of off-center interior points
        for i in 0..50 {
            let t = i as f64 / 50.0;
            let p = Position::new(-159.9 + 319.0 * t, -159.9 + 300.0 * t * t, 100.1 + 19.0 * t);
            let d = conv.round_trip_distance(&p).unwrap();
            assert!(d < bound, "point {} distance {} bound {}", p, d, bound);
        }
    }

    #[test]
    fn test_repeated_conversion_is_bit_identical() {
        let grid = GridIndex::czt().unwrap();
        let conv = PositionCellConverter::new(grid);
        let p = Position::new(-12.3, 45.6, 107.8);
        let first = conv.cell_id(&p).unwrap();
        for _ in 0..10 {
            assert_eq!(conv.cell_id(&p).unwrap(), first);
        }
        let pos = conv.position(first).unwrap();
        assert_eq!(conv.position(first).unwrap(), pos);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

mod pipeline_tests {
    use super::*;

    /// Event source emitting hits whose identifiers, positions and energies
    /// are self-consistent, built straight from the grid geometry
    struct ConsistentSource<'a> {
        grid: &'a GridIndex,
        events: usize,
    }

    impl EventSource for ConsistentSource<'_> {
        fn entry_count(&self) -> usize {
            self.events
        }

        fn hits_for(&mut self, event: usize) -> ReadoutResult<Vec<Hit>> {
            let mut hits = Vec::new();
            for k in 0..3 {
                let layer = ((event + k) % 4) as i64;
                let row = ((event * 5 + k * 3) % 32) as i64;
                let column = ((event * 7 + k * 11) % 32) as i64;
                let contributions: Vec<Contribution> = (0..4)
                    .map(|j| Contribution {
                        particle: ParticleRef {
                            // Two of the four contributions share particle 0
                            id: ParticleId((j % 3) as u32),
                            key: ObjectKey {
                                collection: 1,
                                index: (j % 3) as u32,
                            },
                        },
                        energy: 0.25e-3 * (j + 1) as f64,
                    })
                    .collect();
                let energy = contributions.iter().map(|c| c.energy).sum();
                hits.push(Hit {
                    cell_id: self.grid.cell_identifier(layer, row, column)?,
                    position: self.grid.cell_center(layer, row, column),
                    energy,
                    contributions,
                });
            }
            Ok(hits)
        }
    }

    #[test]
    fn test_consistent_source_yields_a_clean_run() {
        let grid = GridIndex::czt().unwrap();
        let source_grid = GridIndex::czt().unwrap();
        let lp = EventLoop::new(
            PositionCellConverter::new(grid),
            ValidationConfig {
                log_every: 0,
                ..Default::default()
            },
        );
        let mut source = ConsistentSource {
            grid: &source_grid,
            events: 20,
        };

        let summary = lp.run(&mut source).unwrap();
        assert_eq!(summary.events, 20);
        assert_eq!(summary.hits, 60);
        assert!(summary.stats.is_clean(), "{}", summary.summary());

        // 4 contributions over 3 distinct particles, every hit
        assert!((summary.stats.contribution_count.mean() - 4.0).abs() < 1e-12);
        assert!((summary.stats.distinct_particles.mean() - 3.0).abs() < 1e-12);
        assert_eq!(summary.stats.event_energy.entries, 20);
    }

    #[test]
    fn test_run_summary_reports_totals() {
        let grid = GridIndex::czt().unwrap();
        let source_grid = GridIndex::czt().unwrap();
        let lp = EventLoop::new(
            PositionCellConverter::new(grid),
            ValidationConfig {
                log_every: 0,
                ..Default::default()
            },
        );
        let mut source = ConsistentSource {
            grid: &source_grid,
            events: 2,
        };
        let summary = lp.run(&mut source).unwrap();
        let text = summary.summary();
        assert!(text.contains("processed 2 events"));
        assert!(text.contains("6 hits"));
    }

    #[test]
    fn test_grid_with_custom_geometry() {
        // A one-layer fine-pitch grid behaves identically through the loop
        let spec = IdentifierSpec::parse("CztHits", CZT_ENCODING).unwrap();
        let config = GridConfig {
            layers: 1,
            rows: 8,
            columns: 8,
            cell_pitch: 2.0,
            layer_thickness: 1.0,
            origin: Position::new(-8.0, -8.0, 50.0),
            ..Default::default()
        };
        let grid = GridIndex::new(spec, config).unwrap();
        let conv = PositionCellConverter::new(grid);

        let p = Position::new(-7.5, 3.1, 50.4);
        let id = conv.cell_id(&p).unwrap();
        let spec = conv.index().spec();
        assert_eq!(spec.get_by_name(id, "column").unwrap(), 0);
        assert_eq!(spec.get_by_name(id, "row").unwrap(), 5);
        assert_eq!(spec.get_by_name(id, "layer").unwrap(), 0);
    }
}
