//! Cell Readout Validation Demo
//!
//! Walks through the validation chain end to end:
//! - parse an identifier spec from its encoding string
//! - build a cell identifier field by field and in one bulk encode
//! - convert positions to identifiers and back over a layered grid
//! - aggregate synthetic hit contributions
//! - run the event loop over generated events and print the statistics

use cell_readout::{
    AggregationResult, Contribution, EventLoop, EventSource, GridIndex, Hit, ObjectKey,
    ParticleId, ParticleRef, Position, PositionCellConverter, ReadoutResult, ValidationConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> ReadoutResult<()> {
    env_logger::init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Cell Readout Validation — identifier & geometry checks      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let grid = GridIndex::czt()?;

    demo_identifier_spec(&grid)?;
    demo_conversion(&grid)?;
    demo_aggregation();
    demo_event_loop()?;

    println!("\n✓ All demonstrations completed");
    Ok(())
}

fn demo_identifier_spec(grid: &GridIndex) -> ReadoutResult<()> {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  1. IDENTIFIER SPEC");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let spec = grid.spec();
    println!("encoding string : {}", spec.descriptor());

    // Build the same identifier two ways
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
        spec.set_by_name(&mut tid, name, *value)?;
    }
    let tid2 = spec.encode(&assignment)?;
    println!("field-by-field  : {:#018x}", tid);
    println!("bulk encode     : {:#018x}", tid2);
    println!("decoded         : {}\n", spec.value_string(tid));
    assert_eq!(tid, tid2);
    Ok(())
}

fn demo_conversion(grid: &GridIndex) -> ReadoutResult<()> {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  2. POSITION ↔ IDENTIFIER");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let center = grid.cell_center(2, 13, 14);
    let conv = PositionCellConverter::new(GridIndex::czt()?);

    let id = conv.cell_id(&center)?;
    let back = conv.position(id)?;
    println!("point           : {}", center);
    println!("cell id         : {}", conv.index().spec().value_string(id));
    println!("reconstructed   : {}", back);
    println!("round trip      : {:.6} mm", center.distance(&back));

    let off_center = Position::new(center.x + 3.2, center.y - 1.1, center.z + 0.9);
    println!(
        "off-center trip : {:.4} mm (bound {:.4} mm)\n",
        conv.round_trip_distance(&off_center)?,
        conv.index().config().half_diagonal()
    );
    Ok(())
}

fn demo_aggregation() {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  3. CONTRIBUTION AGGREGATION");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let particle = |id: u32| ParticleRef {
        id: ParticleId(id),
        key: ObjectKey {
            collection: 1,
            index: id,
        },
    };
    let contributions = vec![
        Contribution { particle: particle(1), energy: 1.0 },
        Contribution { particle: particle(1), energy: 0.5 },
        Contribution { particle: particle(2), energy: 2.0 },
    ];
    let result = AggregationResult::from_contributions(&contributions);
    println!("contributions   : {}", contributions.len());
    println!("distinct        : {}", result.distinct());
    println!("total energy    : {} GeV", result.total_energy);
    println!("views agree     : {}\n", result.mismatch.is_none());
}

/// Synthetic event source: random cells, random contribution splits, with
/// identifiers and positions generated consistently from the grid
struct SyntheticSource {
    grid: GridIndex,
    rng: StdRng,
    events: usize,
}

impl EventSource for SyntheticSource {
    fn entry_count(&self) -> usize {
        self.events
    }

    fn hits_for(&mut self, _event: usize) -> ReadoutResult<Vec<Hit>> {
        let n_hits = self.rng.gen_range(1..=8);
        let mut hits = Vec::with_capacity(n_hits);
        for _ in 0..n_hits {
            let c = self.grid.config();
            let layer = self.rng.gen_range(0..c.layers) as i64;
            let row = self.rng.gen_range(0..c.rows) as i64;
            let column = self.rng.gen_range(0..c.columns) as i64;

            let n_contrib = self.rng.gen_range(1..20);
            let n_particles = self.rng.gen_range(1..=n_contrib);
            let contributions: Vec<Contribution> = (0..n_contrib)
                .map(|j| {
                    let pid = (j % n_particles) as u32;
                    Contribution {
                        particle: ParticleRef {
                            id: ParticleId(pid),
                            key: ObjectKey { collection: 1, index: pid },
                        },
                        energy: self.rng.gen_range(1e-5..5e-3),
                    }
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

fn demo_event_loop() -> ReadoutResult<()> {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  4. EVENT LOOP");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let mut source = SyntheticSource {
        grid: GridIndex::czt()?,
        rng: StdRng::seed_from_u64(987654321),
        events: 500,
    };
    let lp = EventLoop::new(
        PositionCellConverter::new(GridIndex::czt()?),
        ValidationConfig::default(),
    );

    let summary = lp.run(&mut source)?;
    println!("{}", summary.summary());
    Ok(())
}
