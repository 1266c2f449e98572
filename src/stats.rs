//! Running summary statistics over readout validation
//!
//! Order-independent accumulators: every quantity is a histogram fill or a
//! counter increment, so the totals do not depend on event or hit order.
//! The set mirrors what the validation harness plots downstream:
//!
//! | Accumulator              | Quantity                                  |
//! |--------------------------|-------------------------------------------|
//! | `hit_energy`             | per-hit deposited energy, MeV             |
//! | `contribution_count`     | contributions per hit                     |
//! | `energy_residual`        | hit energy − summed contributions, GeV    |
//! | `distinct_particles`     | distinct contributing particles per hit   |
//! | `event_energy`           | summed hit energy per event, MeV          |
//! | `theta`, `phi`           | hit position angular coordinates          |

use serde::{Deserialize, Serialize};

/// Fixed-binning histogram with underflow/overflow tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    /// Lower edge of the first bin
    pub min: f64,
    /// Upper edge of the last bin
    pub max: f64,
    /// Bin counts
    pub counts: Vec<u64>,
    /// Entries below the first bin
    pub underflow: u64,
    /// Entries at or above the last edge
    pub overflow: u64,
    /// Total entries, including under/overflow
    pub entries: u64,
    sum: f64,
    sum_sq: f64,
}

impl Histogram {
    /// Create a histogram with `bins` uniform bins over [min, max)
    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        assert!(bins > 0, "histogram needs at least one bin");
        assert!(max > min, "histogram range must be non-empty");
        Self {
            min,
            max,
            counts: vec![0; bins],
            underflow: 0,
            overflow: 0,
            entries: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Record one value
    pub fn fill(&mut self, value: f64) {
        self.entries += 1;
        self.sum += value;
        self.sum_sq += value * value;

        if value < self.min {
            self.underflow += 1;
        } else if value >= self.max {
            self.overflow += 1;
        } else {
            let width = (self.max - self.min) / self.counts.len() as f64;
            let bin = ((value - self.min) / width) as usize;
            // Floating-point edge rounding can land exactly on len()
            let bin = bin.min(self.counts.len() - 1);
            self.counts[bin] += 1;
        }
    }

    /// Mean over all entries, including under/overflow
    pub fn mean(&self) -> f64 {
        if self.entries > 0 {
            self.sum / self.entries as f64
        } else {
            0.0
        }
    }

    /// Standard deviation over all entries
    pub fn std(&self) -> f64 {
        if self.entries > 1 {
            let mean = self.mean();
            (self.sum_sq / self.entries as f64 - mean * mean).max(0.0).sqrt()
        } else {
            0.0
        }
    }

    /// Center of one bin
    pub fn bin_center(&self, bin: usize) -> f64 {
        let width = (self.max - self.min) / self.counts.len() as f64;
        self.min + (bin as f64 + 0.5) * width
    }
}

/// Full accumulator set plus soft-failure counters for one validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadoutStats {
    pub hit_energy: Histogram,
    pub contribution_count: Histogram,
    pub energy_residual: Histogram,
    pub distinct_particles: Histogram,
    pub event_energy: Histogram,
    pub theta: Histogram,
    pub phi: Histogram,
    /// Points or identifiers the geometry could not resolve
    pub region_misses: u64,
    /// Recorded identifiers disagreeing with the position-derived ones
    pub id_mismatches: u64,
    /// Round-trip distances exceeding the configured tolerance
    pub round_trip_failures: u64,
    /// Forward/reverse aggregation disagreements
    pub distinctness_mismatches: u64,
    /// Energy-balance residuals beyond the configured tolerance
    pub energy_imbalances: u64,
}

impl Default for ReadoutStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadoutStats {
    /// Accumulator set with the harness's binning conventions
    pub fn new() -> Self {
        Self {
            hit_energy: Histogram::new(-10.0, 40.0, 500),
            contribution_count: Histogram::new(-0.5, 99.5, 100),
            energy_residual: Histogram::new(-4.5, 5.5, 100),
            distinct_particles: Histogram::new(-0.5, 99.5, 100),
            event_energy: Histogram::new(0.0, 50.0, 500),
            theta: Histogram::new(0.0, 4.0, 100),
            phi: Histogram::new(-4.0, 4.0, 100),
            region_misses: 0,
            id_mismatches: 0,
            round_trip_failures: 0,
            distinctness_mismatches: 0,
            energy_imbalances: 0,
        }
    }

    /// Total soft failures of any kind
    pub fn total_failures(&self) -> u64 {
        self.region_misses
            + self.id_mismatches
            + self.round_trip_failures
            + self.distinctness_mismatches
            + self.energy_imbalances
    }

    /// Whether the run saw no inconsistency at all
    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }

    /// JSON rendering for the surrounding harness
    pub fn to_json(&self) -> crate::ReadoutResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::ReadoutError::SerializationError(e.to_string()))
    }

    /// Human-readable report
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("─── Readout Validation Statistics ───\n");
        out.push_str(&format!(
            "  hit energy        : {} entries, mean {:.3} MeV (σ {:.3})\n",
            self.hit_energy.entries,
            self.hit_energy.mean(),
            self.hit_energy.std()
        ));
        out.push_str(&format!(
            "  contributions/hit : mean {:.2}\n",
            self.contribution_count.mean()
        ));
        out.push_str(&format!(
            "  distinct mc/hit   : mean {:.2}\n",
            self.distinct_particles.mean()
        ));
        out.push_str(&format!(
            "  energy residual   : mean {:+.3e} GeV (σ {:.3e})\n",
            self.energy_residual.mean(),
            self.energy_residual.std()
        ));
        out.push_str(&format!(
            "  event energy      : {} entries, mean {:.3} MeV\n",
            self.event_energy.entries,
            self.event_energy.mean()
        ));
        out.push_str(&format!(
            "  failures          : {} region miss, {} id mismatch, {} round-trip, \
             {} distinctness, {} imbalance\n",
            self.region_misses,
            self.id_mismatches,
            self.round_trip_failures,
            self.distinctness_mismatches,
            self.energy_imbalances
        ));
        out
    }
}
