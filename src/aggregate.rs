//! Identity-based aggregation of hit contributions
//!
//! One calorimeter hit carries many contributions, several of which may come
//! from the same simulated particle. Aggregation collapses them into
//! per-identity totals using two independently built lookup structures:
//!
//! - a forward map keyed by the particle's stable per-event identity, and
//! - a reverse map keyed by the particle's object identity in the source
//!   collection.
//!
//! The two views must agree on the number of distinct particles. A
//! disagreement means the upstream identity representation is inconsistent
//! (two identity keys naming one object, or one key naming two); the
//! aggregator surfaces it and keeps the forward map authoritative, it never
//! reconciles silently.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Stable per-event identity of one simulated particle
///
/// Unique within one event, not across events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

/// Object identity of a particle in its source collection
///
/// The independent second view used to cross-check [`ParticleId`]: which
/// collection the particle record lives in, and at which index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub collection: u32,
    pub index: u32,
}

/// Reference to one particle, carrying both identity views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleRef {
    pub id: ParticleId,
    pub key: ObjectKey,
}

/// One particle's partial energy deposit within a single hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Contribution {
    pub particle: ParticleRef,
    /// Deposited energy, GeV; non-negative
    pub energy: f64,
}

/// Accumulated record for one distinct particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    /// Object key of the first contribution seen for this identity
    pub key: ObjectKey,
    /// Number of contributions from this identity
    pub count: u32,
    /// Energy summed over this identity's contributions, GeV
    pub energy: f64,
}

/// Result of one aggregation pass over a hit's contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Per-identity totals, forward-map view (authoritative)
    pub by_identity: HashMap<ParticleId, ParticleRecord>,
    /// Energy summed over every contribution, GeV, independent of dedup
    pub total_energy: f64,
    /// Forward/reverse map sizes when they disagree; `None` when consistent
    pub mismatch: Option<(usize, usize)>,
}

impl AggregationResult {
    /// Single-pass aggregation of a contribution sequence
    pub fn from_contributions(contributions: &[Contribution]) -> Self {
        let mut forward: HashMap<ParticleId, ParticleRecord> = HashMap::new();
        let mut reverse: HashMap<ObjectKey, ParticleId> = HashMap::new();
        let mut total_energy = 0.0;

        for contribution in contributions {
            total_energy += contribution.energy;
            match forward.entry(contribution.particle.id) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    record.count += 1;
                    record.energy += contribution.energy;
                }
                Entry::Vacant(entry) => {
                    entry.insert(ParticleRecord {
                        key: contribution.particle.key,
                        count: 1,
                        energy: contribution.energy,
                    });
                }
            }
            reverse
                .entry(contribution.particle.key)
                .or_insert(contribution.particle.id);
        }

        let mismatch = if forward.len() != reverse.len() {
            log::warn!(
                "distinct-particle views disagree: forward {} entries, reverse {}",
                forward.len(),
                reverse.len()
            );
            Some((forward.len(), reverse.len()))
        } else {
            None
        };

        Self {
            by_identity: forward,
            total_energy,
            mismatch,
        }
    }

    /// Number of distinct particles, from the authoritative forward map
    pub fn distinct(&self) -> usize {
        self.by_identity.len()
    }

    /// Energy summed per distinct identity, GeV
    ///
    /// Kept separate from [`total_energy`](Self::total_energy): the two only
    /// coincide when the identity views are consistent, and the energy
    /// balance check deliberately uses the dedup-independent total.
    pub fn distinct_energy(&self) -> f64 {
        self.by_identity.values().map(|r| r.energy).sum()
    }
}
