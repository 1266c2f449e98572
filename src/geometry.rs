//! Spatial positions in the detector frame
//!
//! All lengths are millimeters, matching the hit positions delivered by the
//! event source. The converter itself is unit-agnostic as long as producer
//! and consumer agree; the millimeter convention is documented here once and
//! assumed everywhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3-D point in the global detector frame (millimeters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Origin of the detector frame
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Distance from the origin
    #[inline]
    pub fn r(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Polar angle θ in [0, π], measured from the +z axis
    ///
    /// Returns 0 for the origin, where the angle is undefined.
    pub fn theta(&self) -> f64 {
        let r = self.r();
        if r > 0.0 {
            (self.z / r).acos()
        } else {
            0.0
        }
    }

    /// Azimuthal angle φ in (-π, π], measured in the x-y plane
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }
}
