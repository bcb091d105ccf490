// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry primitives, independent of any model file format.
//!
//! Sequence numbers are 1-based. After an importer finalizes an object, every
//! sequence number equals the element's insertion position, and triangle,
//! segment and atom indices all refer to those positions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3-D point with a sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Sequence number, 1-based.
    pub seq: u32,
    /// World coordinates (x, y, z).
    pub xyz: [f64; 3],
}

/// A vertex defined as an alias of a previously declared vertex.
///
/// Shares the target's coordinates but keeps its own sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Atom {
    pub seq: u32,
    /// Sequence number of the vertex this atom aliases.
    pub target: u32,
}

/// A triangular mesh face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub seq: u32,
    /// Corner vertex sequence numbers.
    pub abc: [u32; 3],
}

/// A polyline edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Endpoint vertex sequence numbers.
    pub ab: [u32; 2],
}

/// Hashable key for maps indexed by world coordinates.
///
/// Coordinates are compared by exact bit pattern, which is what a loose
/// property table needs: a value is attached to the coordinates a vertex was
/// parsed with, and looked up with those same coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointKey([u64; 3]);

impl PointKey {
    pub fn new(xyz: [f64; 3]) -> Self {
        Self([xyz[0].to_bits(), xyz[1].to_bits(), xyz[2].to_bits()])
    }

    /// The coordinates this key was built from.
    pub fn coords(&self) -> [f64; 3] {
        [
            f64::from_bits(self.0[0]),
            f64::from_bits(self.0[1]),
            f64::from_bits(self.0[2]),
        ]
    }
}

impl From<[f64; 3]> for PointKey {
    fn from(xyz: [f64; 3]) -> Self {
        Self::new(xyz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_key_round_trips_coordinates() {
        let key = PointKey::new([868218.75, 6936609.375, -354.82565307617187]);
        assert_eq!(key.coords(), [868218.75, 6936609.375, -354.82565307617187]);
    }

    #[test]
    fn point_key_distinguishes_negative_zero() {
        // Bit-pattern equality, not numeric equality.
        assert_ne!(PointKey::new([0.0, 0.0, 0.0]), PointKey::new([-0.0, 0.0, 0.0]));
    }
}
