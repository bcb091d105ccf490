// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry of one part of a geological model.
//!
//! A [`ModelGeometry`] holds the primitive arrays of a single imported
//! object (or of a single property channel of one), plus an optional dense
//! volume, loose XYZ-keyed property maps and per-channel statistics.

use nalgebra::Vector3;
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Atom, PointKey, Segment, Triangle, Vertex};

/// A property value attached to one point or cell.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropValue {
    Scalar(f64),
    Triple([f64; 3]),
    Rgba([u8; 4]),
}

/// Loose property data keyed by world coordinates.
pub type XyzMap = FxHashMap<PointKey, PropValue>;

/// Element type of a dense volume payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VolumeDataType {
    #[default]
    Float32,
    Float64,
    Int16,
    UInt16,
    Int8,
    UInt8,
    Rgba,
}

/// Dense per-cell volume payload, x-fastest
/// (`index = x + nx * (y + ny * z)`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VolumeData {
    Scalar(Vec<f64>),
    Rgba(Vec<[u8; 4]>),
}

impl VolumeData {
    pub fn len(&self) -> usize {
        match self {
            VolumeData::Scalar(v) => v.len(),
            VolumeData::Rgba(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Geometry and payload of a voxel or structured-grid volume.
///
/// The axis vectors are full length: origin plus `axis_u` is the far corner
/// of the volume along the first axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Volume {
    pub origin: [f64; 3],
    pub axis_u: [f64; 3],
    pub axis_v: [f64; 3],
    pub axis_w: [f64; 3],
    /// Cell counts (nx, ny, nz).
    pub size: [usize; 3],
    pub data_type: VolumeDataType,
    pub data: Option<VolumeData>,
}

impl Volume {
    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.size[0] * self.size[1] * self.size[2]
    }

    /// Unit vectors of the volume's three axes.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        let unit = |v: [f64; 3]| {
            let n = Vector3::from(v).normalize();
            [n.x, n.y, n.z]
        };
        [unit(self.axis_u), unit(self.axis_v), unit(self.axis_w)]
    }
}

/// Per-channel value statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    /// Sentinel meaning "no measurement here", excluded from min/max.
    pub no_data: Option<f64>,
}

/// Axis-aligned bounding box accumulated over every stored coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: [f64::MAX; 3],
            max: [f64::MIN; 3],
        }
    }
}

impl Bounds {
    /// Grow the box to include `xyz`.
    pub fn update(&mut self, xyz: [f64; 3]) {
        for axis in 0..3 {
            if xyz[axis] < self.min[axis] {
                self.min[axis] = xyz[axis];
            }
            if xyz[axis] > self.max[axis] {
                self.max[axis] = xyz[axis];
            }
        }
    }

    /// True until the first `update` call.
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }
}

/// Geometry of one imported object or channel.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelGeometry {
    pub vertices: Vec<Vertex>,
    pub atoms: Vec<Atom>,
    pub triangles: Vec<Triangle>,
    pub segments: Vec<Segment>,
    pub volume: Option<Volume>,
    /// Named-region membership per volume cell, keyed by (i, j, k).
    /// A cell can belong to several regions at once.
    pub regions: FxHashMap<[u32; 3], Vec<String>>,
    bounds: Option<Bounds>,
    xyz_data: Vec<XyzMap>,
    stats: Vec<ChannelStats>,
}

impl ModelGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff this object carries mesh faces.
    pub fn is_surface(&self) -> bool {
        !self.triangles.is_empty()
    }

    /// True iff this object carries polyline segments.
    pub fn is_line(&self) -> bool {
        !self.segments.is_empty()
    }

    /// True iff this object is a bare point set.
    pub fn is_point(&self) -> bool {
        (!self.vertices.is_empty() || !self.atoms.is_empty())
            && self.triangles.is_empty()
            && self.segments.is_empty()
    }

    pub fn is_volume(&self) -> bool {
        self.volume.is_some()
    }

    /// A volume exactly one cell deep along the third axis.
    pub fn is_single_layer_volume(&self) -> bool {
        self.volume.as_ref().is_some_and(|v| v.size[2] == 1)
    }

    /// Grow the bounding box to include `xyz`.
    pub fn update_bounds(&mut self, xyz: [f64; 3]) {
        self.bounds.get_or_insert_with(Bounds::default).update(xyz);
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Geographic extent `[min_x, max_x, min_y, max_y]`.
    pub fn extent(&self) -> Option<[f64; 4]> {
        self.bounds
            .map(|b| [b.min[0], b.max[0], b.min[1], b.max[1]])
    }

    /// Side lengths of the bounding box in [x, y, z] form.
    pub fn side_lengths(&self) -> Option<[f64; 3]> {
        self.bounds.map(|b| {
            [
                b.max[0] - b.min[0],
                b.max[1] - b.min[1],
                b.max[2] - b.min[2],
            ]
        })
    }

    /// Attach one channel of loose XYZ-keyed property data.
    pub fn add_xyz_data(&mut self, data: XyzMap) {
        self.xyz_data.push(data);
    }

    /// Loose property data for channel `idx`.
    pub fn xyz_data(&self, idx: usize) -> Option<&XyzMap> {
        self.xyz_data.get(idx)
    }

    pub fn xyz_channel_count(&self) -> usize {
        self.xyz_data.len()
    }

    /// Record min/max/no-data statistics for one channel.
    pub fn add_stats(&mut self, stats: ChannelStats) {
        self.stats.push(stats);
    }

    pub fn stats(&self, idx: usize) -> Option<&ChannelStats> {
        self.stats.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_volume(size: [usize; 3]) -> Volume {
        Volume {
            origin: [0.0, 0.0, 0.0],
            axis_u: [2.0, 0.0, 0.0],
            axis_v: [0.0, 3.0, 0.0],
            axis_w: [0.0, 0.0, 4.0],
            size,
            data_type: VolumeDataType::Float32,
            data: None,
        }
    }

    #[test]
    fn classifiers_follow_primitive_content() {
        let mut geom = ModelGeometry::new();
        geom.vertices.push(Vertex {
            seq: 1,
            xyz: [0.0, 0.0, 0.0],
        });
        assert!(geom.is_point());
        assert!(!geom.is_surface());

        geom.triangles.push(Triangle {
            seq: 1,
            abc: [1, 1, 1],
        });
        assert!(geom.is_surface());
        assert!(!geom.is_point());
    }

    #[test]
    fn single_layer_volume_detected() {
        let mut geom = ModelGeometry::new();
        geom.volume = Some(unit_volume([10, 20, 1]));
        assert!(geom.is_volume());
        assert!(geom.is_single_layer_volume());

        geom.volume = Some(unit_volume([10, 20, 2]));
        assert!(!geom.is_single_layer_volume());
    }

    #[test]
    fn rotation_returns_unit_axes() {
        let vol = unit_volume([1, 1, 1]);
        let rot = vol.rotation();
        assert_relative_eq!(rot[0][0], 1.0);
        assert_relative_eq!(rot[1][1], 1.0);
        assert_relative_eq!(rot[2][2], 1.0);
    }

    #[test]
    fn bounds_track_every_coordinate() {
        let mut geom = ModelGeometry::new();
        geom.update_bounds([1.0, 5.0, -2.0]);
        geom.update_bounds([-3.0, 2.0, 7.0]);
        let bounds = geom.bounds().unwrap();
        assert_eq!(bounds.min, [-3.0, 2.0, -2.0]);
        assert_eq!(bounds.max, [1.0, 5.0, 7.0]);
        assert_eq!(geom.extent().unwrap(), [-3.0, 1.0, 2.0, 5.0]);
        assert_eq!(geom.side_lengths().unwrap(), [4.0, 3.0, 9.0]);
    }
}
