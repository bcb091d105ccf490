// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable state of one in-flight object parse.
//!
//! All accumulators live in one owned [`ParserState`] threaded explicitly
//! through the keyword handlers, so a partial or aborted parse can never
//! leave inconsistent state observable to a caller: the state is simply
//! dropped with the error.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use gocad_lite_model::{Atom, Metadata, ModelGeometry, Segment, Style, Triangle, Vertex};

use crate::importer::ImportConfig;
use crate::lexer::FileKind;
use crate::props::PropertyClass;

/// Bit-packed region-flag file descriptors for a volume.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlagsSpec {
    pub array_length: u64,
    pub bit_length: u32,
    /// Bytes per voxel in the flags file.
    pub bit_size: usize,
    pub offset: u64,
    pub file: Option<PathBuf>,
}

/// Staged volume geometry, completed over the course of the text pass.
#[derive(Debug, Clone)]
pub(crate) struct VolumeState {
    pub axis_o: Option<[f64; 3]>,
    pub axis_u: Option<[f64; 3]>,
    pub axis_v: Option<[f64; 3]>,
    pub axis_w: Option<[f64; 3]>,
    pub axis_min: [f64; 3],
    pub axis_max: [f64; 3],
    /// Cell counts from `AXIS_N`.
    pub size: Option<[usize; 3]>,
    pub flags: FlagsSpec,
    /// Region name per flag bit index.
    pub regions: FxHashMap<u32, String>,
    /// Companion node-coordinate file of a structured grid.
    pub points_file: Option<PathBuf>,
    pub points_offset: u64,
    /// True when grid properties align with cells rather than nodes.
    pub cell_align: bool,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self {
            axis_o: None,
            axis_u: None,
            axis_v: None,
            axis_w: None,
            axis_min: [0.0; 3],
            axis_max: [1.0; 3],
            size: None,
            flags: FlagsSpec::default(),
            regions: FxHashMap::default(),
            points_file: None,
            points_offset: 0,
            cell_align: false,
        }
    }
}

/// State of one object parse.
pub(crate) struct ParserState<'cfg> {
    pub cfg: &'cfg ImportConfig,
    pub src_dir: PathBuf,
    pub filename: String,
    pub kind: FileKind,

    // Header and coordinate-system results.
    pub header_name: String,
    pub coord_sys_name: String,
    pub uses_default_coords: bool,
    pub invert_z: bool,
    /// Per-axis multiplier; 1000.0 when an axis unit is kilometres.
    pub xyz_mult: [f64; 3],
    pub xyz_unit: [Option<String>; 3],

    // Geometry accumulators, keyed by declared sequence numbers until the
    // finalize pass remaps them to insertion order.
    pub seq_no: u32,
    pub vertices: Vec<Vertex>,
    /// Declared sequence number -> 0-based position in `vertices`.
    pub vertex_index: FxHashMap<u32, usize>,
    pub atoms: Vec<Atom>,
    pub triangles: Vec<Triangle>,
    pub segments: Vec<Segment>,

    /// Local per-point channels, in declaration order.
    pub local_props: Vec<PropertyClass>,
    /// Binary volume channels, keyed by the header's index token.
    pub binary_props: Vec<(String, PropertyClass)>,

    pub vol: VolumeState,

    // Seed output objects; finalize fans these out per channel.
    pub seed_geom: ModelGeometry,
    pub seed_style: Style,
    pub seed_meta: Metadata,
}

impl<'cfg> ParserState<'cfg> {
    pub fn new(cfg: &'cfg ImportConfig, src_dir: &Path, filename: &str, kind: FileKind) -> Self {
        Self {
            cfg,
            src_dir: src_dir.to_path_buf(),
            filename: filename.to_string(),
            kind,
            header_name: String::new(),
            coord_sys_name: "DEFAULT".to_string(),
            uses_default_coords: true,
            invert_z: false,
            xyz_mult: [1.0; 3],
            xyz_unit: [None, None, None],
            seq_no: 0,
            vertices: Vec::new(),
            vertex_index: FxHashMap::default(),
            atoms: Vec::new(),
            triangles: Vec::new(),
            segments: Vec::new(),
            local_props: Vec::new(),
            binary_props: Vec::new(),
            vol: VolumeState::default(),
            seed_geom: ModelGeometry::new(),
            seed_style: Style::new(),
            seed_meta: Metadata::new(),
        }
    }

    /// Scale a parsed coordinate triple by the per-axis unit multipliers.
    pub fn scale_xyz(&self, xyz: [f64; 3]) -> [f64; 3] {
        [
            xyz[0] * self.xyz_mult[0],
            xyz[1] * self.xyz_mult[1],
            xyz[2] * self.xyz_mult[2],
        ]
    }

    /// Store a vertex under its declared sequence number.
    ///
    /// A duplicate sequence number overwrites the index entry; uniqueness is
    /// assumed, not re-validated.
    pub fn push_vertex(&mut self, seq: u32, xyz: [f64; 3]) {
        self.vertex_index.insert(seq, self.vertices.len());
        self.vertices.push(Vertex { seq, xyz });
        self.seed_geom.update_bounds(xyz);
    }

    /// Coordinates of the vertex declared under `seq`, if any.
    pub fn vertex_coords(&self, seq: u32) -> Option<[f64; 3]> {
        self.vertex_index
            .get(&seq)
            .map(|&pos| self.vertices[pos].xyz)
    }

    pub fn local_prop_mut(&mut self, class_name: &str) -> Option<&mut PropertyClass> {
        self.local_props
            .iter_mut()
            .find(|p| p.class_name == class_name)
    }

    pub fn binary_prop_mut(&mut self, key: &str) -> Option<&mut PropertyClass> {
        self.binary_props
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p)
    }

    /// Binary channel for `key`, created with `class_name` on first sight.
    pub fn binary_prop_entry(&mut self, key: &str, class_name: &str) -> &mut PropertyClass {
        if let Some(pos) = self.binary_props.iter().position(|(k, _)| k == key) {
            return &mut self.binary_props[pos].1;
        }
        let idx = self.binary_props.len();
        self.binary_props
            .push((key.to_string(), PropertyClass::new(class_name)));
        &mut self.binary_props[idx].1
    }
}
