// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Volume and region-flag decoding.
//!
//! The text pass stages axis vectors, cell counts and binary-layout
//! descriptors; once the text is exhausted the payload files are read whole
//! and decoded against that layout. Elements are big-endian. Values equal to
//! a channel's no-data marker keep their cell slot (as the marker) but are
//! excluded from statistics and from the XYZ-keyed lookup table. A payload
//! smaller than the declared layout is fatal, never truncated.

use std::path::{Path, PathBuf};

use gocad_lite_model::{PropValue, VolumeData};

use crate::error::{Error, Result};
use crate::keywords::Control;
use crate::lexer::{FileKind, Line};
use crate::numbers;
use crate::props::{PropertyClass, Storage};
use crate::state::ParserState;

/// Concrete element decode selected from (storage, byte width, signedness).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElemKind {
    F32,
    F64,
    I8,
    U8,
    I16,
    U16,
    Rgba,
}

impl ElemKind {
    fn width(self) -> usize {
        match self {
            ElemKind::I8 | ElemKind::U8 => 1,
            ElemKind::I16 | ElemKind::U16 => 2,
            ElemKind::F32 | ElemKind::Rgba => 4,
            ElemKind::F64 => 8,
        }
    }
}

fn elem_kind(prop: &PropertyClass) -> Result<ElemKind> {
    match prop.storage {
        Storage::Rgba => Ok(ElemKind::Rgba),
        Storage::Octet if prop.signed => Ok(ElemKind::I8),
        Storage::Octet => Ok(ElemKind::U8),
        Storage::Short if prop.signed => Ok(ElemKind::I16),
        Storage::Short => Ok(ElemKind::U16),
        Storage::Float => match prop.elem_bytes {
            4 => Ok(ElemKind::F32),
            8 => Ok(ElemKind::F64),
            n => Err(Error::UnsupportedEncoding(format!(
                "{}-byte float elements in channel {}",
                n, prop.class_name
            ))),
        },
    }
}

fn decode_scalar(kind: ElemKind, bytes: &[u8]) -> f64 {
    match kind {
        ElemKind::F32 => f64::from(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        ElemKind::F64 => f64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
        ElemKind::I8 => f64::from(bytes[0] as i8),
        ElemKind::U8 => f64::from(bytes[0]),
        ElemKind::I16 => f64::from(i16::from_be_bytes([bytes[0], bytes[1]])),
        ElemKind::U16 => f64::from(u16::from_be_bytes([bytes[0], bytes[1]])),
        ElemKind::Rgba => 0.0,
    }
}

/// Handle one volume descriptor line (`AXIS_*`, `FLAGS_*`, `REGION_FLAGS_*`,
/// `REGION`, `POINTS_FILE`, `POINTS_OFFSET`, `PROP_ALIGNMENT`).
pub(crate) fn handle_volume_keyword(state: &mut ParserState, line: &Line) -> Result<Control> {
    let parse_floats = |l: &Line| {
        numbers::parse_xyz(l.field(1)?, l.field(2)?, l.field(3)?)
    };
    match line.keyword() {
        "AXIS_O" => {
            if let Some(xyz) = parse_floats(line) {
                let mut origin = state.scale_xyz(xyz);
                for axis in 0..3 {
                    origin[axis] += state.cfg.base_xyz[axis];
                }
                state.seed_geom.update_bounds(origin);
                state.vol.axis_o = Some(origin);
            }
        }
        "AXIS_U" => state.vol.axis_u = parse_floats(line).or(state.vol.axis_u),
        "AXIS_V" => state.vol.axis_v = parse_floats(line).or(state.vol.axis_v),
        "AXIS_W" => state.vol.axis_w = parse_floats(line).or(state.vol.axis_w),
        "AXIS_MIN" => {
            if let Some(xyz) = parse_floats(line) {
                state.vol.axis_min = xyz;
            }
        }
        "AXIS_MAX" => {
            if let Some(xyz) = parse_floats(line) {
                state.vol.axis_max = xyz;
            }
        }
        "AXIS_N" => {
            let parsed = (|| {
                let n = numbers::parse_xyz_int(line.field(1)?, line.field(2)?, line.field(3)?)?;
                if n.iter().all(|&v| v > 0) {
                    Some([n[0] as usize, n[1] as usize, n[2] as usize])
                } else {
                    None
                }
            })();
            match parsed {
                Some(size) => state.vol.size = Some(size),
                None => tracing::warn!(line = %line.text, "malformed AXIS_N skipped"),
            }
        }
        "AXIS_UNIT" => crate::header::parse_axis_unit(state, line),
        "AXIS_NAME" | "AXIS_TYPE" | "AXIS_D" | "AXIS_LABEL_MAX" => {}
        "FLAGS_ARRAY_LENGTH" | "REGION_FLAGS_ARRAY_LENGTH" => {
            if let Some(n) = line.field(1).and_then(numbers::parse_int) {
                state.vol.flags.array_length = n as u64;
            }
        }
        "FLAGS_BIT_LENGTH" | "REGION_FLAGS_BIT_LENGTH" => {
            if let Some(n) = line.field(1).and_then(numbers::parse_int) {
                state.vol.flags.bit_length = n as u32;
            }
        }
        "FLAGS_ESIZE" | "REGION_FLAGS_ESIZE" => {
            if let Some(n) = line.field(1).and_then(numbers::parse_int) {
                state.vol.flags.bit_size = n as usize;
            }
        }
        "FLAGS_OFFSET" | "REGION_FLAGS_OFFSET" => {
            if let Some(n) = line.field(1).and_then(numbers::parse_int) {
                state.vol.flags.offset = n as u64;
            }
        }
        "FLAGS_FILE" | "REGION_FLAGS_FILE" => {
            if let Some(name) = line.raw_field(1) {
                state.vol.flags.file = Some(state.src_dir.join(name));
            }
        }
        "REGION" => {
            // REGION <name> <bit index>
            if let (Some(name), Some(bit)) = (
                line.field(1),
                line.field(2).and_then(numbers::parse_u32),
            ) {
                state.vol.regions.insert(bit, name.to_string());
            }
        }
        "POINTS_FILE" => {
            if let Some(name) = line.raw_field(1) {
                state.vol.points_file = Some(state.src_dir.join(name));
            }
        }
        "POINTS_OFFSET" => {
            if let Some(n) = line.field(1).and_then(numbers::parse_int) {
                state.vol.points_offset = n as u64;
            }
        }
        "PROP_ALIGNMENT" => {
            state.vol.cell_align = line.field(1) == Some("CELLS");
        }
        other => {
            tracing::trace!(keyword = other, "ignored volume keyword");
        }
    }
    Ok(Control::Continue)
}

/// `@@`-suffixed payload names sometimes need a `.vo` appended on disk.
fn resolve_binary_path(declared: &Path) -> PathBuf {
    if !declared.is_file() {
        if let Some(name) = declared.to_str() {
            if name.ends_with("@@") {
                let with_vo = PathBuf::from(format!("{name}.vo"));
                if with_vo.is_file() {
                    return with_vo;
                }
            }
        }
    }
    declared.to_path_buf()
}

/// Node coordinates of a structured grid from its companion points file:
/// big-endian `f32` triples, one per node.
fn read_sgrid_points(path: &Path, offset: u64, node_count: usize) -> Result<Vec<[f64; 3]>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let required = offset + 12 * node_count as u64;
    if (bytes.len() as u64) < required {
        return Err(Error::BinaryLayoutMismatch {
            path: path.to_path_buf(),
            actual: bytes.len() as u64,
            required,
        });
    }
    let payload = &bytes[offset as usize..];
    let mut points = Vec::with_capacity(node_count);
    for node in 0..node_count {
        let at = node * 12;
        let coord = |i: usize| {
            f64::from(f32::from_be_bytes([
                payload[at + i],
                payload[at + i + 1],
                payload[at + i + 2],
                payload[at + i + 3],
            ]))
        };
        points.push([coord(0), coord(4), coord(8)]);
    }
    Ok(points)
}

/// World coordinates of voxet cell (x, y, z) from the axis definition:
/// `O + Σ axis·(k/N)·(max−min)` along each basis vector.
fn voxet_cell_coords(
    origin: [f64; 3],
    axes: [[f64; 3]; 3],
    mult: [f64; 3],
    cell: [usize; 3],
) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (axis_idx, axis) in axes.iter().enumerate() {
        let mut acc = 0.0;
        for k in 0..3 {
            acc += cell[k] as f64 * axis[k] * mult[k];
        }
        out[axis_idx] = origin[axis_idx] + acc;
    }
    out
}

/// Read and decode every binary channel attached to this volume object.
pub(crate) fn read_binary_channels(state: &mut ParserState) -> Result<()> {
    let size = state.vol.size.ok_or_else(|| Error::MissingDimensions {
        filename: state.filename.clone(),
    })?;
    let cell_count = size[0] * size[1] * size[2];

    let origin = state.vol.axis_o.unwrap_or([0.0, 0.0, 0.0]);
    let axes = [
        state.vol.axis_u.unwrap_or([1.0, 0.0, 0.0]),
        state.vol.axis_v.unwrap_or([0.0, 1.0, 0.0]),
        state.vol.axis_w.unwrap_or([0.0, 0.0, 1.0]),
    ];
    let mult = [
        (state.vol.axis_max[0] - state.vol.axis_min[0]) / size[0] as f64,
        (state.vol.axis_max[1] - state.vol.axis_min[1]) / size[1] as f64,
        (state.vol.axis_max[2] - state.vol.axis_min[2]) / size[2] as f64,
    ];

    // A structured grid takes its coordinates from the points file instead.
    let sgrid_points = if state.kind == FileKind::SGrid {
        let Some(points_file) = state.vol.points_file.clone() else {
            return Err(Error::UnsupportedEncoding(
                "structured grid without a POINTS_FILE".to_string(),
            ));
        };
        let node_dims = if state.vol.cell_align {
            [size[0] + 1, size[1] + 1, size[2] + 1]
        } else {
            size
        };
        let node_count = node_dims[0] * node_dims[1] * node_dims[2];
        let path = resolve_binary_path(&points_file);
        Some((
            read_sgrid_points(&path, state.vol.points_offset, node_count)?,
            node_dims,
        ))
    } else {
        None
    };

    let cell_coords = |cell: [usize; 3]| -> [f64; 3] {
        match &sgrid_points {
            Some((points, dims)) => {
                let idx = cell[2] + dims[2] * (cell[1] + dims[1] * cell[0]);
                points[idx]
            }
            None => voxet_cell_coords(origin, axes, mult, cell),
        }
    };

    let is_sgrid = sgrid_points.is_some();

    // Split borrows: channel decode also grows the shared bounding box.
    let ParserState {
        binary_props,
        seed_geom,
        cfg,
        ..
    } = state;

    for (_, prop) in binary_props.iter_mut() {
        let Some(declared) = prop.file.clone() else {
            return Err(Error::UnsupportedEncoding(format!(
                "binary channel {} has no PROP_FILE",
                prop.class_name
            )));
        };
        let path = resolve_binary_path(&declared);

        // Host-supplied CSV colour table keyed by payload file name.
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some((csv_name, transparent)) = cfg.colour_tables.get(file_name) {
                let csv_path = path
                    .parent()
                    .map(|dir| dir.join(csv_name))
                    .unwrap_or_else(|| PathBuf::from(csv_name));
                prop.read_colour_table_csv(&csv_path, transparent)?;
            }
        }

        let kind = elem_kind(prop)?;
        let width = kind.width();
        let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let required = prop.offset + (width * cell_count) as u64;
        if (bytes.len() as u64) < required {
            return Err(Error::BinaryLayoutMismatch {
                path,
                actual: bytes.len() as u64,
                required,
            });
        }
        tracing::info!(
            channel = %prop.class_name,
            path = %path.display(),
            cells = cell_count,
            "reading binary volume payload"
        );
        let payload = &bytes[prop.offset as usize..];

        if kind == ElemKind::Rgba {
            let mut dense = vec![[0u8; 4]; cell_count];
            let mut flat = 0usize;
            for z in 0..size[2] {
                for y in 0..size[1] {
                    for x in 0..size[0] {
                        let at = flat * 4;
                        let rgba = [payload[at], payload[at + 1], payload[at + 2], payload[at + 3]];
                        dense[flat] = rgba;
                        let coords = cell_coords([x, y, z]);
                        seed_geom.update_bounds(coords);
                        // Spectrum heuristic: numeric min/max is meaningless
                        // for colour data.
                        if rgba[3] > 0 {
                            let packed = f64::from(rgba[0]) * 65536.0
                                + f64::from(rgba[1]) * 256.0
                                + f64::from(rgba[2]);
                            prop.stats.update(packed);
                        }
                        prop.xyz
                            .insert(coords.into(), PropValue::Rgba(rgba));
                        flat += 1;
                    }
                }
            }
            prop.dense = Some(VolumeData::Rgba(dense));
        } else {
            let sentinel = prop.no_data.unwrap_or(0.0);
            let mut dense = vec![sentinel; cell_count];
            let mut flat = 0usize;
            for z in 0..size[2] {
                for y in 0..size[1] {
                    for x in 0..size[0] {
                        let coords = cell_coords([x, y, z]);
                        seed_geom.update_bounds(coords);
                        let value = decode_scalar(kind, &payload[flat * width..]);
                        let is_no_data = prop.no_data == Some(value);
                        if !is_no_data {
                            dense[flat] = value;
                            prop.stats.update(value);
                            if is_sgrid {
                                prop.xyz.insert(coords.into(), PropValue::Scalar(value));
                            }
                        }
                        flat += 1;
                    }
                }
            }
            prop.dense = Some(VolumeData::Scalar(dense));
        }
    }
    Ok(())
}

/// Decode the bit-packed region-flags file into per-voxel region membership.
///
/// Each voxel's flag word is `bit_size` bytes; every set bit whose index
/// appears in the region table adds that region's name to the voxel, so a
/// voxel can belong to several regions at once.
pub(crate) fn read_region_flags(state: &mut ParserState) -> Result<()> {
    let ParserState { vol, seed_geom, .. } = state;
    let Some(size) = vol.size else {
        return Ok(());
    };
    let Some(declared) = vol.flags.file.clone() else {
        return Ok(());
    };
    let cell_count = (size[0] * size[1] * size[2]) as u64;
    if vol.flags.array_length != cell_count {
        tracing::warn!(
            declared = vol.flags.array_length,
            cells = cell_count,
            "flags file length inconsistent with AXIS_N, skipping regions"
        );
        return Ok(());
    }
    let width = vol.flags.bit_size;
    if width == 0 || width > 8 {
        return Err(Error::UnsupportedEncoding(format!(
            "{width}-byte region flag words"
        )));
    }

    let path = resolve_binary_path(&declared);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "cannot read flags file, skipping regions");
            return Ok(());
        }
    };
    let required = vol.flags.offset + cell_count * width as u64;
    if (bytes.len() as u64) < required {
        return Err(Error::BinaryLayoutMismatch {
            path,
            actual: bytes.len() as u64,
            required,
        });
    }
    tracing::info!(path = %path.display(), cells = cell_count, "reading region flags");
    let payload = &bytes[vol.flags.offset as usize..];

    // Stable region order for the per-voxel membership lists.
    let mut regions: Vec<(u32, &String)> = vol
        .regions
        .iter()
        .map(|(&bit, name)| (bit, name))
        .collect();
    regions.sort_by_key(|&(bit, _)| bit);
    if vol.flags.bit_length > 0 {
        for &(bit, name) in &regions {
            if bit >= vol.flags.bit_length {
                tracing::warn!(
                    region = %name,
                    bit,
                    declared_bits = vol.flags.bit_length,
                    "region bit beyond declared flag width"
                );
            }
        }
    }

    let mut flat = 0usize;
    for z in 0..size[2] {
        for y in 0..size[1] {
            for x in 0..size[0] {
                let at = flat * width;
                // Per-voxel words carry their low byte first.
                let mut word: u64 = 0;
                for (byte_idx, &byte) in payload[at..at + width].iter().enumerate() {
                    word |= u64::from(byte) << (8 * byte_idx);
                }
                if word != 0 {
                    for &(bit, name) in &regions {
                        if bit < (width * 8) as u32 && (word >> bit) & 1 == 1 {
                            seed_geom
                                .regions
                                .entry([x as u32, y as u32, z as u32])
                                .or_default()
                                .push(name.clone());
                        }
                    }
                }
                flat += 1;
            }
        }
    }
    Ok(())
}
