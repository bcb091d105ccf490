// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import orchestration.
//!
//! Drives the keyword dispatch loop over one object's lines, invokes the
//! binary decoders once the text is exhausted, then fans the seed
//! geometry/style/metadata out into one independent owned triple per
//! emitted channel.

use std::path::Path;

use rustc_hash::FxHashMap;

use gocad_lite_model::{Metadata, ModelGeometry, Segment, Style, Volume, VolumeDataType};

use crate::error::{Error, Result};
use crate::geometry;
use crate::group::{self, GroupContext};
use crate::header;
use crate::keywords::{Control, Keyword};
use crate::lexer::{detect_kind, split_objects, FileKind, Line, LineFeed};
use crate::numbers;
use crate::props::{PropertyClass, Storage};
use crate::state::ParserState;
use crate::volume;
use crate::well;

/// Host-side import options.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Offset added to every output coordinate.
    pub base_xyz: [f64; 3],
    /// Name prefix when importing outside a group file.
    pub group_name: String,
    /// Accept coordinate systems other than `DEFAULT`. Off by default: an
    /// unknown CRS would place geometry somewhere silently wrong.
    pub allow_nondefault_crs: bool,
    /// CSV colour tables keyed by binary payload file name; the value is the
    /// CSV file name (resolved next to the payload) and the table indexes to
    /// render transparent.
    pub colour_tables: FxHashMap<String, (String, Vec<i64>)>,
    /// Skip decoding region-flags files.
    pub skip_region_flags: bool,
}

/// One normalized output unit: geometry, style and metadata of a single
/// object or channel. Independent and immutable once returned.
#[derive(Debug, Clone)]
pub struct ImportedObject {
    pub geometry: ModelGeometry,
    pub style: Style,
    pub metadata: Metadata,
}

/// The exchange-format importer.
pub struct Importer {
    pub(crate) cfg: ImportConfig,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

impl Importer {
    pub fn new(cfg: ImportConfig) -> Self {
        Self { cfg }
    }

    /// Import a file from disk. Group files are exploded member-by-member;
    /// other files may hold several concatenated objects.
    pub fn import_path(&self, path: &Path) -> Result<Vec<ImportedObject>> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let src_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.import_lines(src_dir, &filename, &lines)
    }

    /// Import from pre-buffered lines.
    pub fn import_lines(
        &self,
        src_dir: &Path,
        filename: &str,
        lines: &[String],
    ) -> Result<Vec<ImportedObject>> {
        let first = lines.first().map(String::as_str).unwrap_or("");
        if matches!(
            detect_kind(filename, first.trim_end().to_uppercase().as_str()),
            Ok(FileKind::Group)
        ) {
            return group::extract_group(self, src_dir, filename, lines);
        }

        let objects = split_objects(lines);
        if objects.is_empty() {
            return Err(Error::UnrecognizedHeader {
                filename: filename.to_string(),
                header: first.trim_end().to_uppercase(),
            });
        }
        let mut out = Vec::new();
        for object_lines in &objects {
            out.extend(self.import_object(src_dir, filename, object_lines, None)?);
        }
        Ok(out)
    }

    /// Parse one object's lines into its output triples.
    pub(crate) fn import_object(
        &self,
        src_dir: &Path,
        filename: &str,
        lines: &[String],
        group: Option<&GroupContext>,
    ) -> Result<Vec<ImportedObject>> {
        let first = lines.first().map(String::as_str).unwrap_or("");
        let kind = detect_kind(filename, first.trim_end().to_uppercase().as_str())?;
        tracing::debug!(filename, ?kind, lines = lines.len(), "importing object");

        let mut state = ParserState::new(&self.cfg, src_dir, filename, kind);
        if let Some(group) = group {
            state.seed_style = group.style.clone();
        }

        let mut feed = LineFeed::new(lines);
        let mut pending: Option<Line> = None;
        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => feed.next_line(),
            };
            if line.is_sentinel() {
                break;
            }
            match self.dispatch(&mut state, &mut feed, &line)? {
                Control::Continue => {
                    if line.is_last {
                        break;
                    }
                }
                Control::Retry(next) => pending = Some(next),
                Control::Done => break,
            }
        }

        finalize(state, group)
    }

    fn dispatch(
        &self,
        state: &mut ParserState,
        feed: &mut LineFeed,
        line: &Line,
    ) -> Result<Control> {
        match Keyword::classify(line.keyword(), state.kind) {
            Keyword::Skip => Ok(Control::Continue),
            Keyword::Header => header::process_header(state, feed),
            Keyword::CoordSys => header::process_coord_sys(state, feed),
            Keyword::PropClassHeader => process_prop_class_header(state, feed, line),
            Keyword::Properties => {
                if state.local_props.is_empty() {
                    for name in line.fields.iter().skip(1) {
                        state.local_props.push(PropertyClass::new(name.clone()));
                    }
                }
                Ok(Control::Continue)
            }
            Keyword::Esizes => {
                for (idx, prop) in state.local_props.iter_mut().enumerate() {
                    if let Some(count) = line.field(idx + 1).and_then(numbers::parse_int) {
                        prop.elem_count = count as usize;
                    }
                }
                Ok(Control::Continue)
            }
            Keyword::NoDataValues => {
                for (idx, prop) in state.local_props.iter_mut().enumerate() {
                    if let Some(marker) = line.field(idx + 1).and_then(numbers::parse_float) {
                        prop.no_data = Some(marker);
                    }
                }
                Ok(Control::Continue)
            }
            Keyword::WellPath => {
                let result = well::process_well_path(state, feed, line)?;
                if result.path.len() > 1 {
                    for (idx, point) in result.path.iter().enumerate() {
                        state.push_vertex((idx + 1) as u32, *point);
                        if idx > 0 {
                            state.segments.push(Segment {
                                ab: [idx as u32, (idx + 1) as u32],
                            });
                        }
                    }
                }
                state.seed_meta.labels.extend(result.labels);
                Ok(Control::Retry(result.terminator))
            }
            Keyword::WellCurve => {
                if well::process_well_curve(feed) {
                    Ok(Control::Done)
                } else {
                    Ok(Control::Continue)
                }
            }
            Keyword::WellFile => Ok(Control::Continue),
            Keyword::Vertex { with_props } => geometry::handle_vertex(state, line, with_props),
            Keyword::Atom { with_props } => geometry::handle_atom(state, line, with_props),
            Keyword::Triangle => geometry::handle_triangle(state, line),
            Keyword::Segment => geometry::handle_segment(state, line),
            Keyword::StratigraphicPosition => {
                if let Some(name) = line.field(1) {
                    state.seed_meta.feature_name = name.to_string();
                }
                state.seed_meta.numeric_age_range = line
                    .fields
                    .last()
                    .and_then(|f| numbers::parse_int(f))
                    .unwrap_or(0);
                state.seed_meta.mapped_feature = gocad_lite_model::MappedFeature::GeologicalUnit;
                Ok(Control::Continue)
            }
            Keyword::GeologicalFeature => {
                if let Some(name) = line.field(1) {
                    state.seed_meta.feature_name = name.to_string();
                }
                Ok(Control::Continue)
            }
            Keyword::GeologicalType => {
                use gocad_lite_model::MappedFeature;
                match line.field(1) {
                    Some("FAULT") => {
                        state.seed_meta.mapped_feature = MappedFeature::ShearDisplacementStructure;
                    }
                    Some("INTRUSIVE") => {
                        state.seed_meta.mapped_feature = MappedFeature::GeologicalUnit;
                    }
                    Some("BOUNDARY" | "UNCONFORMITY" | "INTRAFORMATIONAL") => {
                        state.seed_meta.mapped_feature = MappedFeature::Contact;
                    }
                    _ => {}
                }
                Ok(Control::Continue)
            }
            Keyword::PropertySubclass => {
                // PROPERTY_SUBCLASS <idx> ROCK [<label> <index>]*
                if line.field(2) == Some("ROCK") {
                    if let Some(key) = line.field(1) {
                        let key = key.to_string();
                        let mut labels: Vec<(i64, String)> = Vec::new();
                        let mut col = 4;
                        while let (Some(label), Some(index)) = (line.field(col), line.field(col + 1))
                        {
                            if let Some(index) = numbers::parse_int(index) {
                                labels.push((index, label.to_string()));
                            }
                            col += 2;
                        }
                        let prop = state.binary_prop_entry(&key, &key);
                        prop.is_index_data = true;
                        for (index, label) in labels {
                            prop.rock_labels.insert(index, label);
                        }
                    }
                }
                Ok(Control::Continue)
            }
            Keyword::PropFile => {
                if let (Some(key), Some(name)) = (line.field(1), line.raw_field(2)) {
                    let path = state.src_dir.join(name);
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).file = Some(path);
                }
                Ok(Control::Continue)
            }
            Keyword::PropEsize => {
                if let (Some(key), Some(bytes)) =
                    (line.field(1), line.field(2).and_then(numbers::parse_int))
                {
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).elem_bytes = bytes as usize;
                }
                Ok(Control::Continue)
            }
            Keyword::PropStorageType => {
                let storage = match line.field(2) {
                    Some("OCTET") => Storage::Octet,
                    Some("SHORT") => Storage::Short,
                    Some("RGBA") => Storage::Rgba,
                    other => {
                        return Err(Error::UnsupportedEncoding(format!(
                            "storage type {}",
                            other.unwrap_or("<missing>")
                        )));
                    }
                };
                if let Some(key) = line.field(1) {
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).storage = storage;
                }
                Ok(Control::Continue)
            }
            Keyword::PropSigned => {
                if let Some(key) = line.field(1) {
                    let signed = line.field(2) == Some("1");
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).signed = signed;
                }
                Ok(Control::Continue)
            }
            Keyword::PropEtype => {
                if line.field(2) != Some("IEEE") {
                    return Err(Error::UnsupportedEncoding(format!(
                        "{} floating point",
                        line.field(2).unwrap_or("<missing>")
                    )));
                }
                Ok(Control::Continue)
            }
            Keyword::PropEformat => {
                if line.field(2) != Some("RAW") {
                    return Err(Error::UnsupportedEncoding(format!(
                        "{} volume payload format",
                        line.field(2).unwrap_or("<missing>")
                    )));
                }
                Ok(Control::Continue)
            }
            Keyword::PropOffset => {
                if let (Some(key), Some(offset)) =
                    (line.field(1), line.field(2).and_then(numbers::parse_int))
                {
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).offset = offset as u64;
                }
                Ok(Control::Continue)
            }
            Keyword::PropNoDataValue => {
                if let (Some(key), Some(marker)) =
                    (line.field(1), line.field(2).and_then(numbers::parse_float))
                {
                    let key = key.to_string();
                    state.binary_prop_entry(&key, &key).no_data = Some(marker);
                }
                Ok(Control::Continue)
            }
            Keyword::Volume => volume::handle_volume_keyword(state, line),
            Keyword::Unknown => {
                tracing::trace!(keyword = line.keyword(), "ignored keyword");
                Ok(Control::Continue)
            }
        }
    }
}

/// Read a `PROPERTY_CLASS_HEADER` block. Two shapes: a local point channel
/// (`{` as the third token) or a binary volume channel (`{` as the fourth);
/// both scan identically to `}` or end of stream.
fn process_prop_class_header(
    state: &mut ParserState,
    feed: &mut LineFeed,
    line: &Line,
) -> Result<Control> {
    let key = line.field(1).unwrap_or("").to_string();
    if line.field(2) == Some("{") {
        loop {
            let block_line = feed.next_line();
            if block_line.is_last {
                return Ok(Control::Done);
            }
            if block_line.keyword() == "}" {
                return Ok(Control::Continue);
            }
            if let Some(prop) = state.local_prop_mut(&key) {
                prop.apply_header_line(&block_line);
            }
        }
    } else if line.field(3) == Some("{") {
        let class_name = line.field(2).unwrap_or(key.as_str()).to_string();
        let prop = state.binary_prop_entry(&key, &class_name);
        prop.class_name = class_name;
        loop {
            let block_line = feed.next_line();
            if block_line.is_last {
                return Ok(Control::Done);
            }
            if block_line.keyword() == "}" {
                return Ok(Control::Continue);
            }
            prop.apply_header_line(&block_line);
        }
    } else {
        Err(Error::UnsupportedEncoding(format!(
            "property class header shape: {}",
            line.text
        )))
    }
}

/// Componentwise product of an axis vector with the min-to-max span.
fn full_axis(axis: [f64; 3], span: [f64; 3]) -> [f64; 3] {
    [axis[0] * span[0], axis[1] * span[1], axis[2] * span[2]]
}

/// Finish one parse: decode binary payloads, remap geometry, then fan the
/// seed objects out into one owned triple per channel.
fn finalize(mut state: ParserState, group: Option<&GroupContext>) -> Result<Vec<ImportedObject>> {
    if state.kind.is_volume() {
        if state.vol.size.is_none() {
            return Err(Error::MissingDimensions {
                filename: state.filename.clone(),
            });
        }
        volume::read_binary_channels(&mut state)?;
        if !state.cfg.skip_region_flags {
            volume::read_region_flags(&mut state)?;
        }
    }

    // Re-enumerate all geometry through the insertion-order remap so gapped
    // or out-of-order sequence numbers are safe downstream.
    let remap = geometry::build_remap(&state);
    let (vertices, atoms, triangles, segments) = geometry::remap_primitives(&state, &remap)?;

    let mut base_geom = state.seed_geom.clone();
    base_geom.vertices = vertices;
    base_geom.atoms = atoms;
    base_geom.triangles = triangles;
    base_geom.segments = segments;

    if let Some(size) = state.vol.size {
        let span = [
            state.vol.axis_max[0] - state.vol.axis_min[0],
            state.vol.axis_max[1] - state.vol.axis_min[1],
            state.vol.axis_max[2] - state.vol.axis_min[2],
        ];
        base_geom.volume = Some(Volume {
            origin: state.vol.axis_o.unwrap_or([0.0, 0.0, 0.0]),
            axis_u: full_axis(state.vol.axis_u.unwrap_or([1.0, 0.0, 0.0]), span),
            axis_v: full_axis(state.vol.axis_v.unwrap_or([0.0, 1.0, 0.0]), span),
            axis_w: full_axis(state.vol.axis_w.unwrap_or([0.0, 0.0, 1.0]), span),
            size,
            data_type: VolumeDataType::Float32,
            data: None,
        });
    }

    let group_name = group.map_or(state.cfg.group_name.as_str(), |g| g.name.as_str());
    let stem = if state.header_name.is_empty() {
        "geometry"
    } else {
        state.header_name.as_str()
    };
    state.seed_meta.name = if group_name.is_empty() {
        stem.to_string()
    } else {
        format!("{group_name}-{stem}")
    };

    let mut outputs = Vec::new();
    if !state.local_props.is_empty() {
        // All local channels share one output object.
        let mut geometry = base_geom;
        let mut style = state.seed_style.clone();
        let mut metadata = state.seed_meta.clone();
        for prop in &state.local_props {
            metadata.add_property_name(&prop.class_name);
            geometry.add_xyz_data(prop.xyz.clone());
            geometry.add_stats(prop.channel_stats());
            style.add_tables(prop.colour_map.clone(), prop.rock_labels.clone());
        }
        outputs.push(ImportedObject {
            geometry,
            style,
            metadata,
        });
    } else if !state.binary_props.is_empty() {
        // One output per binary channel; nothing may alias across channels.
        for (_, prop) in &state.binary_props {
            let mut geometry = base_geom.clone();
            let mut style = state.seed_style.clone();
            let mut metadata = state.seed_meta.clone();

            metadata.add_property_name(&prop.class_name);
            metadata.is_index_data = prop.is_index_data;
            if !prop.rock_labels.is_empty() {
                metadata.rock_label_table = prop.rock_labels.clone();
            }
            metadata.src_filename = prop.file.clone();

            if let Some(volume) = geometry.volume.as_mut() {
                volume.data = prop.dense.clone();
                volume.data_type = prop.volume_data_type();
            }
            if !prop.xyz.is_empty() {
                geometry.add_xyz_data(prop.xyz.clone());
            }
            geometry.add_stats(prop.channel_stats());
            style.add_tables(prop.colour_map.clone(), prop.rock_labels.clone());

            outputs.push(ImportedObject {
                geometry,
                style,
                metadata,
            });
        }
    } else {
        outputs.push(ImportedObject {
            geometry: base_geom,
            style: state.seed_style.clone(),
            metadata: state.seed_meta.clone(),
        });
    }

    tracing::debug!(
        filename = %state.filename,
        outputs = outputs.len(),
        "object import finished"
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gocad_lite_model::{PointKey, PropValue, VolumeData};
    use std::path::PathBuf;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    fn import(filename: &str, src: &str) -> Result<Vec<ImportedObject>> {
        Importer::default().import_lines(Path::new("."), filename, &lines(src))
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gocad_lite_importer_{tag}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn km_units_with_depth_inversion_end_to_end() {
        let objects = import(
            "base.ts",
            "GOCAD TSURF 1\n\
             HEADER {\n\
             name: BASE\n\
             }\n\
             GOCAD_ORIGINAL_COORDINATE_SYSTEM\n\
             NAME DEFAULT\n\
             AXIS_UNIT \"km\" \"km\" \"km\"\n\
             ZPOSITIVE DEPTH\n\
             END_ORIGINAL_COORDINATE_SYSTEM\n\
             VRTX 1 868.21875 6936.609375 0.35482565307617187\n\
             VRTX 2 868.0 6934.1875 0.3521\n\
             VRTX 3 868.1 6935.0 0.353\n\
             TRGL 1 2 3\n\
             END",
        )
        .unwrap();

        assert_eq!(objects.len(), 1);
        let geom = &objects[0].geometry;
        assert_eq!(
            geom.vertices[0].xyz,
            [868218.75, 6936609.375, -354.82565307617187]
        );
        assert!(geom.is_surface());
        assert_eq!(objects[0].metadata.name, "BASE");
    }

    #[test]
    fn infinity_spellings_become_float_extremes() {
        for spelling in ["INF", "1.#INF"] {
            let src = format!("GOCAD TSURF 1\nVRTX 1 {spelling} 0.0 0.0\nEND");
            let objects = import("inf.ts", &src).unwrap();
            assert_eq!(objects[0].geometry.vertices[0].xyz[0], f64::MAX);
        }
        let objects = import("inf.ts", "GOCAD TSURF 1\nVRTX 1 -1.#INF 0.0 0.0\nEND").unwrap();
        assert_eq!(objects[0].geometry.vertices[0].xyz[0], f64::MIN);
    }

    #[test]
    fn malformed_vertex_line_is_skipped_not_fatal() {
        let objects = import(
            "bad.ts",
            "GOCAD TSURF 1\nVRTX 1 0.0 BLAH 0.0\nVRTX 2 1.0 2.0 3.0\nEND",
        )
        .unwrap();
        let geom = &objects[0].geometry;
        assert_eq!(geom.vertices.len(), 1);
        assert_eq!(geom.vertices[0].xyz, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn dangling_atom_aborts_the_object() {
        let err = import("atoms.ts", "GOCAD TSURF 1\nATOM 6 6\nEND");
        assert!(matches!(err, Err(Error::DanglingReference { .. })));
    }

    #[test]
    fn local_properties_share_one_output() {
        let objects = import(
            "props.vs",
            "GOCAD VSET 1\n\
             HEADER {\n\
             name: POINTS\n\
             }\n\
             PROPERTIES AA BB CC\n\
             ESIZES 1 1 1\n\
             NO_DATA_VALUES -99999 -99999 -99998.0\n\
             PVRTX 1 641092.75 6983354.125 6304.10595703125 -110.087890625 12.0 -99998.0\n\
             END",
        )
        .unwrap();

        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.metadata.property_name(0), "AA");
        assert_eq!(object.metadata.property_name(2), "CC");

        let key = PointKey::new([641092.75, 6983354.125, 6304.10595703125]);
        assert_eq!(
            object.geometry.xyz_data(0).unwrap()[&key],
            PropValue::Scalar(-110.087890625)
        );
        // Channel CC saw only its no-data marker.
        assert!(object.geometry.xyz_data(2).unwrap().is_empty());
        assert_eq!(object.geometry.stats(0).unwrap().min, -110.087890625);
        assert_eq!(object.geometry.stats(2).unwrap().no_data, Some(-99998.0));
    }

    #[test]
    fn voxet_channels_fan_out_without_aliasing() {
        let dir = temp_dir("fan_out");
        let mut qt = Vec::new();
        for value in [3i16, -9999] {
            qt.extend_from_slice(&value.to_be_bytes());
        }
        std::fs::write(dir.join("qt@@"), qt).unwrap();
        let mut vp = Vec::new();
        for value in [1.5f32, 2.5] {
            vp.extend_from_slice(&value.to_be_bytes());
        }
        std::fs::write(dir.join("vp@@"), vp).unwrap();

        let src = "GOCAD VOXET 1\n\
             HEADER {\n\
             name: VOLS\n\
             }\n\
             AXIS_O 696000 6863000 -40000\n\
             AXIS_U 1 0 0\n\
             AXIS_V 0 1 0\n\
             AXIS_W 0 0 1\n\
             AXIS_N 2 1 1\n\
             AXIS_MIN 0 0 0\n\
             AXIS_MAX 51000 87000 51000\n\
             PROPERTY_CLASS_HEADER 1 \"QT\" {\n\
             COLORMAP: ROCKCODE\n\
             *COLORMAP*ROCKCODE*COLORS: 9 0.909804 0.564706 0.203922\n\
             }\n\
             PROP_FILE 1 qt@@\n\
             PROP_ESIZE 1 2\n\
             PROP_STORAGE_TYPE 1 SHORT\n\
             PROP_SIGNED 1 1\n\
             PROP_NO_DATA_VALUE 1 -9999\n\
             PROP_FILE 2 vp@@\n\
             PROP_ESIZE 2 4\n\
             PROP_ETYPE 2 IEEE\n\
             PROP_EFORMAT 2 RAW\n\
             END";
        let objects = Importer::default()
            .import_lines(&dir, "vols.vo", &lines(src))
            .unwrap();

        assert_eq!(objects.len(), 2);
        let qt = &objects[0];
        assert_eq!(qt.metadata.property_name(0), "QT");
        let volume = qt.geometry.volume.as_ref().unwrap();
        assert_eq!(volume.size, [2, 1, 1]);
        assert_eq!(volume.axis_u, [51000.0, 0.0, 0.0]);
        assert_eq!(volume.axis_v, [0.0, 87000.0, 0.0]);
        assert_eq!(volume.data_type, VolumeDataType::Int16);
        match volume.data.as_ref().unwrap() {
            VolumeData::Scalar(values) => assert_eq!(values.as_slice(), &[3.0, -9999.0]),
            other => panic!("expected scalar payload, got {other:?}"),
        }
        assert_eq!(qt.geometry.stats(0).unwrap().max, 3.0);
        assert_eq!(qt.style.colour_table(0).unwrap()[&9][0], 0.909804);

        let vp = &objects[1];
        assert_eq!(vp.metadata.property_name(0), "2");
        let volume = vp.geometry.volume.as_ref().unwrap();
        assert_eq!(volume.data_type, VolumeDataType::Float32);
        match volume.data.as_ref().unwrap() {
            VolumeData::Scalar(values) => assert_eq!(values.as_slice(), &[1.5, 2.5]),
            other => panic!("expected scalar payload, got {other:?}"),
        }
        // Fan-out is deep: mutating one channel's data cannot alias the other.
        assert!(!std::ptr::eq(
            objects[0].geometry.volume.as_ref().unwrap(),
            objects[1].geometry.volume.as_ref().unwrap()
        ));
    }

    #[test]
    fn segy_and_ibm_payloads_are_rejected() {
        let base = "GOCAD VOXET 1\nAXIS_N 1 1 1\n";
        let err = import("v.vo", &format!("{base}PROP_EFORMAT 1 SEGY\nEND"));
        assert!(matches!(err, Err(Error::UnsupportedEncoding(_))));
        let err = import("v.vo", &format!("{base}PROP_ETYPE 1 IBM\nEND"));
        assert!(matches!(err, Err(Error::UnsupportedEncoding(_))));
        let err = import("v.vo", &format!("{base}PROP_STORAGE_TYPE 1 COMPLEX\nEND"));
        assert!(matches!(err, Err(Error::UnsupportedEncoding(_))));
    }

    #[test]
    fn concatenated_objects_import_independently() {
        let objects = import(
            "two.ts",
            "GOCAD TSURF 1\n\
             HEADER {\n\
             name: FIRST\n\
             }\n\
             VRTX 1 0 0 0\n\
             END\n\
             GOCAD TSURF 1\n\
             HEADER {\n\
             name: SECOND\n\
             }\n\
             VRTX 1 1 1 1\n\
             END",
        )
        .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].metadata.name, "FIRST");
        assert_eq!(objects[1].metadata.name, "SECOND");
    }

    #[test]
    fn well_path_becomes_a_polyline() {
        let objects = import(
            "w1.wl",
            "GOCAD WELL 1\n\
             HEADER {\n\
             name: W1\n\
             }\n\
             WREF 500000.0 7000000.0 0.0\n\
             PATH_ZM_UNIT M\n\
             PATH 10 -10 1 1\n\
             PATH 20 -20 1 1\n\
             MRKR TOP_RESERVOIR 0 15.0\n\
             END",
        )
        .unwrap();

        let object = &objects[0];
        assert!(object.geometry.is_line());
        assert_eq!(object.geometry.vertices.len(), 2);
        assert_eq!(object.geometry.vertices[0].xyz, [500001.0, 7000001.0, -10.0]);
        assert_eq!(object.geometry.segments[0].ab, [1, 2]);
        assert_eq!(object.metadata.labels.len(), 1);
        assert_eq!(
            object.metadata.labels[0].position,
            [500000.0, 7000000.0, 15.0]
        );
    }

    #[test]
    fn survey_stations_reconstruct_a_path() {
        let objects = import(
            "w2.wl",
            "GOCAD WELL 1\n\
             WREF 1000.0 2000.0 50.0\n\
             PATH_ZM_UNIT M\n\
             DEVIATION_SURVEY\n\
             STATION 0.0 0.0 0.0\n\
             STATION 100.0 0.0 0.0\n\
             STATION 200.0 0.0 0.0\n\
             END",
        )
        .unwrap();

        let geom = &objects[0].geometry;
        assert_eq!(geom.vertices.len(), 3);
        assert_eq!(geom.vertices[0].xyz, [1000.0, 2000.0, 50.0]);
        assert_eq!(geom.vertices[2].xyz, [1000.0, 2000.0, -150.0]);
        assert_eq!(geom.segments.len(), 2);
    }

    #[test]
    fn unknown_first_line_is_unrecognized_header() {
        assert!(matches!(
            import("odd.ts", "SOMETHING ELSE\nEND"),
            Err(Error::UnrecognizedHeader { .. })
        ));
    }

    #[test]
    fn geological_metadata_is_classified() {
        let objects = import(
            "fault.ts",
            "GOCAD TSURF 1\n\
             GEOLOGICAL_FEATURE F123\n\
             GEOLOGICAL_TYPE FAULT\n\
             VRTX 1 0 0 0\n\
             END",
        )
        .unwrap();
        let meta = &objects[0].metadata;
        assert_eq!(meta.feature_name, "F123");
        assert_eq!(
            meta.mapped_feature,
            gocad_lite_model::MappedFeature::ShearDisplacementStructure
        );

        let objects = import(
            "strat.ts",
            "GOCAD TSURF 1\n\
             STRATIGRAPHIC_POSITION MESOZOIC 200\n\
             VRTX 1 0 0 0\n\
             END",
        )
        .unwrap();
        let meta = &objects[0].metadata;
        assert_eq!(meta.feature_name, "MESOZOIC");
        assert_eq!(meta.numeric_age_range, 200);
        assert_eq!(
            meta.mapped_feature,
            gocad_lite_model::MappedFeature::GeologicalUnit
        );
    }

    #[test]
    fn rock_subclass_marks_index_data() {
        let dir = temp_dir("rock");
        std::fs::write(dir.join("code@@"), 2i16.to_be_bytes()).unwrap();
        let src = "GOCAD VOXET 1\n\
             AXIS_N 1 1 1\n\
             PROPERTY_CLASS_HEADER 1 \"ROCKCODE\" {\n\
             }\n\
             PROPERTY_SUBCLASS 1 ROCK LINKED LLEWELLYN_REPEAT 2 DOUBLECROSSING 13\n\
             PROP_FILE 1 code@@\n\
             PROP_ESIZE 1 2\n\
             PROP_STORAGE_TYPE 1 SHORT\n\
             PROP_SIGNED 1 1\n\
             END";
        let objects = Importer::default()
            .import_lines(&dir, "rock.vo", &lines(src))
            .unwrap();

        let meta = &objects[0].metadata;
        assert!(meta.is_index_data);
        assert_eq!(meta.rock_label_table[&2], "LLEWELLYN_REPEAT");
        assert_eq!(meta.rock_label_table[&13], "DOUBLECROSSING");
    }
}
