// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property channel descriptors.
//!
//! One [`PropertyClass`] per named channel. Local channels accumulate values
//! line-by-line keyed by vertex coordinates; binary channels describe the
//! layout of a volume payload file and are bulk-decoded after the text pass.
//! A channel is one or the other, never both.

use std::path::{Path, PathBuf};

use nom::{
    character::complete::{i64 as nom_i64, multispace0, multispace1},
    multi::many1,
    number::complete::double,
    sequence::{preceded, tuple},
    IResult,
};
use rustc_hash::FxHashMap;

use gocad_lite_model::{ChannelStats, PointKey, PropValue, Rgba, VolumeData, VolumeDataType, XyzMap};

use crate::error::{Error, Result};
use crate::lexer::Line;
use crate::numbers;

/// Storage kind of a binary channel element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Storage {
    /// IEEE float, the default when no storage type is declared.
    #[default]
    Float,
    /// Single-byte integer.
    Octet,
    /// Two-byte integer.
    Short,
    /// Packed 4-byte colour.
    Rgba,
}

/// Running min/max over the values of one channel.
#[derive(Debug, Clone, Copy)]
pub struct StatsAcc {
    pub min: f64,
    pub max: f64,
}

impl Default for StatsAcc {
    fn default() -> Self {
        Self {
            min: f64::MAX,
            max: f64::MIN,
        }
    }
}

impl StatsAcc {
    pub fn update(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn to_channel_stats(self, no_data: Option<f64>) -> ChannelStats {
        ChannelStats {
            min: self.min,
            max: self.max,
            no_data,
        }
    }
}

/// Descriptor and accumulated data of one property channel.
#[derive(Debug, Clone, Default)]
pub struct PropertyClass {
    pub class_name: String,
    /// Values per sample for a local channel: 1 scalar or 3 for XYZ data.
    pub elem_count: usize,
    /// Bytes per element in a binary payload (1, 2, 4 or 8).
    pub elem_bytes: usize,
    pub storage: Storage,
    pub signed: bool,
    /// Byte offset of the payload within the binary file.
    pub offset: u64,
    pub no_data: Option<f64>,
    /// Binary payload file, relative to the object's source directory.
    pub file: Option<PathBuf>,
    pub colourmap_name: String,
    pub colour_map: FxHashMap<i64, Rgba>,
    pub rock_labels: FxHashMap<i64, String>,
    /// True when values index a rock/colour table instead of measuring.
    pub is_index_data: bool,
    /// Loose values keyed by world coordinates.
    pub xyz: XyzMap,
    /// Dense volume payload, filled by the binary decoder.
    pub dense: Option<VolumeData>,
    pub stats: StatsAcc,
}

impl PropertyClass {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            elem_count: 1,
            elem_bytes: 4,
            ..Self::default()
        }
    }

    /// Element type of the decoded volume payload.
    pub fn volume_data_type(&self) -> VolumeDataType {
        match self.storage {
            Storage::Rgba => VolumeDataType::Rgba,
            Storage::Octet if self.signed => VolumeDataType::Int8,
            Storage::Octet => VolumeDataType::UInt8,
            Storage::Short if self.signed => VolumeDataType::Int16,
            Storage::Short => VolumeDataType::UInt16,
            Storage::Float if self.elem_bytes == 8 => VolumeDataType::Float64,
            Storage::Float => VolumeDataType::Float32,
        }
    }

    /// Record a scalar at a point, tracking statistics.
    pub fn record_scalar_at(&mut self, xyz: [f64; 3], value: f64) {
        self.stats.update(value);
        self.xyz.insert(PointKey::new(xyz), PropValue::Scalar(value));
    }

    /// Record a 3-component value at a point. Vector channels carry no
    /// scalar statistics.
    pub fn record_triple_at(&mut self, xyz: [f64; 3], value: [f64; 3]) {
        self.xyz.insert(PointKey::new(xyz), PropValue::Triple(value));
    }

    pub fn channel_stats(&self) -> ChannelStats {
        self.stats.to_channel_stats(self.no_data)
    }

    /// Apply one `name: value` line from a property-class header block,
    /// harvesting the colour-map name and colour rows.
    pub fn apply_header_line(&mut self, line: &Line) {
        let Some((name, value)) = line.text.split_once(':') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        match name {
            "COLORMAP" => {
                self.colourmap_name = value.to_string();
            }
            "*COLORMAP*SIZE" | "*COLORMAP*NBCOLORS" | "HIGH_CLIP" | "LOW_CLIP" => {
                tracing::trace!(name, value, "ignored colour-map attribute");
            }
            _ => {
                let row_names = [
                    format!("*COLORMAP*{}*COLORS", self.colourmap_name),
                    format!("*{}*ROCK_COLORS", self.colourmap_name),
                    "COLORMAP**COLORS".to_string(),
                ];
                if row_names.iter().any(|row| row == name) {
                    self.parse_colour_rows(value);
                }
            }
        }
    }

    /// Parse `idx R G B idx R G B ...` colour rows into the colour map.
    fn parse_colour_rows(&mut self, value: &str) {
        match colour_rows(value) {
            Ok((_, rows)) => {
                for (idx, [r, g, b]) in rows {
                    self.colour_map.insert(idx, [r, g, b, 1.0]);
                }
            }
            Err(_) => {
                tracing::warn!(
                    channel = %self.class_name,
                    "malformed colour-map rows skipped"
                );
            }
        }
    }

    /// Read an indexed colour table from a CSV file
    /// (`index,label,R,G,B` rows). Row indexes listed in `transparent` get a
    /// zero alpha. Replaces the channel's colour map and rock-label table.
    pub fn read_colour_table_csv(&mut self, path: &Path, transparent: &[i64]) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut colours = FxHashMap::default();
        let mut labels = FxHashMap::default();
        for row in text.lines() {
            if row.trim().is_empty() {
                continue;
            }
            let cols: Vec<&str> = row.split(',').collect();
            let parsed = (|| {
                let idx = numbers::parse_int(cols.first()?.trim())?;
                let label = cols.get(1)?.trim().to_string();
                let r = numbers::parse_float(cols.get(2)?.trim())?;
                let g = numbers::parse_float(cols.get(3)?.trim())?;
                let b = numbers::parse_float(cols.get(4)?.trim())?;
                Some((idx, label, [r, g, b]))
            })();
            match parsed {
                Some((idx, label, [r, g, b])) => {
                    let alpha = if transparent.contains(&idx) { 0.0 } else { 1.0 };
                    colours.insert(idx, [r, g, b, alpha]);
                    labels.insert(idx, label);
                }
                None => tracing::warn!(path = %path.display(), row, "malformed colour-table row skipped"),
            }
        }
        self.colour_map = colours;
        self.rock_labels = labels;
        Ok(())
    }
}

fn colour_rows(input: &str) -> IResult<&str, Vec<(i64, [f64; 3])>> {
    many1(tuple((
        preceded(multispace0, nom_i64),
        preceded(multispace1, double),
        preceded(multispace1, double),
        preceded(multispace1, double),
    )))(input)
    .map(|(rest, rows)| {
        (
            rest,
            rows.into_iter().map(|(i, r, g, b)| (i, [r, g, b])).collect(),
        )
    })
}

/// Parse the inline per-point properties of a `PVRTX`/`PATOM` line.
///
/// `start_col` is the first property column (5 for `PVRTX`, 3 for `PATOM`).
/// Control-node tokens (`CNXY`, `CNXYZ`, ...) are skipped. Values equal to a
/// channel's no-data marker are excluded. A short or locally malformed line
/// only loses the affected values.
pub(crate) fn assign_local_props(
    props: &mut [PropertyClass],
    line: &Line,
    start_col: usize,
    xyz: [f64; 3],
) -> Result<()> {
    let mut col = start_col;
    for prop in props.iter_mut() {
        match prop.elem_count {
            1 => {
                let Some(mut field) = line.field(col) else {
                    return Ok(());
                };
                if field.starts_with("CN") {
                    col += 1;
                    match line.field(col) {
                        Some(f) => field = f,
                        None => return Ok(()),
                    }
                }
                if let Some(value) = numbers::parse_float_or_no_data(field, prop.no_data) {
                    prop.record_scalar_at(xyz, value);
                }
                col += 1;
            }
            3 => {
                let Some(mut x_field) = line.field(col) else {
                    return Ok(());
                };
                if x_field.starts_with("CN") {
                    col += 1;
                    match line.field(col) {
                        Some(f) => x_field = f,
                        None => return Ok(()),
                    }
                }
                let value = (|| {
                    let x = numbers::parse_float_or_no_data(x_field, prop.no_data)?;
                    let y = numbers::parse_float_or_no_data(line.field(col + 1)?, prop.no_data)?;
                    let z = numbers::parse_float_or_no_data(line.field(col + 2)?, prop.no_data)?;
                    Some([x, y, z])
                })();
                if let Some(triple) = value {
                    prop.record_triple_at(xyz, triple);
                }
                col += 3;
            }
            n => {
                return Err(Error::UnsupportedEncoding(format!(
                    "property {} element size {} is not 1 or 3",
                    prop.class_name, n
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LineFeed;

    fn line(src: &str) -> Line {
        LineFeed::new(&[src]).next_line()
    }

    #[test]
    fn colour_map_rows_follow_declared_name() {
        let mut prop = PropertyClass::new("1");
        prop.apply_header_line(&line("COLORMAP: ROCKCODE"));
        assert_eq!(prop.colourmap_name, "ROCKCODE");
        prop.apply_header_line(&line(
            "*COLORMAP*ROCKCODE*COLORS: 9 0.909804 0.564706 0.203922 10 0.0 0.5 1.0",
        ));
        assert_eq!(prop.colour_map[&9], [0.909804, 0.564706, 0.203922, 1.0]);
        assert_eq!(prop.colour_map[&10], [0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn unrelated_header_lines_leave_colour_map_alone() {
        let mut prop = PropertyClass::new("1");
        prop.apply_header_line(&line("*COLORMAP*SIZE: 32"));
        prop.apply_header_line(&line("LOW_CLIP: -1.0"));
        assert!(prop.colour_map.is_empty());
    }

    #[test]
    fn local_props_assign_by_position() {
        let mut props = vec![PropertyClass::new("AA"), PropertyClass::new("BB")];
        props[1].no_data = Some(-99998.0);
        let xyz = [641092.75, 6983354.125, 6304.10595703125];
        assign_local_props(
            &mut props,
            &line("PVRTX 1 641092.75 6983354.125 6304.10595703125 -110.087890625 -99998.0"),
            5,
            xyz,
        )
        .unwrap();

        assert_eq!(
            props[0].xyz[&PointKey::new(xyz)],
            PropValue::Scalar(-110.087890625)
        );
        // No-data marker is excluded from the map entirely.
        assert!(props[1].xyz.is_empty());
        assert_eq!(props[0].stats.min, -110.087890625);
    }

    #[test]
    fn control_node_tokens_are_skipped() {
        let mut props = vec![PropertyClass::new("AA")];
        let xyz = [1.0, 2.0, 3.0];
        assign_local_props(&mut props, &line("PVRTX 1 1 2 3 CNXYZ 1057.0"), 5, xyz).unwrap();
        assert_eq!(props[0].xyz[&PointKey::new(xyz)], PropValue::Scalar(1057.0));
    }

    #[test]
    fn three_wide_channels_store_triples() {
        let mut props = vec![PropertyClass::new("VEC")];
        props[0].elem_count = 3;
        let xyz = [0.0, 0.0, 0.0];
        assign_local_props(&mut props, &line("PVRTX 1 0 0 0 1.0 2.0 3.0"), 5, xyz).unwrap();
        assert_eq!(
            props[0].xyz[&PointKey::new(xyz)],
            PropValue::Triple([1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn oversized_element_count_is_rejected() {
        let mut props = vec![PropertyClass::new("BAD")];
        props[0].elem_count = 2;
        let err = assign_local_props(&mut props, &line("PVRTX 1 0 0 0 1 2"), 5, [0.0; 3]);
        assert!(matches!(err, Err(Error::UnsupportedEncoding(_))));
    }

    #[test]
    fn csv_colour_table_applies_transparency() {
        let dir = std::env::temp_dir().join("gocad_lite_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rock_colours.csv");
        std::fs::write(&path, "1,GRANITE,0.9,0.1,0.1\n2,SLATE,0.25,0.25,0.25\n").unwrap();

        let mut prop = PropertyClass::new("1");
        prop.read_colour_table_csv(&path, &[2]).unwrap();
        assert_eq!(prop.colour_map[&1], [0.9, 0.1, 0.1, 1.0]);
        assert_eq!(prop.colour_map[&2], [0.25, 0.25, 0.25, 0.0]);
        assert_eq!(prop.rock_labels[&1], "GRANITE");
    }
}
