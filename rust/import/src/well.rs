// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-path reconstruction.
//!
//! Two path encodings: explicit `PATH`/`VRTX` positions relative to a `WREF`
//! collar, and `STATION md inc az` directional surveys combined pairwise with
//! the minimum-curvature method. Markers and zones become labels attached at
//! `(collar_x, collar_y, depth)`; they are not re-projected onto the curved
//! path.

use rustc_hash::FxHashMap;

use gocad_lite_model::WellLabel;

use crate::error::{Error, Result};
use crate::lexer::{Line, LineFeed};
use crate::numbers;
use crate::state::ParserState;

/// One directional survey reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    /// Measured depth along the hole.
    pub md: f64,
    /// Inclination from vertical, degrees.
    pub inc: f64,
    /// Azimuth from north, degrees.
    pub az: f64,
}

/// Incremental (Δx, Δy, Δz) between two survey stations by the minimum
/// curvature method. Δz is negative for a downward-deepening hole.
///
/// The dogleg angle is
/// `β = arccos(cos Δi − sin i₁ · sin i₂ · (1 − cos Δa))` and the ratio
/// factor `rf = (2/β)·tan(β/2)`, which tends to 1 as β tends to 0.
pub fn minimum_curvature_step(s1: &Station, s2: &Station) -> [f64; 3] {
    let i1 = s1.inc.to_radians();
    let i2 = s2.inc.to_radians();
    let a1 = s1.az.to_radians();
    let a2 = s2.az.to_radians();

    let cos_beta = (i2 - i1).cos() - i1.sin() * i2.sin() * (1.0 - (a2 - a1).cos());
    let beta = cos_beta.clamp(-1.0, 1.0).acos();
    let rf = if beta.abs() < 1e-9 {
        1.0
    } else {
        2.0 / beta * (beta / 2.0).tan()
    };

    let half_md = (s2.md - s1.md) / 2.0;
    let de = half_md * (i1.sin() * a1.sin() + i2.sin() * a2.sin()) * rf;
    let dn = half_md * (i1.sin() * a1.cos() + i2.sin() * a2.cos()) * rf;
    let dv = half_md * (i1.cos() + i2.cos()) * rf;
    [de, dn, -dv]
}

/// Positions of every station, walked out from the collar. The first station
/// hangs off the collar along its own direction.
pub fn reconstruct_survey(collar: [f64; 3], stations: &[Station]) -> Vec<[f64; 3]> {
    let mut path = Vec::with_capacity(stations.len());
    let mut position = collar;
    let mut previous: Option<Station> = None;
    for station in stations {
        let from = previous.unwrap_or(Station {
            md: 0.0,
            inc: station.inc,
            az: station.az,
        });
        let step = minimum_curvature_step(&from, station);
        position = [
            position[0] + step[0],
            position[1] + step[1],
            position[2] + step[2],
        ];
        path.push(position);
        previous = Some(*station);
    }
    path
}

/// Result of reading the ASCII well-path block.
pub(crate) struct WellPath {
    /// Path positions, collar excluded.
    pub path: Vec<[f64; 3]>,
    pub labels: Vec<WellLabel>,
    /// The line that terminated the block, for re-dispatch.
    pub terminator: Line,
}

/// Read the ASCII well-path block starting at `first` (`WREF` or
/// `PATH_ZM_UNIT`) until `END`, `WELL_CURVE` or end of stream.
pub(crate) fn process_well_path(
    state: &mut ParserState,
    feed: &mut LineFeed,
    first: &Line,
) -> Result<WellPath> {
    let mut km_units = false;
    let mut collar: Option<[f64; 3]> = None;
    // Collar first, when present; dropped from the returned path.
    let mut path: Vec<[f64; 3]> = Vec::new();
    let mut stations: Vec<Station> = Vec::new();
    let mut labels: Vec<WellLabel> = Vec::new();

    let mut current = first.clone();
    loop {
        match current.keyword() {
            "KB" => {
                // Kelly-bushing height; parsed for validity, not used.
                let _ = current.field(1).and_then(numbers::parse_float);
            }
            "PATH_ZM_UNIT" => match current.field(1) {
                Some("M") => km_units = false,
                Some("KM") => km_units = true,
                other => {
                    return Err(Error::UnsupportedEncoding(format!(
                        "PATH_ZM_UNIT {}",
                        other.unwrap_or("<missing>")
                    )));
                }
            },
            "WREF" => {
                let parsed = (|| {
                    numbers::parse_xyz(current.field(1)?, current.field(2)?, current.field(3)?)
                })();
                match parsed {
                    Some(xyz) => {
                        collar = Some(xyz);
                        path = vec![xyz];
                    }
                    None => tracing::warn!(line = %current.text, "malformed WREF skipped"),
                }
            }
            "DEVIATION_SURVEY" | "DATUM" | "ZM_NUMPTS" => {}
            "STATION" => {
                let parsed = (|| {
                    Some(Station {
                        md: numbers::parse_float(current.field(1)?)?,
                        inc: numbers::parse_float(current.field(2)?)?,
                        az: numbers::parse_float(current.field(3)?)?,
                    })
                })();
                match parsed {
                    Some(station) => stations.push(station),
                    None => tracing::warn!(line = %current.text, "malformed STATION skipped"),
                }
            }
            "PATH" => {
                // PATH md z dx dy: deltas in x/y from the previous point.
                let scale = if km_units { 1000.0 } else { 1.0 };
                let parsed = (|| {
                    numbers::parse_xyz(current.field(2)?, current.field(3)?, current.field(4)?)
                })();
                match (parsed, path.last().copied()) {
                    (Some([z, dx, dy]), Some(last)) => {
                        path.push([last[0] + dx * scale, last[1] + dy * scale, z * scale]);
                    }
                    (Some(_), None) => {
                        tracing::warn!(line = %current.text, "PATH before WREF skipped");
                    }
                    (None, _) => tracing::warn!(line = %current.text, "malformed PATH skipped"),
                }
            }
            "VRTX" => {
                let scale = if km_units { 1000.0 } else { 1.0 };
                let parsed = (|| {
                    numbers::parse_xyz(current.field(1)?, current.field(2)?, current.field(3)?)
                })();
                match parsed {
                    Some(xyz) => path.push([xyz[0] * scale, xyz[1] * scale, xyz[2] * scale]),
                    None => tracing::warn!(line = %current.text, "malformed well VRTX skipped"),
                }
            }
            "MRKR" if !path.is_empty() => {
                let name = current.field(1).unwrap_or("").to_string();
                let depth = current.field(3).and_then(numbers::parse_float);
                let (next, mut info) = process_well_info(feed);
                if let Some(depth) = depth {
                    let anchor = path[0];
                    info.insert("depth".to_string(), depth.to_string());
                    labels.push(WellLabel {
                        name,
                        position: [anchor[0], anchor[1], depth],
                        info,
                    });
                }
                current = next;
                continue;
            }
            "ZONE" if !path.is_empty() => {
                let name = current.field(1).unwrap_or("").to_string();
                let top = current.field(2).and_then(numbers::parse_float);
                let bottom = current.field(3).and_then(numbers::parse_float);
                let (next, info) = process_well_info(feed);
                if let (Some(top), Some(bottom)) = (top, bottom) {
                    let anchor = path[0];
                    for (suffix, depth) in [(" zone start", top), (" zone end", bottom)] {
                        let mut entry = info.clone();
                        entry.insert("depth".to_string(), depth.to_string());
                        labels.push(WellLabel {
                            name: format!("{name}{suffix}"),
                            position: [anchor[0], anchor[1], depth],
                            info: entry,
                        });
                    }
                }
                current = next;
                continue;
            }
            other => {
                tracing::trace!(keyword = other, "ignored well keyword");
            }
        }

        current = feed.next_line();
        if current.is_last || matches!(current.keyword(), "END" | "WELL_CURVE") {
            break;
        }
    }

    if let Some(collar) = collar {
        if !stations.is_empty() {
            path.extend(reconstruct_survey(collar, &stations));
        }
        // Drop the collar itself; it is a reference, not a path point.
        path.remove(0);
    } else if !stations.is_empty() {
        tracing::warn!(
            file = %state.filename,
            "survey stations without a WREF collar discarded"
        );
    }

    Ok(WellPath {
        path,
        labels,
        terminator: current,
    })
}

/// Collect `UNIT`/`FEATURE` detail lines that follow a marker or zone.
/// Returns the first line past the detail block.
fn process_well_info(feed: &mut LineFeed) -> (Line, FxHashMap<String, String>) {
    let mut units: Vec<String> = Vec::new();
    let mut features: Vec<String> = Vec::new();
    loop {
        let line = feed.next_line();
        let in_block = matches!(
            line.keyword(),
            "DIP" | "NORM" | "MREF" | "UNIT" | "NO_FEATURE" | "FEATURE"
        );
        if line.is_last || !in_block {
            let mut info = FxHashMap::default();
            if !units.is_empty() {
                info.insert("unit_names".to_string(), units.join(","));
            }
            if !features.is_empty() {
                info.insert("feature_names".to_string(), features.join(","));
            }
            return (line, info);
        }
        match line.keyword() {
            "UNIT" => {
                if let Some(names) = line.field(1) {
                    units.extend(names.split(',').map(str::to_string));
                }
            }
            "FEATURE" => {
                if let Some(names) = line.field(1) {
                    features.extend(names.split(',').map(str::to_string));
                }
            }
            _ => {}
        }
    }
}

/// Scan a `WELL_CURVE` block to its end; curve logs are not imported.
pub(crate) fn process_well_curve(feed: &mut LineFeed) -> bool {
    loop {
        let line = feed.next_line();
        if line.is_last {
            return true;
        }
        match line.keyword() {
            "END" | "END_CURVE" => return false,
            "PROPERTY" | "ZM_UNIT" | "INTERPOLATION" | "BLOCKED_INTERPOLATION_METHOD"
            | "NPTS" | "SEEK" => {}
            other if other.starts_with("LOG_FRAME_") => {}
            other => tracing::trace!(keyword = other, "ignored well-curve keyword"),
        }
    }
}
