// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `HEADER { ... }` and `GOCAD_ORIGINAL_COORDINATE_SYSTEM { ... }` block
//! readers, plus the colour and axis-unit field grammars.

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, multispace0, multispace1},
    combinator::{map, map_res, opt},
    number::complete::double,
    sequence::{preceded, tuple},
    IResult,
};

use gocad_lite_model::{Rgba, WHITE_OPAQUE};

use crate::error::{Error, Result};
use crate::keywords::Control;
use crate::lexer::{Line, LineFeed};
use crate::state::ParserState;

/// Units accepted without comment besides `KM`.
const PLAIN_UNITS: [&str; 5] = ["M", "UNITLESS", "NUMBER", "MS", "NONE"];

fn hex_channel(input: &str) -> IResult<&str, f64> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |s: &str| u8::from_str_radix(s, 16).map(|v| f64::from(v) / 255.0),
    )(input)
}

fn hex_colour(input: &str) -> IResult<&str, Rgba> {
    map(
        preceded(char('#'), tuple((hex_channel, hex_channel, hex_channel))),
        |(r, g, b)| [r, g, b, 1.0],
    )(input)
}

fn float_colour(input: &str) -> IResult<&str, Rgba> {
    map(
        tuple((
            preceded(multispace0, double),
            preceded(multispace1, double),
            preceded(multispace1, double),
            opt(preceded(multispace1, double)),
        )),
        |(r, g, b, a)| [r, g, b, a.unwrap_or(1.0)],
    )(input)
}

/// Parse a colour value: `#RRGGBB` hex, or 3 or 4 spaced floats.
pub(crate) fn parse_colour(value: &str) -> Option<Rgba> {
    alt((hex_colour, float_colour))(value.trim())
        .ok()
        .map(|(_, rgba)| rgba)
}

/// Read the `HEADER { ... }` block: solid/line/atoms colours, per-region
/// colours and the object name.
pub(crate) fn process_header(state: &mut ParserState, feed: &mut LineFeed) -> Result<Control> {
    loop {
        let line = feed.next_line();
        if line.is_last {
            return Ok(Control::Done);
        }
        if line.keyword() == "}" {
            return Ok(Control::Continue);
        }

        let Some((name, value)) = line.text.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        match name {
            "*SOLID*COLOR" | "*ATOMS*COLOR" | "*LINE*COLOR" => {
                state.seed_style.add_solid_colour(colour_or_white(value));
            }
            "NAME" => {
                // Embedded slashes would collide with path handling downstream.
                state.header_name = value.replace('/', "-");
            }
            _ => {
                if let Some(region) = region_colour_name(name) {
                    state
                        .seed_style
                        .region_colours
                        .insert(region.to_string(), colour_or_white(value));
                }
            }
        }
    }
}

fn colour_or_white(value: &str) -> Rgba {
    parse_colour(value).unwrap_or_else(|| {
        tracing::warn!(value, "unparseable colour, using opaque white");
        WHITE_OPAQUE
    })
}

/// Region name of a `*REGIONS*<name>*SOLID*COLOR` attribute.
fn region_colour_name(name: &str) -> Option<&str> {
    name.strip_prefix("*REGIONS*")?.strip_suffix("*SOLID*COLOR")
}

/// Read the `GOCAD_ORIGINAL_COORDINATE_SYSTEM { ... }` block.
///
/// A non-`DEFAULT` coordinate system is rejected unless the configuration
/// explicitly allows it; guessing at an unknown CRS would produce
/// silently-misplaced geometry.
pub(crate) fn process_coord_sys(state: &mut ParserState, feed: &mut LineFeed) -> Result<Control> {
    loop {
        let line = feed.next_line();
        if line.is_last {
            return Ok(Control::Done);
        }
        match line.keyword() {
            "END_ORIGINAL_COORDINATE_SYSTEM" => {
                tracing::debug!(
                    coord_sys = %state.coord_sys_name,
                    default = state.uses_default_coords,
                    invert_z = state.invert_z,
                    units = ?state.xyz_unit,
                    "coordinate system block complete"
                );
                return Ok(Control::Continue);
            }
            "NAME" => {
                let Some(name) = line.field(1) else { continue };
                state.coord_sys_name = name.to_string();
                if name != "DEFAULT" {
                    state.uses_default_coords = false;
                    if !state.cfg.allow_nondefault_crs {
                        return Err(Error::NonDefaultCoordSystem(name.to_string()));
                    }
                    tracing::warn!(coord_sys = name, "accepting non-default coordinate system");
                }
            }
            "ZPOSITIVE" => {
                if line.field(1) == Some("DEPTH") {
                    state.invert_z = true;
                }
            }
            "AXIS_UNIT" => parse_axis_unit(state, &line),
            _ => {}
        }
    }
}

/// Apply an `AXIS_UNIT "km" "km" "m"` line: kilometre axes get a ×1000
/// multiplier, unknown non-metric units warn but do not fail.
pub(crate) fn parse_axis_unit(state: &mut ParserState, line: &Line) {
    for axis in 0..3 {
        let Some(field) = line.field(axis + 1) else {
            continue;
        };
        let unit = field.trim_matches(|c| c == '"' || c == '\'' || c == ' ');
        if unit == "KM" {
            state.xyz_mult[axis] = 1000.0;
        } else if !PLAIN_UNITS.contains(&unit) {
            tracing::warn!(axis, unit, "nonstandard axis unit");
        } else {
            state.xyz_unit[axis] = Some(unit.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::ImportConfig;
    use crate::lexer::FileKind;

    fn state_and_feed<'a>(
        cfg: &'a ImportConfig,
        body: &str,
    ) -> (ParserState<'a>, LineFeed) {
        let lines: Vec<String> = body.lines().map(str::to_string).collect();
        let state = ParserState::new(cfg, std::path::Path::new("."), "test.ts", FileKind::Surface);
        (state, LineFeed::new(&lines))
    }

    #[test]
    fn hex_colour_matches_reference_grey() {
        let grey = parse_colour("#808080").unwrap();
        assert_eq!(
            grey,
            [
                0.5019607843137255,
                0.5019607843137255,
                0.5019607843137255,
                1.0
            ]
        );
    }

    #[test]
    fn float_colours_parse_with_and_without_alpha() {
        assert_eq!(parse_colour("0.0 0.5 1.0"), Some([0.0, 0.5, 1.0, 1.0]));
        assert_eq!(
            parse_colour("0.486275 0.596078 0.827451 0.9"),
            Some([0.486275, 0.596078, 0.827451, 0.9])
        );
        assert_eq!(parse_colour("not a colour"), None);
    }

    #[test]
    fn header_block_collects_colours_and_name() {
        let cfg = ImportConfig::default();
        let (mut state, mut feed) = state_and_feed(
            &cfg,
            "name: TESTING12/3\n\
             *solid*color: #808080\n\
             *regions*QUARTZ*solid*color: 0.641993 0.756863 0.629236\n\
             }\n\
             VRTX 1 0 0 0",
        );
        let ctl = process_header(&mut state, &mut feed).unwrap();
        assert!(matches!(ctl, Control::Continue));
        assert_eq!(state.header_name, "TESTING12-3");
        assert_eq!(state.seed_style.solid_colour(0)[0], 0.5019607843137255);
        assert_eq!(
            state.seed_style.region_colours["QUARTZ"],
            [0.641993, 0.756863, 0.629236, 1.0]
        );
    }

    #[test]
    fn nondefault_coord_system_is_a_policy_error() {
        let cfg = ImportConfig::default();
        let (mut state, mut feed) = state_and_feed(
            &cfg,
            "NAME GDA94_MGA_ZONE54\nEND_ORIGINAL_COORDINATE_SYSTEM\nEND",
        );
        assert!(matches!(
            process_coord_sys(&mut state, &mut feed),
            Err(Error::NonDefaultCoordSystem(_))
        ));
    }

    #[test]
    fn nondefault_coord_system_passes_with_override() {
        let cfg = ImportConfig {
            allow_nondefault_crs: true,
            ..ImportConfig::default()
        };
        let (mut state, mut feed) = state_and_feed(
            &cfg,
            "NAME GDA94_MGA_ZONE54\nEND_ORIGINAL_COORDINATE_SYSTEM\nEND",
        );
        assert!(process_coord_sys(&mut state, &mut feed).is_ok());
        assert_eq!(state.coord_sys_name, "GDA94_MGA_ZONE54");
        assert!(!state.uses_default_coords);
    }

    #[test]
    fn metre_units_record_without_scaling() {
        let cfg = ImportConfig::default();
        let (mut state, mut feed) = state_and_feed(
            &cfg,
            "AXIS_UNIT \"m\" \"m\" \"m\"\nEND_ORIGINAL_COORDINATE_SYSTEM\nEND",
        );
        process_coord_sys(&mut state, &mut feed).unwrap();
        assert_eq!(state.xyz_mult, [1.0, 1.0, 1.0]);
        assert_eq!(state.xyz_unit, [Some("M".into()), Some("M".into()), Some("M".into())]);
    }

    #[test]
    fn depth_positive_z_and_km_units_register() {
        let cfg = ImportConfig::default();
        let (mut state, mut feed) = state_and_feed(
            &cfg,
            "NAME DEFAULT\n\
             AXIS_UNIT \"km\" \"km\" \"km\"\n\
             ZPOSITIVE DEPTH\n\
             END_ORIGINAL_COORDINATE_SYSTEM\n\
             END",
        );
        process_coord_sys(&mut state, &mut feed).unwrap();
        assert!(state.invert_z);
        assert_eq!(state.xyz_mult, [1000.0, 1000.0, 1000.0]);
    }
}
