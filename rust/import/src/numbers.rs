// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric field parsing.
//!
//! The exchange format writes C++ infinities in both their Windows
//! (`1.#INF`) and Unix (`INF`) spellings; these are supported values mapped
//! to the representable float extremes, not errors. A field that fails to
//! parse returns `None` so the caller can apply the per-line recovery rule.

/// Parse a float field, mapping infinity spellings to ±`f64::MAX`.
pub fn parse_float(field: &str) -> Option<f64> {
    match field {
        "1.#INF" | "INF" => return Some(f64::MAX),
        "-1.#INF" | "-INF" => return Some(f64::MIN),
        _ => {}
    }
    fast_float::parse(field).ok()
}

/// Parse a float field, treating a value equal to `no_data` as absent.
pub fn parse_float_or_no_data(field: &str, no_data: Option<f64>) -> Option<f64> {
    let value = parse_float(field)?;
    match no_data {
        Some(marker) if value == marker => None,
        _ => Some(value),
    }
}

/// Parse a signed integer field.
pub fn parse_int(field: &str) -> Option<i64> {
    lexical_core::parse(field.as_bytes()).ok()
}

/// Parse a sequence-number or index field.
pub fn parse_u32(field: &str) -> Option<u32> {
    lexical_core::parse(field.as_bytes()).ok()
}

/// Parse three float fields into an XYZ triple.
pub fn parse_xyz(x: &str, y: &str, z: &str) -> Option<[f64; 3]> {
    Some([parse_float(x)?, parse_float(y)?, parse_float(z)?])
}

/// Parse three integer fields.
pub fn parse_xyz_int(x: &str, y: &str, z: &str) -> Option<[i64; 3]> {
    Some([parse_int(x)?, parse_int(y)?, parse_int(z)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_floats_parse() {
        assert_eq!(parse_float("0.35482565307617187"), Some(0.35482565307617187));
        assert_eq!(parse_float("-9999"), Some(-9999.0));
    }

    #[test]
    fn infinity_spellings_map_to_extremes() {
        assert_eq!(parse_float("INF"), Some(f64::MAX));
        assert_eq!(parse_float("1.#INF"), Some(f64::MAX));
        assert_eq!(parse_float("-INF"), Some(f64::MIN));
        assert_eq!(parse_float("-1.#INF"), Some(f64::MIN));
    }

    #[test]
    fn malformed_fields_return_none() {
        assert_eq!(parse_float("BLAH"), None);
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_u32("-3"), None);
    }

    #[test]
    fn no_data_marker_suppresses_value() {
        assert_eq!(parse_float_or_no_data("-99998.0", Some(-99998.0)), None);
        assert_eq!(parse_float_or_no_data("-99998.0", None), Some(-99998.0));
        assert_eq!(parse_float_or_no_data("1.5", Some(-99998.0)), Some(1.5));
    }

    #[test]
    fn xyz_fails_as_a_unit() {
        assert_eq!(parse_xyz("1.0", "nope", "3.0"), None);
        assert_eq!(parse_xyz_int("1", "2", "3"), Some([1, 2, 3]));
    }
}
