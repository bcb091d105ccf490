// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keyword classification for the dispatch loop.
//!
//! Every line's first token is classified into a [`Keyword`] variant and
//! matched exhaustively by the orchestrator; an unknown keyword lands in the
//! explicit `Unknown` arm instead of silently falling through a chain of
//! string comparisons. Classification is kind-aware: well files only react to
//! well keywords past the shared header/property block, and volume keywords
//! only exist for voxel and structured-grid files.

use crate::lexer::{FileKind, Line};

/// What the dispatch loop should do after a handler returns.
#[derive(Debug)]
pub(crate) enum Control {
    /// Pull the next line.
    Continue,
    /// Re-dispatch this line; block handlers return their one-line lookahead
    /// this way.
    Retry(Line),
    /// End of this object's text.
    Done,
}

/// Classified first token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    /// Subset/control-node keywords that carry no geometry.
    Skip,
    Header,
    CoordSys,
    PropClassHeader,
    /// `PROPERTIES` / `PROPERTY_CLASSES`: declare the local channels.
    Properties,
    Esizes,
    NoDataValues,
    /// `WREF` / `PATH_ZM_UNIT`: starts the ASCII well-path block.
    WellPath,
    WellCurve,
    /// Well data-file pointers this importer acknowledges and ignores.
    WellFile,
    Vertex { with_props: bool },
    Atom { with_props: bool },
    Triangle,
    Segment,
    StratigraphicPosition,
    GeologicalFeature,
    GeologicalType,
    PropertySubclass,
    PropFile,
    PropEsize,
    PropStorageType,
    PropSigned,
    PropEtype,
    PropEformat,
    PropOffset,
    PropNoDataValue,
    /// Volume axis/flags/region/points descriptors.
    Volume,
    Unknown,
}

impl Keyword {
    pub(crate) fn classify(token: &str, kind: FileKind) -> Keyword {
        // Shared keywords, live for every object kind.
        match token {
            "SUBVSET" | "ILINE" | "TFACE" | "TVOLUME" | "CNP" => return Keyword::Skip,
            "HEADER" => return Keyword::Header,
            "GOCAD_ORIGINAL_COORDINATE_SYSTEM" => return Keyword::CoordSys,
            "PROPERTY_CLASS_HEADER" => return Keyword::PropClassHeader,
            "PROPERTIES" | "PROPERTY_CLASSES" => return Keyword::Properties,
            "ESIZES" => return Keyword::Esizes,
            "NO_DATA_VALUES" => return Keyword::NoDataValues,
            _ => {}
        }

        // Well files react to nothing else but their own block starters.
        if kind == FileKind::Well {
            return match token {
                "PATH_ZM_UNIT" | "WREF" => Keyword::WellPath,
                "WELL_CURVE" => Keyword::WellCurve,
                "BINARY_DATA_FILE" | "WP_CATALOG_FILE" => Keyword::WellFile,
                _ => Keyword::Unknown,
            };
        }

        if kind.is_volume() && is_volume_token(token) {
            return Keyword::Volume;
        }

        match token {
            "VRTX" => Keyword::Vertex { with_props: false },
            "PVRTX" => Keyword::Vertex { with_props: true },
            "ATOM" => Keyword::Atom { with_props: false },
            "PATOM" => Keyword::Atom { with_props: true },
            "TRGL" => Keyword::Triangle,
            "SEG" => Keyword::Segment,
            "STRATIGRAPHIC_POSITION" => Keyword::StratigraphicPosition,
            "GEOLOGICAL_FEATURE" => Keyword::GeologicalFeature,
            "GEOLOGICAL_TYPE" => Keyword::GeologicalType,
            "PROPERTY_SUBCLASS" => Keyword::PropertySubclass,
            "PROP_FILE" => Keyword::PropFile,
            "PROP_ESIZE" => Keyword::PropEsize,
            "PROP_STORAGE_TYPE" => Keyword::PropStorageType,
            "PROP_SIGNED" => Keyword::PropSigned,
            "PROP_ETYPE" => Keyword::PropEtype,
            "PROP_EFORMAT" => Keyword::PropEformat,
            "PROP_OFFSET" => Keyword::PropOffset,
            "PROP_NO_DATA_VALUE" => Keyword::PropNoDataValue,
            _ => Keyword::Unknown,
        }
    }
}

fn is_volume_token(token: &str) -> bool {
    token.starts_with("AXIS_")
        || token.starts_with("FLAGS_")
        || token.starts_with("REGION_FLAGS_")
        || token == "REGION"
        || token == "POINTS_FILE"
        || token == "POINTS_OFFSET"
        || token == "PROP_ALIGNMENT"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_files_gate_off_generic_geometry() {
        assert_eq!(
            Keyword::classify("VRTX", FileKind::Well),
            Keyword::Unknown
        );
        assert_eq!(
            Keyword::classify("WREF", FileKind::Well),
            Keyword::WellPath
        );
        assert_eq!(
            Keyword::classify("VRTX", FileKind::Surface),
            Keyword::Vertex { with_props: false }
        );
        // The shared header block still applies to wells.
        assert_eq!(Keyword::classify("HEADER", FileKind::Well), Keyword::Header);
    }

    #[test]
    fn volume_tokens_require_a_volume_kind() {
        assert_eq!(Keyword::classify("AXIS_O", FileKind::Voxet), Keyword::Volume);
        assert_eq!(Keyword::classify("REGION", FileKind::SGrid), Keyword::Volume);
        assert_eq!(
            Keyword::classify("POINTS_FILE", FileKind::SGrid),
            Keyword::Volume
        );
        assert_eq!(
            Keyword::classify("AXIS_O", FileKind::Surface),
            Keyword::Unknown
        );
    }
}
