// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata carried alongside imported geometry: names, property channels,
//! rock-label tables, well labels and geological-feature classification.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of mapped geological feature an object represents.
///
/// Derived from the source's geological-type declaration: faults map to shear
/// displacement structures, intrusives to geological units, and boundaries,
/// unconformities and intraformational contacts to contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MappedFeature {
    #[default]
    Unknown,
    ShearDisplacementStructure,
    GeologicalUnit,
    Contact,
}

/// A point label along a well path, e.g. a marker or a zone boundary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WellLabel {
    pub name: String,
    pub position: [f64; 3],
    /// Free-form key/value details (depth, unit names, feature names).
    pub info: FxHashMap<String, String>,
}

/// Metadata of one imported object or channel.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    /// Object name, with any group prefix already applied.
    pub name: String,
    property_names: Vec<String>,
    /// True when the channel's values index a rock/colour table rather than
    /// measure a physical quantity.
    pub is_index_data: bool,
    /// Rock names keyed by channel value.
    pub rock_label_table: FxHashMap<i64, String>,
    /// Labels attached along a well path.
    pub labels: Vec<WellLabel>,
    /// Source file of a binary volume channel.
    pub src_filename: Option<PathBuf>,
    /// Name of the geological feature this object maps.
    pub feature_name: String,
    /// Numeric age range from a stratigraphic-position declaration.
    pub numeric_age_range: i64,
    pub mapped_feature: MappedFeature,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property_name(&mut self, name: impl Into<String>) {
        self.property_names.push(name.into());
    }

    /// Property/channel name at `idx`, empty if absent.
    pub fn property_name(&self, idx: usize) -> &str {
        self.property_names.get(idx).map_or("", String::as_str)
    }

    pub fn property_count(&self) -> usize {
        self.property_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_keep_insertion_order() {
        let mut meta = Metadata::new();
        meta.add_property_name("I");
        meta.add_property_name("J");
        assert_eq!(meta.property_name(0), "I");
        assert_eq!(meta.property_name(1), "J");
        assert_eq!(meta.property_name(2), "");
        assert_eq!(meta.property_count(), 2);
    }
}
