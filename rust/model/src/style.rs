// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display style for imported objects: solid colours, indexed colour tables
//! and the label tables that accompany them.

use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An (R, G, B, A) colour with components in `0.0..=1.0`.
pub type Rgba = [f64; 4];

/// Default colour when an object declares none.
pub const WHITE_OPAQUE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// Style of one imported object or channel.
///
/// A channel either has a single solid colour or an indexed colour table;
/// `has_single_colour` reports which, in the order the entries were added.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Style {
    solid_colours: Vec<Rgba>,
    colour_tables: Vec<FxHashMap<i64, Rgba>>,
    label_tables: Vec<FxHashMap<i64, String>>,
    single_flags: Vec<bool>,
    /// Solid colour per named region of a volume.
    pub region_colours: FxHashMap<String, Rgba>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single solid colour entry.
    pub fn add_solid_colour(&mut self, rgba: Rgba) {
        self.solid_colours.push(rgba);
        self.single_flags.push(true);
    }

    /// Solid colour of entry `idx`, opaque white if absent.
    pub fn solid_colour(&self, idx: usize) -> Rgba {
        self.solid_colours.get(idx).copied().unwrap_or(WHITE_OPAQUE)
    }

    /// Add an indexed colour table with its label table.
    pub fn add_tables(&mut self, colours: FxHashMap<i64, Rgba>, labels: FxHashMap<i64, String>) {
        self.colour_tables.push(colours);
        self.label_tables.push(labels);
        self.single_flags.push(false);
    }

    /// True when entry `idx` is a single colour rather than a table.
    pub fn has_single_colour(&self, idx: usize) -> bool {
        self.single_flags.get(idx).copied().unwrap_or(true)
    }

    pub fn colour_table(&self, idx: usize) -> Option<&FxHashMap<i64, Rgba>> {
        self.colour_tables.get(idx)
    }

    pub fn label_table(&self, idx: usize) -> Option<&FxHashMap<i64, String>> {
        self.label_tables.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_opaque_white() {
        let style = Style::new();
        assert_eq!(style.solid_colour(0), WHITE_OPAQUE);
        assert!(style.has_single_colour(0));
        assert!(style.colour_table(0).is_none());
    }

    #[test]
    fn tables_flip_single_colour_flag() {
        let mut style = Style::new();
        let mut colours = FxHashMap::default();
        colours.insert(9, [0.909804, 0.564706, 0.203922, 1.0]);
        let mut labels = FxHashMap::default();
        labels.insert(9, "DOLERITE".to_string());
        style.add_tables(colours, labels);

        assert!(!style.has_single_colour(0));
        assert_eq!(
            style.colour_table(0).unwrap()[&9],
            [0.909804, 0.564706, 0.203922, 1.0]
        );
        assert_eq!(style.label_table(0).unwrap()[&9], "DOLERITE");
    }
}
