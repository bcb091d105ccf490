// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # GOCAD-Lite Model
//!
//! Format-independent domain model for parts of a 3-D geological model:
//! geometry (vertices, atoms, triangles, segments, voxel/structured-grid
//! volumes), display style (solid colours and indexed colour tables) and
//! metadata (names, property channels, geological-feature classification).
//!
//! Importers produce one `(ModelGeometry, Style, Metadata)` triple per source
//! object, or one per property/volume channel when an object carries several.
//! Every triple is an independent owned value; nothing is shared or mutated
//! after construction.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for all model types

pub mod geometry;
pub mod metadata;
pub mod style;
pub mod types;

pub use geometry::{
    Bounds, ChannelStats, ModelGeometry, PropValue, Volume, VolumeData, VolumeDataType, XyzMap,
};
pub use metadata::{MappedFeature, Metadata, WellLabel};
pub use style::{Rgba, Style, WHITE_OPAQUE};
pub use types::{Atom, PointKey, Segment, Triangle, Vertex};
