// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Importer error taxonomy.
//!
//! Structural and encoding violations that would otherwise produce
//! silently-wrong geometry are fatal; isolated malformed numeric fields are
//! recovered per line inside the parser and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the import of one object.
#[derive(Debug, Error)]
pub enum Error {
    /// The file's first line matches no known object-type signature.
    #[error("unrecognized header {header:?} in {filename:?}")]
    UnrecognizedHeader { filename: String, header: String },

    /// An encoding this importer refuses to guess at: SEGY payloads, IBM
    /// floats, unknown binary storage types, oversized property elements.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Non-default coordinate system without the explicit override flag.
    #[error("coordinate system {0:?} is not DEFAULT and no override is configured")]
    NonDefaultCoordSystem(String),

    /// Declared dimensions imply a payload larger than the file on disk.
    #[error("binary payload in {path:?} is {actual} bytes, layout requires {required}")]
    BinaryLayoutMismatch {
        path: PathBuf,
        actual: u64,
        required: u64,
    },

    /// An atom referenced a vertex that has not been declared yet.
    #[error("atom {seq} references undeclared vertex {target}: {line:?}")]
    DanglingReference { seq: u32, target: u32, line: String },

    /// A volume object reached its binary-read step without `AXIS_N`.
    #[error("volume dimensions undefined in {filename:?}: missing AXIS_N")]
    MissingDimensions { filename: String },

    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
