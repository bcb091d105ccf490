// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lexical front end.
//!
//! Produces, for each source line, an upper-cased quote-folded field array
//! for keyword matching, a case-preserving field array for filenames and
//! labels, the folded upper-cased line, and an end-of-stream flag. Also
//! classifies files from their first-line header marker and splits files
//! holding several concatenated objects into per-object line groups.

use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// The object types the importer understands, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.ts` — triangulated surface.
    Surface,
    /// `.vs` — point set.
    PointSet,
    /// `.pl` — polyline.
    PolyLine,
    /// `.wl` — well.
    Well,
    /// `.vo` — regular voxel volume.
    Voxet,
    /// `.sg` — structured grid volume with a companion points file.
    SGrid,
    /// `.gp` — group of member objects.
    Group,
}

const ALL_KINDS: [FileKind; 7] = [
    FileKind::Surface,
    FileKind::PointSet,
    FileKind::PolyLine,
    FileKind::Well,
    FileKind::Voxet,
    FileKind::SGrid,
    FileKind::Group,
];

impl FileKind {
    /// First-line header markers for this kind.
    pub fn header_markers(self) -> &'static [&'static str] {
        match self {
            FileKind::Surface => &["GOCAD TSURF 1"],
            FileKind::PointSet => &["GOCAD VSET 1"],
            FileKind::PolyLine => &["GOCAD PLINE 1"],
            FileKind::Well => &["GOCAD WELL 1"],
            FileKind::Voxet => &["GOCAD VOXET 1"],
            FileKind::SGrid => &["GOCAD SGRID 1"],
            FileKind::Group => &["GOCAD HETEROGENEOUSGROUP 1", "GOCAD HOMOGENEOUSGROUP 1"],
        }
    }

    /// Kind for an upper-cased file extension without the dot.
    pub fn from_extension(ext: &str) -> Option<FileKind> {
        match ext {
            "TS" => Some(FileKind::Surface),
            "VS" => Some(FileKind::PointSet),
            "PL" => Some(FileKind::PolyLine),
            "WL" => Some(FileKind::Well),
            "VO" => Some(FileKind::Voxet),
            "SG" => Some(FileKind::SGrid),
            "GP" => Some(FileKind::Group),
            _ => None,
        }
    }

    /// Kind whose header marker matches an upper-cased, trimmed first line.
    pub fn from_header(first_line: &str) -> Option<FileKind> {
        ALL_KINDS
            .into_iter()
            .find(|kind| kind.header_markers().contains(&first_line))
    }

    /// True for the kinds that carry binary volume payloads.
    pub fn is_volume(self) -> bool {
        matches!(self, FileKind::Voxet | FileKind::SGrid)
    }
}

/// Upper-cased extension of a filename, without the dot.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_uppercase())
        .unwrap_or_default()
}

/// True iff the line is a group-file header marker.
pub fn is_group_header(line: &str) -> bool {
    let trimmed = normalize(line);
    FileKind::Group.header_markers().contains(&trimmed.as_str())
}

/// Classify a file from its extension and first line.
///
/// Inside a group file the member object carries its own header with the
/// group's extension, so a `.gp` extension re-derives the contained kind from
/// the member's first line. Unrecognized header text is a hard failure.
pub fn detect_kind(filename: &str, first_line: &str) -> Result<FileKind> {
    let header = normalize(first_line);
    let unrecognized = || Error::UnrecognizedHeader {
        filename: filename.to_string(),
        header: header.clone(),
    };

    let ext_kind = FileKind::from_extension(&extension_of(filename)).ok_or_else(unrecognized)?;
    let header_kind = FileKind::from_header(&header).ok_or_else(unrecognized)?;

    if ext_kind == header_kind || ext_kind == FileKind::Group {
        Ok(header_kind)
    } else {
        Err(unrecognized())
    }
}

/// Upper-case a line and strip trailing spaces and line terminators.
pub(crate) fn normalize(line: &str) -> String {
    line.trim_end_matches([' ', '\n', '\r']).to_uppercase()
}

/// Fold every `"quoted label"` into a single underscored token so embedded
/// spaces do not break field counting.
fn fold_quotes(line: &str) -> String {
    let mut text = line.to_string();
    loop {
        let bytes = text.as_bytes();
        let Some(open) = memchr::memchr(b'"', bytes) else {
            break;
        };
        let Some(close) = memchr::memchr(b'"', &bytes[open + 1..]).map(|i| open + 1 + i) else {
            break;
        };
        let inner = text[open + 1..close].trim().replace(' ', "_");
        let mut folded = String::with_capacity(text.len());
        folded.push_str(&text[..open]);
        folded.push(' ');
        folded.push_str(&inner);
        folded.push(' ');
        folded.push_str(&text[close + 1..]);
        text = folded;
    }
    text
}

/// One tokenized source line.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Upper-cased, quote-folded fields for keyword matching.
    pub fields: SmallVec<[String; 8]>,
    /// Case-preserving fields for filenames and labels.
    pub raw_fields: SmallVec<[String; 8]>,
    /// The full upper-cased, quote-folded line.
    pub text: String,
    /// True on the file's final line and on the end-of-stream sentinel.
    pub is_last: bool,
}

impl Line {
    /// First field, empty on the sentinel.
    pub fn keyword(&self) -> &str {
        self.fields.first().map_or("", String::as_str)
    }

    pub fn field(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    pub fn raw_field(&self, idx: usize) -> Option<&str> {
        self.raw_fields.get(idx).map(String::as_str)
    }

    /// End-of-stream marker with no fields.
    pub(crate) fn sentinel() -> Line {
        Line {
            is_last: true,
            ..Line::default()
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.is_last && self.fields.is_empty()
    }
}

/// Tokenize one raw line; blank lines yield `None`.
fn tokenize(raw: &str) -> Option<Line> {
    let text = fold_quotes(&normalize(raw));
    let fields: SmallVec<[String; 8]> = text.split_whitespace().map(str::to_string).collect();
    if fields.is_empty() {
        return None;
    }
    let raw_fields = raw
        .trim_end_matches([' ', '\n', '\r'])
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Some(Line {
        fields,
        raw_fields,
        text,
        is_last: false,
    })
}

/// Pull cursor over the tokenized lines of one object.
///
/// The final real line carries `is_last`; after exhaustion the feed keeps
/// yielding the empty sentinel so nested block readers can always pull one
/// more line.
#[derive(Debug)]
pub struct LineFeed {
    lines: VecDeque<Line>,
}

impl LineFeed {
    pub fn new<S: AsRef<str>>(file_lines: &[S]) -> Self {
        let mut lines: VecDeque<Line> = file_lines
            .iter()
            .filter_map(|l| tokenize(l.as_ref()))
            .collect();
        if let Some(last) = lines.back_mut() {
            last.is_last = true;
        }
        Self { lines }
    }

    /// Next tokenized line, or the sentinel once the input is exhausted.
    pub fn next_line(&mut self) -> Line {
        self.lines.pop_front().unwrap_or_else(Line::sentinel)
    }
}

/// Split a file holding several concatenated objects into per-object line
/// groups. An object runs from a header marker to its matching `END`.
pub fn split_objects(file_lines: &[String]) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut part: Vec<String> = Vec::new();
    let mut in_object = false;
    for line in file_lines {
        let upper = normalize(line);
        if !in_object {
            if FileKind::from_header(&upper).is_some() {
                in_object = true;
                part.push(line.clone());
            }
        } else {
            part.push(line.clone());
            if upper == "END" {
                in_object = false;
                groups.push(std::mem::take(&mut part));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    #[test]
    fn quoted_labels_fold_to_single_tokens() {
        let line = tokenize("name: \"BLAH 1 2\"").unwrap();
        assert_eq!(line.fields.as_slice(), ["NAME:", "BLAH_1_2"]);
    }

    #[test]
    fn axis_unit_quotes_fold_per_field() {
        let line = tokenize("AXIS_UNIT \" m\" \"m\" \"m\"").unwrap();
        assert_eq!(line.fields.as_slice(), ["AXIS_UNIT", "M", "M", "M"]);
    }

    #[test]
    fn raw_fields_preserve_case() {
        let line = tokenize("PROP_FILE 1 Tiny_Voxet@@").unwrap();
        assert_eq!(line.fields[2], "TINY_VOXET@@");
        assert_eq!(line.raw_fields[2], "Tiny_Voxet@@");
    }

    #[test]
    fn feed_marks_last_line_and_yields_sentinel() {
        let mut feed = LineFeed::new(&lines("GOCAD TSURF 1\n\nEND"));
        assert!(!feed.next_line().is_last);
        let end = feed.next_line();
        assert_eq!(end.keyword(), "END");
        assert!(end.is_last);
        assert!(feed.next_line().is_sentinel());
        assert!(feed.next_line().is_sentinel());
    }

    #[test]
    fn detects_each_kind_from_extension_and_header() {
        assert_eq!(
            detect_kind("model.ts", "GOCAD TSURF 1").unwrap(),
            FileKind::Surface
        );
        assert_eq!(
            detect_kind("model.sg", "GOCAD SGRID 1").unwrap(),
            FileKind::SGrid
        );
        assert_eq!(
            detect_kind("model.gp", "GOCAD HOMOGENEOUSGROUP 1").unwrap(),
            FileKind::Group
        );
        // Members inside a group file carry the group's extension.
        assert_eq!(
            detect_kind("model.gp", "GOCAD PLINE 1").unwrap(),
            FileKind::PolyLine
        );
    }

    #[test]
    fn mismatched_or_unknown_headers_are_fatal() {
        assert!(matches!(
            detect_kind("model.ts", "GOCAD VSET 1"),
            Err(Error::UnrecognizedHeader { .. })
        ));
        assert!(matches!(
            detect_kind("model.ts", "NOT A HEADER"),
            Err(Error::UnrecognizedHeader { .. })
        ));
        assert!(matches!(
            detect_kind("model.xyz", "GOCAD TSURF 1"),
            Err(Error::UnrecognizedHeader { .. })
        ));
    }

    #[test]
    fn split_objects_pairs_headers_with_end() {
        let src = "\
GOCAD TSURF 1
VRTX 1 0 0 0
END
ignored trailer
GOCAD PLINE 1
END";
        let groups = split_objects(&lines(src));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0][0], "GOCAD TSURF 1");
        assert_eq!(groups[1][0], "GOCAD PLINE 1");
    }
}
