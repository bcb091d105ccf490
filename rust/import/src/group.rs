// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group-file handling.
//!
//! A group file wraps member objects between `BEGIN_MEMBERS`/`END_MEMBERS`.
//! Each member is a complete object of its own kind and is handed to a fresh
//! orchestrator run; the group header's colours are inherited into every
//! member's seed style, and the group's name prefixes every member's object
//! name. Members have no data dependency on each other and are parsed in
//! parallel. A nested group header never opens a member of its own, so its
//! leaf objects surface through the enclosing group.

use std::path::Path;

use rayon::prelude::*;

use gocad_lite_model::Style;

use crate::error::{Error, Result};
use crate::header;
use crate::importer::{ImportedObject, Importer};
use crate::lexer::{is_group_header, normalize, FileKind, LineFeed};
use crate::state::ParserState;

/// Style and naming context a group passes down to its members.
pub(crate) struct GroupContext {
    pub name: String,
    pub style: Style,
}

/// Explode a group file and import every member.
pub(crate) fn extract_group(
    importer: &Importer,
    src_dir: &Path,
    filename: &str,
    lines: &[String],
) -> Result<Vec<ImportedObject>> {
    let first = lines.first().map(String::as_str).unwrap_or("");
    if !is_group_header(first) {
        return Err(Error::UnrecognizedHeader {
            filename: filename.to_string(),
            header: normalize(first),
        });
    }

    let mut members: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut group_header_at: Option<usize> = None;
    let mut in_member = false;
    let mut in_object = false;

    for (idx, line) in lines.iter().enumerate() {
        let upper = normalize(line);
        let first_token = upper.split_whitespace().next().unwrap_or("");

        if upper == "BEGIN_MEMBERS"
            && lines.get(idx + 1).is_some_and(|next| !is_group_header(next))
        {
            in_member = true;
        } else if upper == "END_MEMBERS" {
            in_member = false;
        } else if in_member && first_token == "GOCAD" {
            in_object = true;
        } else if in_member && upper == "END" {
            in_object = false;
            if !current.is_empty() {
                members.push(std::mem::take(&mut current));
            }
        } else if !in_member && !in_object && first_token == "HEADER" {
            group_header_at = Some(idx);
        }

        if in_member && in_object {
            current.push(line.clone());
        }
    }

    // Harvest the group's own header so members inherit its colours.
    let mut group_style = Style::new();
    if let Some(idx) = group_header_at {
        let mut scratch = ParserState::new(&importer.cfg, src_dir, filename, FileKind::Group);
        let mut feed = LineFeed::new(&lines[idx..]);
        let _header_line = feed.next_line();
        header::process_header(&mut scratch, &mut feed)?;
        group_style = scratch.seed_style;
    }

    let group_name = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem)
        .to_uppercase();
    let context = GroupContext {
        name: group_name,
        style: group_style,
    };

    tracing::info!(filename, members = members.len(), "exploding group file");

    let results: Vec<Result<Vec<ImportedObject>>> = members
        .par_iter()
        .map(|member| importer.import_object(src_dir, filename, member, Some(&context)))
        .collect();

    let mut out = Vec::new();
    for result in results {
        match result {
            Ok(objects) => out.extend(objects),
            // A member of unknown type is skipped; everything else aborts
            // the whole group.
            Err(Error::UnrecognizedHeader { filename, header }) => {
                tracing::warn!(%filename, %header, "skipping unrecognized group member");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::ImportConfig;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    const GROUP_SRC: &str = "\
GOCAD HETEROGENEOUSGROUP 1
HEADER {
name: TEST033
*solid*color: 0.0 0.5 1.0
}
BEGIN_MEMBERS
GOCAD VSET 1
HEADER {
name: TEST-1
}
VRTX 1 856665.6796875 6091995.966796875 77.90100860595703
END
GOCAD PLINE 1
HEADER {
name: TEST-2
}
VRTX 1 0.0 0.0 0.0
VRTX 2 1.0 0.0 0.0
SEG 1 2
END
END_MEMBERS";

    #[test]
    fn group_members_import_with_inherited_style_and_prefix() {
        let importer = Importer::new(ImportConfig::default());
        let objects = extract_group(
            &importer,
            Path::new("."),
            "test033.gp",
            &lines(GROUP_SRC),
        )
        .unwrap();

        assert_eq!(objects.len(), 2);
        let point_set = &objects[0];
        assert_eq!(
            point_set.geometry.vertices[0].xyz,
            [856665.6796875, 6091995.966796875, 77.90100860595703]
        );
        assert_eq!(point_set.metadata.name, "TEST033-TEST-1");
        // Group colour inherited, member colour appended after it.
        assert_eq!(point_set.style.solid_colour(0), [0.0, 0.5, 1.0, 1.0]);

        let polyline = &objects[1];
        assert_eq!(polyline.metadata.name, "TEST033-TEST-2");
        assert!(polyline.geometry.is_line());
    }

    #[test]
    fn non_group_first_line_is_fatal() {
        let importer = Importer::new(ImportConfig::default());
        let err = extract_group(
            &importer,
            Path::new("."),
            "test.gp",
            &lines("GOCAD TSURF 1\nEND"),
        );
        assert!(matches!(err, Err(Error::UnrecognizedHeader { .. })));
    }

    #[test]
    fn unknown_member_kind_is_skipped_not_fatal() {
        let src = "\
GOCAD HOMOGENEOUSGROUP 1
BEGIN_MEMBERS
GOCAD MYSTERY 1
VRTX 1 0 0 0
END
GOCAD VSET 1
VRTX 1 1 2 3
END
END_MEMBERS";
        let importer = Importer::new(ImportConfig::default());
        let objects = extract_group(&importer, Path::new("."), "g.gp", &lines(src)).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].geometry.vertices[0].xyz, [1.0, 2.0, 3.0]);
    }
}
