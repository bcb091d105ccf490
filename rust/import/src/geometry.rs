// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry assembly: vertex, atom, triangle and segment handlers, and the
//! sequence-number remap that makes gapped or out-of-order declarations safe
//! to consume downstream.
//!
//! Declared sequence numbers need not be contiguous. A malformed numeric
//! field rolls the sequence counter back and skips the line; a dangling atom
//! reference is fatal.

use rustc_hash::FxHashMap;

use gocad_lite_model::{Atom, Segment, Triangle, Vertex};

use crate::error::{Error, Result};
use crate::keywords::Control;
use crate::lexer::Line;
use crate::numbers;
use crate::props::assign_local_props;
use crate::state::ParserState;

/// Handle a `VRTX`/`PVRTX` line: unit-scale, invert z if declared, offset by
/// the configured base, then store. `PVRTX` also attaches inline properties
/// keyed by the stored coordinates.
pub(crate) fn handle_vertex(
    state: &mut ParserState,
    line: &Line,
    with_props: bool,
) -> Result<Control> {
    let prev_seq = state.seq_no;
    let parsed = (|| {
        let seq = numbers::parse_u32(line.field(1)?)?;
        let xyz = numbers::parse_xyz(line.field(2)?, line.field(3)?, line.field(4)?)?;
        Some((seq, xyz))
    })();
    let Some((seq, xyz)) = parsed else {
        state.seq_no = prev_seq;
        tracing::warn!(line = %line.text, "malformed vertex line skipped");
        return Ok(Control::Continue);
    };
    state.seq_no = seq;

    let mut xyz = state.scale_xyz(xyz);
    if state.invert_z {
        xyz[2] = -xyz[2];
    }
    for axis in 0..3 {
        xyz[axis] += state.cfg.base_xyz[axis];
    }
    state.push_vertex(seq, xyz);

    if with_props {
        assign_local_props(&mut state.local_props, line, 5, xyz)?;
    }
    Ok(Control::Continue)
}

/// Handle an `ATOM`/`PATOM` line. The target vertex must already exist;
/// `PATOM` properties are keyed through the aliased vertex's coordinates.
pub(crate) fn handle_atom(
    state: &mut ParserState,
    line: &Line,
    with_props: bool,
) -> Result<Control> {
    let prev_seq = state.seq_no;
    let parsed = (|| {
        let seq = numbers::parse_u32(line.field(1)?)?;
        let target = numbers::parse_u32(line.field(2)?)?;
        Some((seq, target))
    })();
    let Some((seq, target)) = parsed else {
        state.seq_no = prev_seq;
        tracing::warn!(line = %line.text, "malformed atom line skipped");
        return Ok(Control::Continue);
    };
    state.seq_no = seq;

    let Some(coords) = state.vertex_coords(target) else {
        return Err(Error::DanglingReference {
            seq,
            target,
            line: line.text.clone(),
        });
    };
    state.atoms.push(Atom { seq, target });

    if with_props {
        assign_local_props(&mut state.local_props, line, 3, coords)?;
    }
    Ok(Control::Continue)
}

/// Handle a `TRGL a b c` line. The first corner doubles as the running
/// sequence number.
pub(crate) fn handle_triangle(state: &mut ParserState, line: &Line) -> Result<Control> {
    let prev_seq = state.seq_no;
    let parsed = (|| {
        let a = numbers::parse_u32(line.field(1)?)?;
        let b = numbers::parse_u32(line.field(2)?)?;
        let c = numbers::parse_u32(line.field(3)?)?;
        Some([a, b, c])
    })();
    let Some(abc) = parsed else {
        state.seq_no = prev_seq;
        tracing::warn!(line = %line.text, "malformed triangle line skipped");
        return Ok(Control::Continue);
    };
    state.seq_no = abc[0];
    state.triangles.push(Triangle { seq: abc[0], abc });
    Ok(Control::Continue)
}

/// Handle a `SEG a b` line.
pub(crate) fn handle_segment(state: &mut ParserState, line: &Line) -> Result<Control> {
    let parsed = (|| {
        let a = numbers::parse_u32(line.field(1)?)?;
        let b = numbers::parse_u32(line.field(2)?)?;
        Some([a, b])
    })();
    match parsed {
        Some(ab) => state.segments.push(Segment { ab }),
        None => tracing::warn!(line = %line.text, "malformed segment line skipped"),
    }
    Ok(Control::Continue)
}

/// Map every declared sequence number to its 1-based insertion position.
/// Atoms resolve through their target vertex's position.
pub(crate) fn build_remap(state: &ParserState) -> FxHashMap<u32, u32> {
    let mut map = FxHashMap::default();
    for (idx, vertex) in state.vertices.iter().enumerate() {
        map.insert(vertex.seq, (idx + 1) as u32);
    }
    for atom in &state.atoms {
        if let Some(&target_pos) = map.get(&atom.target) {
            map.insert(atom.seq, target_pos);
        }
    }
    map
}

/// Rewrite the accumulated primitives through the remap, producing the
/// arrays stored in the output geometry.
pub(crate) fn remap_primitives(
    state: &ParserState,
    remap: &FxHashMap<u32, u32>,
) -> Result<(Vec<Vertex>, Vec<Atom>, Vec<Triangle>, Vec<Segment>)> {
    let resolve = |seq: u32, line: &str| {
        remap.get(&seq).copied().ok_or_else(|| Error::DanglingReference {
            seq,
            target: seq,
            line: line.to_string(),
        })
    };

    let vertices = state
        .vertices
        .iter()
        .enumerate()
        .map(|(idx, v)| Vertex {
            seq: (idx + 1) as u32,
            xyz: v.xyz,
        })
        .collect();

    let mut atoms = Vec::with_capacity(state.atoms.len());
    for atom in &state.atoms {
        atoms.push(Atom {
            seq: resolve(atom.seq, "ATOM")?,
            target: resolve(atom.target, "ATOM")?,
        });
    }

    let mut triangles = Vec::with_capacity(state.triangles.len());
    for triangle in &state.triangles {
        triangles.push(Triangle {
            seq: triangle.seq,
            abc: [
                resolve(triangle.abc[0], "TRGL")?,
                resolve(triangle.abc[1], "TRGL")?,
                resolve(triangle.abc[2], "TRGL")?,
            ],
        });
    }

    let mut segments = Vec::with_capacity(state.segments.len());
    for segment in &state.segments {
        segments.push(Segment {
            ab: [resolve(segment.ab[0], "SEG")?, resolve(segment.ab[1], "SEG")?],
        });
    }

    Ok((vertices, atoms, triangles, segments))
}
