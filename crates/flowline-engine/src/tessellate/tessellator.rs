use crate::coords::{Affine2, Vec2};

use super::angle::{end_join_tangent, join_angle, start_join_tangent, CAP_ANGLE};
use super::layout::vertex_row_len;
use super::params::pack_vertex_params;
use super::{LineBuffers, TessellationError, TessellationJob};

/// Shape of a validated instruction buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct InstructionSummary {
    pub runs: usize,
    pub vertices: usize,
    pub segments: usize,
}

/// Checks that every run header and body fits the buffer before anything is read.
pub fn validate_instructions(
    instructions: &[f32],
    custom_attribute_count: usize,
    stride: usize,
) -> Result<InstructionSummary, TessellationError> {
    if stride < 2 {
        return Err(TessellationError::InvalidStride(stride));
    }

    let mut summary = InstructionSummary::default();
    let mut cursor = 0;
    while cursor < instructions.len() {
        let header = custom_attribute_count + 1;
        let available = instructions.len() - cursor;
        if header > available {
            return Err(TessellationError::Truncated { offset: cursor, needed: header, available });
        }

        let raw = instructions[cursor + custom_attribute_count];
        if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
            return Err(TessellationError::InvalidVertexCount { offset: cursor, value: raw });
        }

        // Counts beyond usize saturate; the overflow check rejects them.
        let count = raw as usize;
        let Some(needed) = count.checked_mul(stride).and_then(|n| n.checked_add(header)) else {
            return Err(TessellationError::InvalidVertexCount { offset: cursor, value: raw });
        };
        if needed > available {
            return Err(TessellationError::Truncated { offset: cursor, needed, available });
        }

        summary.runs += 1;
        summary.vertices += count;
        summary.segments += count.saturating_sub(1);
        cursor += needed;
    }
    Ok(summary)
}

/// Converts one job's instructions into interleaved quads.
///
/// Per segment, 4 rows are written:
///
/// ```text
/// x0 y0 x1 y1 | angle0 angle1 | distance | params(role, tangent sum) | (start, end) × extras | custom…
/// ```
///
/// and 6 indices: `b, b+1, b+2, b+1, b+3, b+2`. Join angles and arc lengths are
/// measured in world units through the job's inverse transform; positions are
/// stored as given (local units).
pub fn tessellate(job: TessellationJob) -> Result<LineBuffers, TessellationError> {
    let TessellationJob { id, instructions, inverse_transform, custom_attribute_count, stride } =
        job;

    let summary = validate_instructions(&instructions, custom_attribute_count, stride)?;
    let row_len = vertex_row_len(stride, custom_attribute_count);

    let mut writer = QuadWriter {
        row_len,
        stride,
        vertices: Vec::with_capacity(summary.segments * 4 * row_len),
        indices: Vec::with_capacity(summary.segments * 6),
    };

    let mut cursor = 0;
    while cursor < instructions.len() {
        let custom = &instructions[cursor..cursor + custom_attribute_count];
        cursor += custom_attribute_count;
        let count = instructions[cursor] as usize;
        cursor += 1;

        let run = &instructions[cursor..cursor + count * stride];
        writer.write_run(run, custom, &inverse_transform);
        cursor += count * stride;
    }

    log::trace!(
        "{id}: {} runs, {} segments tessellated",
        summary.runs,
        summary.segments
    );

    Ok(LineBuffers {
        id,
        vertices: writer.vertices,
        indices: writer.indices,
        vertex_stride: row_len,
        inverse_transform,
        instructions,
    })
}

struct QuadWriter {
    row_len: usize,
    stride: usize,
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

/// Neighbours and running measures for one segment.
struct Segment {
    start: usize,
    before: Option<usize>,
    after: Option<usize>,
    length: f64,
    tangent_sum: f64,
}

impl QuadWriter {
    fn write_run(&mut self, run: &[f32], custom: &[f32], to_world: &Affine2) {
        let count = run.len() / self.stride;
        if count < 2 {
            return;
        }

        let world = |i: usize| self.local(run, i).map(|p| to_world.apply_vec(p));
        let is_loop = world(0) == world(count - 1);

        let mut length = 0.0;
        let mut tangent_sum = 0.0;

        // The last point only ends a segment.
        for i in 0..count - 1 {
            let before = if i > 0 {
                Some(i - 1)
            } else if is_loop {
                Some(count - 2)
            } else {
                None
            };
            let after = if i + 2 < count {
                Some(i + 2)
            } else if is_loop {
                Some(1)
            } else {
                None
            };

            let segment = Segment { start: i, before, after, length, tangent_sum };
            (length, tangent_sum) = self.write_segment(run, custom, to_world, segment);
        }
    }

    /// Returns the arc length and tangent sum carried to the next segment.
    fn write_segment(
        &mut self,
        run: &[f32],
        custom: &[f32],
        to_world: &Affine2,
        segment: Segment,
    ) -> (f64, f64) {
        let i0 = segment.start;
        let i1 = i0 + 1;
        let world = |i: usize| to_world.apply_vec(self.local(run, i).unwrap_or_default());
        let p0 = world(i0);
        let p1 = world(i1);

        let mut angle0 = CAP_ANGLE;
        let mut angle1 = CAP_ANGLE;
        let mut next_sum = segment.tangent_sum;

        if let Some(b) = segment.before {
            let a = join_angle(p0, p1, world(b));
            next_sum += start_join_tangent(a);
            angle0 = a as f32;
        }
        if let Some(a_idx) = segment.after {
            let a = join_angle(p1, p0, world(a_idx));
            next_sum += end_join_tangent(a);
            angle1 = a as f32;
        }

        let s = i0 * self.stride;
        let e = i1 * self.stride;
        let extras = self.stride - 2;
        let base_index = (self.vertices.len() / self.row_len) as u32;

        for role in 0..4u8 {
            self.vertices.extend_from_slice(&[
                run[s],
                run[s + 1],
                run[e],
                run[e + 1],
                angle0,
                angle1,
                segment.length as f32,
                pack_vertex_params(role, segment.tangent_sum),
            ]);
            for k in 0..extras {
                self.vertices.push(run[s + 2 + k]);
                self.vertices.push(run[e + 2 + k]);
            }
            self.vertices.extend_from_slice(custom);
        }

        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index + 1,
            base_index + 3,
            base_index + 2,
        ]);

        (segment.length + p0.distance(p1), next_sum)
    }

    fn local(&self, run: &[f32], i: usize) -> Option<Vec2> {
        let at = i * self.stride;
        let xy = run.get(at..at + 2)?;
        Some(Vec2::new(f64::from(xy[0]), f64::from(xy[1])))
    }
}
