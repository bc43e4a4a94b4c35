//! Render instruction encoding.
//!
//! Layout written per line run:
//!
//! ```text
//! [custom0 .. customN-1, vertex_count, (x, y, extra0 .. extraK-1) × vertex_count]
//! ```
//!
//! `x, y` go through the caller's affine transform; extras are copied as-is.
//! The vertex count is stored as an `f32`, exact up to 2^24 vertices per run.

use crate::coords::Affine2;

use super::{custom_attributes_size, CustomAttribute, LineBatch};

/// Exact instruction length for a batch: `stride·vertices + (1 + Σsize)·runs`.
pub fn instruction_count<F>(batch: &LineBatch<F>, attributes: &[CustomAttribute<F>]) -> usize {
    batch.stride() * batch.total_vertices()
        + (1 + custom_attributes_size(attributes)) * batch.total_lines()
}

/// Encodes a batch into a freshly allocated instruction buffer.
pub fn encode_line_instructions<F>(
    batch: &LineBatch<F>,
    attributes: &[CustomAttribute<F>],
    transform: &Affine2,
) -> Vec<f32> {
    let mut out = Vec::new();
    encode_line_instructions_into(batch, attributes, transform, &mut out);
    out
}

/// Encodes a batch into `dest`, reusing its allocation.
///
/// `dest` is resized to exactly [`instruction_count`] before writing; nothing
/// grows while the runs are written.
pub fn encode_line_instructions_into<F>(
    batch: &LineBatch<F>,
    attributes: &[CustomAttribute<F>],
    transform: &Affine2,
    dest: &mut Vec<f32>,
) {
    let total = instruction_count(batch, attributes);
    if dest.len() != total {
        dest.clear();
        dest.resize(total, 0.0);
    }

    let stride = batch.stride();
    let header_len = custom_attributes_size(attributes);
    let mut header = vec![0.0f32; header_len];
    let mut cursor = 0usize;

    for entry in batch.entries() {
        // Accessors run once per feature, not once per run or vertex.
        let mut shift = 0;
        for attr in attributes {
            let size = attr.size().get();
            attr.compute(&entry.feature).write_into(&mut header[shift..shift + size]);
            shift += size;
        }

        for run in &entry.runs {
            dest[cursor..cursor + header_len].copy_from_slice(&header);
            cursor += header_len;

            dest[cursor] = (run.len() / stride) as f32;
            cursor += 1;

            for vertex in run.chunks_exact(stride) {
                let (x, y) = transform.apply(vertex[0], vertex[1]);
                dest[cursor] = x as f32;
                dest[cursor + 1] = y as f32;
                for (k, extra) in vertex[2..].iter().enumerate() {
                    dest[cursor + 2 + k] = *extra as f32;
                }
                cursor += stride;
            }
        }
    }

    debug_assert_eq!(cursor, total, "instruction buffer size mismatch");
}
