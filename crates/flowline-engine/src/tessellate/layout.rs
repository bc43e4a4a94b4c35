use crate::geometry::CustomAttribute;

/// Floats per vertex before the extras: segment start/end, join angles, distance, params.
pub const BASE_VERTEX_LEN: usize = 8;

/// Float offsets of the fixed part of a vertex row.
pub mod offsets {
    pub const SEGMENT_START: usize = 0;
    pub const SEGMENT_END: usize = 2;
    pub const JOIN_ANGLES: usize = 4;
    pub const DISTANCE: usize = 6;
    pub const PARAMETERS: usize = 7;
    pub const EXTRAS: usize = 8;
}

/// Floats per output vertex for a given instruction stride and custom attribute size.
///
/// Each of the `stride - 2` per-vertex extras is emitted as a `(start, end)` pair.
#[inline]
pub const fn vertex_row_len(instruction_stride: usize, custom_size: usize) -> usize {
    BASE_VERTEX_LEN + 2 * (instruction_stride - 2) + custom_size
}

/// One shader-visible input inside an interleaved vertex row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    /// 1..=4 floats.
    pub components: usize,
    /// Offset in floats from the start of the row.
    pub offset: usize,
}

impl VertexInput {
    pub fn wgsl_type(&self) -> &'static str {
        match self.components {
            1 => "f32",
            2 => "vec2<f32>",
            3 => "vec3<f32>",
            _ => "vec4<f32>",
        }
    }
}

/// Description of the interleaved rows produced by the tessellator.
///
/// Shared by the shader generator (vertex input struct) and the renderer
/// (wgpu vertex buffer layout) so both read the rows the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineVertexLayout {
    inputs: Vec<VertexInput>,
    stride: usize,
    extra_count: usize,
    custom_size: usize,
}

impl LineVertexLayout {
    pub fn new<F>(instruction_stride: usize, attributes: &[CustomAttribute<F>]) -> Self {
        let extra_count = instruction_stride.saturating_sub(2);
        let mut inputs = vec![
            input("a_segment_start", 2, offsets::SEGMENT_START),
            input("a_segment_end", 2, offsets::SEGMENT_END),
            input("a_join_angles", 2, offsets::JOIN_ANGLES),
            input("a_distance", 1, offsets::DISTANCE),
            input("a_parameters", 1, offsets::PARAMETERS),
        ];

        let mut offset = offsets::EXTRAS;
        for k in 0..extra_count {
            let name = if k == 0 { "a_time_offsets".to_string() } else { format!("a_extra{k}") };
            inputs.push(VertexInput { name, components: 2, offset });
            offset += 2;
        }

        let mut custom_size = 0;
        for attr in attributes {
            let components = attr.size().get();
            inputs.push(VertexInput { name: attr.vertex_input_name(), components, offset });
            offset += components;
            custom_size += components;
        }

        Self { inputs, stride: offset, extra_count, custom_size }
    }

    /// Floats per vertex.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn stride_bytes(&self) -> u64 {
        (self.stride * std::mem::size_of::<f32>()) as u64
    }

    #[inline]
    pub fn inputs(&self) -> &[VertexInput] {
        &self.inputs
    }

    #[inline]
    pub fn extra_count(&self) -> usize {
        self.extra_count
    }

    #[inline]
    pub fn custom_size(&self) -> usize {
        self.custom_size
    }

    /// Whether rows carry per-vertex time offsets (the first extra).
    #[inline]
    pub fn has_time_offsets(&self) -> bool {
        self.extra_count > 0
    }

    pub fn find(&self, name: &str) -> Option<&VertexInput> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

fn input(name: &str, components: usize, offset: usize) -> VertexInput {
    VertexInput { name: name.to_string(), components, offset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AttributeSize;

    #[test]
    fn time_offset_stride_matches_row_len() {
        let attrs: Vec<CustomAttribute<()>> =
            vec![CustomAttribute::new("hit_color", AttributeSize::Four, |_: &()| [0.0f32; 4])];
        let layout = LineVertexLayout::new(3, &attrs);

        assert_eq!(layout.stride(), 14);
        assert_eq!(layout.stride(), vertex_row_len(3, 4));
        assert_eq!(layout.stride_bytes(), 56);
        assert!(layout.has_time_offsets());
        assert_eq!(layout.find("a_time_offsets").map(|i| i.offset), Some(8));
        assert_eq!(layout.find("a_prop_hit_color").map(|i| i.offset), Some(10));
    }

    #[test]
    fn plain_xy_has_no_extras() {
        let layout = LineVertexLayout::new::<()>(2, &[]);
        assert_eq!(layout.stride(), BASE_VERTEX_LEN);
        assert_eq!(layout.inputs().len(), 5);
        assert!(!layout.has_time_offsets());
    }
}
