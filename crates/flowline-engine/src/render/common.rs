//! Shared GPU types for the line renderer.

use bytemuck::{Pod, Zeroable};

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── frame uniform ─────────────────────────────────────────────────────────

/// CPU mirror of the WGSL `FrameUniforms` block (binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Local → clip, column-major.
    pub projection: [[f32; 4]; 4],
    pub viewport_size_px: [f32; 2], // logical px
    pub pixel_ratio: f32,
    /// Seconds; drives the pulse.
    pub time: f32,
    /// World units per logical pixel.
    pub resolution: f32,
    pub global_alpha: f32,
    /// 1.0 while rendering hit colors.
    pub hit_detection: f32,
    /// Clip-space z written for every vertex.
    pub depth: f32,
}

/// Minimum binding size of the frame uniform buffer.
pub(super) fn frame_ubo_size() -> wgpu::BufferAddress {
    std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress
}

// ── vertex layout ─────────────────────────────────────────────────────────

pub(super) fn vertex_format(components: usize) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Rounds a uniform block size up to the 16-byte granularity WGSL expects.
pub(super) fn uniform_padded_size(len: usize) -> wgpu::BufferAddress {
    (len.max(1).div_ceil(16) * 16) as wgpu::BufferAddress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
        assert_eq!(std::mem::offset_of!(FrameUniforms, viewport_size_px), 64);
        assert_eq!(std::mem::offset_of!(FrameUniforms, depth), 92);
    }

    #[test]
    fn uniform_sizes_round_to_16() {
        assert_eq!(uniform_padded_size(0), 16);
        assert_eq!(uniform_padded_size(4), 16);
        assert_eq!(uniform_padded_size(17), 32);
    }
}
