//! Static WGSL pieces shared by the generated stroke shaders.

/// Frame uniforms, mirrored by `render::FrameUniforms` (96 bytes).
pub(super) const FRAME_UNIFORMS: &str = r"struct FrameUniforms {
    projection: mat4x4<f32>,
    viewport_size_px: vec2<f32>,
    pixel_ratio: f32,
    time: f32,
    resolution: f32,
    global_alpha: f32,
    hit_detection: f32,
    depth: f32,
};

@group(0) @binding(0) var<uniform> u: FrameUniforms;
";

pub(super) const COMMON_FUNCTIONS: &str = r"fn modulo(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

fn is_cap(join_angle: f32) -> bool {
    return join_angle < -0.1;
}
";

pub(super) const VERTEX_FUNCTIONS: &str = r"fn world_to_px(world_pos: vec2<f32>) -> vec2<f32> {
    let screen_pos = u.projection * vec4<f32>(world_pos, 0.0, 1.0);
    return (0.5 * screen_pos.xy + 0.5) * u.viewport_size_px;
}

fn px_to_screen(px_pos: vec2<f32>) -> vec4<f32> {
    let screen_pos = 2.0 * px_pos / u.viewport_size_px - 1.0;
    return vec4<f32>(screen_pos, u.depth, 1.0);
}

fn join_offset_direction(normal_px: vec2<f32>, join_angle: f32) -> vec2<f32> {
    let half_angle = join_angle / 2.0;
    let c = cos(half_angle);
    let s = sin(half_angle);
    let bisector = vec2<f32>(s * normal_px.x + c * normal_px.y, -c * normal_px.x + s * normal_px.y);
    return bisector * (1.0 / s);
}

fn offset_point(point: vec2<f32>, normal: vec2<f32>, join_angle: f32, offset_px: f32) -> vec2<f32> {
    if (cos(join_angle) > LINE_ANGLE_COSINE_CUTOFF || is_cap(join_angle)) {
        return point - normal * offset_px;
    }
    return point - join_offset_direction(normal, join_angle) * offset_px;
}
";

/// Distance fields: negative inside the stroke, positive outside.
pub(super) const FRAGMENT_FUNCTIONS: &str = r"fn segment_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32) -> f32 {
    let tangent = normalize(end - start);
    let normal = vec2<f32>(-tangent.y, tangent.x);
    let start_to_point = point - start;
    return abs(dot(start_to_point, normal)) - width * 0.5;
}

fn butt_cap_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>) -> f32 {
    return dot(point - start, -normalize(end - start));
}

fn square_cap_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32) -> f32 {
    return butt_cap_distance_field(point, start, end) - width * 0.5;
}

fn round_cap_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32) -> f32 {
    let on_segment = max(0.0, 1000.0 * dot(point - start, end - start));
    return length(point - start) - width * 0.5 - on_segment;
}

fn round_join_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32) -> f32 {
    return round_cap_distance_field(point, start, end, width);
}

fn bevel_join_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32, join_angle: f32) -> f32 {
    let tangent = normalize(end - start);
    let c = cos(join_angle * 0.5);
    let s = sin(join_angle * 0.5);
    let direction = -sign(sin(join_angle));
    let bisector = vec2<f32>(c * tangent.x - s * tangent.y, s * tangent.x + c * tangent.y);
    let radius = width * 0.5 * s;
    return dot(point - start, bisector * direction) - radius;
}

fn miter_join_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32, join_angle: f32) -> f32 {
    if (cos(join_angle) > LINE_ANGLE_COSINE_CUTOFF) {
        return bevel_join_field(point, start, end, width, join_angle);
    }
    let miter_length = 1.0 / sin(join_angle * 0.5);
    if (miter_length > stroke_miter_limit()) {
        return bevel_join_field(point, start, end, width, join_angle);
    }
    return -1000.0;
}

fn cap_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32, cap_type: f32) -> f32 {
    if (cap_type == CAP_BUTT) {
        return butt_cap_distance_field(point, start, end);
    } else if (cap_type == CAP_SQUARE) {
        return square_cap_distance_field(point, start, end, width);
    }
    return round_cap_distance_field(point, start, end, width);
}

fn join_distance_field(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32, join_angle: f32, join_type: f32) -> f32 {
    if (join_type == JOIN_BEVEL) {
        return bevel_join_field(point, start, end, width, join_angle);
    } else if (join_type == JOIN_MITER) {
        return miter_join_distance_field(point, start, end, width, join_angle);
    }
    return round_join_distance_field(point, start, end, width);
}

fn segment_point_distance(point: vec2<f32>, start: vec2<f32>, end: vec2<f32>, width: f32, join_angle: f32, cap_type: f32, join_type: f32) -> f32 {
    if (is_cap(join_angle)) {
        return cap_distance_field(point, start, end, width, cap_type);
    }
    return join_distance_field(point, start, end, width, join_angle, join_type);
}
";
