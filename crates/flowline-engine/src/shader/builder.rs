use std::fmt::Write as _;

use crate::tessellate::{LineVertexLayout, LINE_ANGLE_COSINE_CUTOFF};
use crate::tessellate::params::VERTEX_ROLE_SCALE;

use super::chunks;
use super::style::{CapStyle, JoinStyle, PulseConfig};

/// A value handed from the vertex stage to the fragment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: String,
    /// WGSL type, e.g. `f32` or `vec4<f32>`.
    pub ty: String,
    /// Vertex-stage expression; may read `in.<vertex input>` and `u.<frame uniform>`.
    pub expression: String,
}

/// Generates the WGSL vertex/fragment pair used to stroke tessellated lines.
///
/// Every style knob is a WGSL expression. Vertex-stage expressions (width,
/// offset, varyings) may read `in.<vertex input>`; fragment-stage ones (color,
/// cap, join, distance field, discard) may read `in.<varying>` plus the locals
/// `current_point`, `current_length_px`, `current_radius_px` and
/// `current_radius_ratio`. Both stages see `u` (frame) and `u_user` (user
/// uniforms, when declared).
#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    layout: LineVertexLayout,
    has_stroke: bool,

    stroke_width: String,
    stroke_offset: String,
    stroke_color: String,
    stroke_cap: String,
    stroke_join: String,
    stroke_miter_limit: String,
    stroke_distance_field: String,
    discard: String,

    pulse: Option<PulseConfig>,
    hit_color_input: Option<String>,

    uniforms: Vec<(String, String)>,
    varyings: Vec<Varying>,
    vertex_functions: Vec<String>,
    fragment_functions: Vec<String>,
}

impl ShaderBuilder {
    pub fn new(layout: LineVertexLayout) -> Self {
        Self {
            layout,
            has_stroke: false,
            stroke_width: "1.0".into(),
            stroke_offset: "0.0".into(),
            stroke_color: "vec4<f32>(1.0, 1.0, 1.0, 1.0)".into(),
            stroke_cap: CapStyle::Round.wgsl().into(),
            stroke_join: JoinStyle::Round.wgsl().into(),
            stroke_miter_limit: "10.0".into(),
            stroke_distance_field: "-1000.0".into(),
            discard: "false".into(),
            pulse: None,
            hit_color_input: None,
            uniforms: Vec::new(),
            varyings: Vec::new(),
            vertex_functions: Vec::new(),
            fragment_functions: Vec::new(),
        }
    }

    pub fn layout(&self) -> &LineVertexLayout {
        &self.layout
    }

    pub fn has_stroke(&self) -> bool {
        self.has_stroke
    }

    // ── stroke ────────────────────────────────────────────────────────────

    /// Stroke width in logical px. Enables the stroke.
    pub fn stroke_width(mut self, expr: impl Into<String>) -> Self {
        self.stroke_width = expr.into();
        self.has_stroke = true;
        self
    }

    /// Perpendicular offset in logical px, positive to the left of travel.
    pub fn stroke_offset(mut self, expr: impl Into<String>) -> Self {
        self.stroke_offset = expr.into();
        self
    }

    /// Premultiplied `vec4<f32>` stroke color. Enables the stroke.
    pub fn stroke_color(mut self, expr: impl Into<String>) -> Self {
        self.stroke_color = expr.into();
        self.has_stroke = true;
        self
    }

    pub fn stroke_cap(self, cap: CapStyle) -> Self {
        self.stroke_cap_expression(cap.wgsl())
    }

    /// Expression evaluating to one of `CAP_BUTT`, `CAP_SQUARE`, `CAP_ROUND`.
    pub fn stroke_cap_expression(mut self, expr: impl Into<String>) -> Self {
        self.stroke_cap = expr.into();
        self
    }

    pub fn stroke_join(self, join: JoinStyle) -> Self {
        self.stroke_join_expression(join.wgsl())
    }

    /// Expression evaluating to one of `JOIN_BEVEL`, `JOIN_MITER`, `JOIN_ROUND`.
    pub fn stroke_join_expression(mut self, expr: impl Into<String>) -> Self {
        self.stroke_join = expr.into();
        self
    }

    /// Evaluated inside a helper function, so it may only read uniforms.
    pub fn stroke_miter_limit(mut self, expr: impl Into<String>) -> Self {
        self.stroke_miter_limit = expr.into();
        self
    }

    /// Extra distance field combined with the stroke field by `max`.
    pub fn stroke_distance_field(mut self, expr: impl Into<String>) -> Self {
        self.stroke_distance_field = expr.into();
        self
    }

    /// Boolean fragment expression; matching fragments are discarded.
    pub fn discard(mut self, expr: impl Into<String>) -> Self {
        self.discard = expr.into();
        self
    }

    /// Gates visibility on the per-vertex time offsets. Ignored when the
    /// layout carries no time offsets or the period is not positive.
    pub fn pulse(mut self, pulse: PulseConfig) -> Self {
        self.pulse = Some(pulse);
        self
    }

    /// Name of a 4-component vertex input holding the hit color, e.g.
    /// `a_prop_hit_color`. Without it, hit passes draw transparent black.
    pub fn hit_color_input(mut self, name: impl Into<String>) -> Self {
        self.hit_color_input = Some(name.into());
        self
    }

    // ── declarations ──────────────────────────────────────────────────────

    /// Adds a field to the `u_user` uniform block (binding 1).
    pub fn uniform(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.uniforms.push((name.into(), ty.into()));
        self
    }

    pub fn varying(
        mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        self.varyings.push(Varying { name: name.into(), ty: ty.into(), expression: expression.into() });
        self
    }

    pub fn vertex_function(mut self, source: impl Into<String>) -> Self {
        self.vertex_functions.push(source.into());
        self
    }

    pub fn fragment_function(mut self, source: impl Into<String>) -> Self {
        self.fragment_functions.push(source.into());
        self
    }

    pub fn has_user_uniforms(&self) -> bool {
        !self.uniforms.is_empty()
    }

    // ── generation ────────────────────────────────────────────────────────

    /// WGSL vertex module (`vs_main`), or `None` without a stroke.
    pub fn stroke_vertex_shader(&self) -> Option<String> {
        if !self.has_stroke {
            return None;
        }

        let mut src = self.prelude();
        src.push_str(chunks::VERTEX_FUNCTIONS);
        src.push('\n');
        for f in &self.vertex_functions {
            src.push_str(f);
            src.push_str("\n\n");
        }

        src.push_str("struct VertexInput {\n");
        for (location, input) in self.layout.inputs().iter().enumerate() {
            let _ = writeln!(src, "    @location({location}) {}: {},", input.name, input.wgsl_type());
        }
        src.push_str("};\n\n");

        let time_offset = if self.layout.has_time_offsets() {
            "select(in.a_time_offsets.y, in.a_time_offsets.x, at_start)".to_string()
        } else {
            "0.0".to_string()
        };
        let hit_color = match &self.hit_color_input {
            Some(name) => format!("in.{name}"),
            None => "vec4<f32>(0.0, 0.0, 0.0, 0.0)".to_string(),
        };

        let _ = write!(
            src,
            r"@vertex
fn vs_main(in: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    let angle_start = in.a_join_angles.x;
    let angle_end = in.a_join_angles.y;
    let vertex_number = floor(abs(in.a_parameters) / {scale} + 0.5);
    let angle_tangent_sum = fract(abs(in.a_parameters) / {scale}) * {scale} * sign(in.a_parameters);

    let line_width = {width};
    let line_offset_px = {offset};

    var segment_start_px = world_to_px(in.a_segment_start);
    var segment_end_px = world_to_px(in.a_segment_end);
    let tangent_px = normalize(segment_end_px - segment_start_px);
    let normal_px = vec2<f32>(-tangent_px.y, tangent_px.x);
    segment_start_px = offset_point(segment_start_px, normal_px, angle_start, line_offset_px);
    segment_end_px = offset_point(segment_end_px, normal_px, angle_end, line_offset_px);

    let at_start = vertex_number < 1.5;
    var normal_dir = -1.0;
    if (vertex_number < 0.5 || (vertex_number > 1.5 && vertex_number < 2.5)) {{
        normal_dir = 1.0;
    }}
    var tangent_dir = -1.0;
    var angle = angle_end;
    var position_px = segment_end_px;
    if (at_start) {{
        tangent_dir = 1.0;
        angle = angle_start;
        position_px = segment_start_px;
    }}

    var join_direction: vec2<f32>;
    if (cos(angle) > LINE_ANGLE_COSINE_CUTOFF || is_cap(angle)) {{
        join_direction = normal_px * normal_dir - tangent_px * tangent_dir;
    }} else {{
        join_direction = join_offset_direction(normal_px * normal_dir, angle);
    }}
    position_px = position_px + join_direction * (line_width * 0.5 + 1.0);

    out.position = px_to_screen(position_px);
    out.segment_start = segment_start_px;
    out.segment_end = segment_end_px;
    out.angle_start = angle_start;
    out.angle_end = angle_end;
    out.width = line_width;
    out.distance_offset_px = in.a_distance / u.resolution - line_offset_px * angle_tangent_sum;
    out.time_offset = {time_offset};
    out.hit_color = {hit_color};
",
            scale = wgsl_float(VERTEX_ROLE_SCALE),
            width = self.stroke_width,
            offset = self.stroke_offset,
        );
        for v in &self.varyings {
            let _ = writeln!(src, "    out.{} = {};", v.name, v.expression);
        }
        src.push_str("    return out;\n}\n");

        Some(src)
    }

    /// WGSL fragment module (`fs_main`), or `None` without a stroke.
    pub fn stroke_fragment_shader(&self) -> Option<String> {
        if !self.has_stroke {
            return None;
        }

        let mut src = self.prelude();
        for (name, id) in [
            (CapStyle::Butt.wgsl(), CapStyle::Butt.id()),
            (CapStyle::Square.wgsl(), CapStyle::Square.id()),
            (CapStyle::Round.wgsl(), CapStyle::Round.id()),
            (JoinStyle::Bevel.wgsl(), JoinStyle::Bevel.id()),
            (JoinStyle::Miter.wgsl(), JoinStyle::Miter.id()),
            (JoinStyle::Round.wgsl(), JoinStyle::Round.id()),
        ] {
            let _ = writeln!(src, "const {name}: f32 = {};", wgsl_float(id));
        }
        src.push('\n');
        let _ = write!(
            src,
            "fn stroke_miter_limit() -> f32 {{\n    return {};\n}}\n\n",
            self.stroke_miter_limit
        );
        src.push_str(chunks::FRAGMENT_FUNCTIONS);
        src.push('\n');
        for f in &self.fragment_functions {
            src.push_str(f);
            src.push_str("\n\n");
        }

        let _ = write!(
            src,
            r"@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let current_point = vec2<f32>(in.position.x, u.viewport_size_px.y * u.pixel_ratio - in.position.y) / u.pixel_ratio;
    if ({discard}) {{
        discard;
    }}

    let segment_length = length(in.segment_end - in.segment_start);
    let segment_tangent = (in.segment_end - in.segment_start) / segment_length;
    let segment_normal = vec2<f32>(-segment_tangent.y, segment_tangent.x);
    let start_to_point = current_point - in.segment_start;
    let current_length_px = max(0.0, min(dot(segment_tangent, start_to_point), segment_length)) + in.distance_offset_px;
    let current_radius_px = abs(dot(segment_normal, start_to_point));
    let current_radius_ratio = dot(segment_normal, start_to_point) * 2.0 / in.width;

    var color = ({color}) * u.global_alpha;
    let cap_type = {cap};
    let join_type = {join};
    let start_dist = segment_point_distance(current_point, in.segment_start, in.segment_end, in.width, in.angle_start, cap_type, join_type);
    let end_dist = segment_point_distance(current_point, in.segment_end, in.segment_start, in.width, in.angle_end, cap_type, join_type);
    var dist = max(segment_distance_field(current_point, in.segment_start, in.segment_end, in.width), max(start_dist, end_dist));
    dist = max(dist, {distance_field});
    color = color * (1.0 - smoothstep(-0.5, 0.5, dist));
",
            discard = self.discard,
            color = self.stroke_color,
            cap = self.stroke_cap,
            join = self.stroke_join,
            distance_field = self.stroke_distance_field,
        );

        let pulse = self.pulse.filter(|p| p.period_ms > 0.0 && self.layout.has_time_offsets());
        if let Some(pulse) = pulse {
            let period = wgsl_float(pulse.period_ms);
            let _ = write!(
                src,
                r"
    let pulse_head = modulo((u.time - {start}) * 1000.0, {period});
    let pulse_tail = pulse_head - {window} * 1000.0;
    let in_pulse = (in.time_offset < pulse_head && in.time_offset > pulse_tail)
        || (pulse_tail < 0.0 && in.time_offset > pulse_tail + {period});
    if (!in_pulse) {{
        color = vec4<f32>(0.0, 0.0, 0.0, 0.0);
    }}
",
                start = wgsl_float(pulse.start_time_s),
                window = wgsl_float(pulse.window_s),
            );
        }

        src.push_str(
            r"
    if (u.hit_detection > 0.5) {
        if (color.a < 0.1) {
            discard;
        }
        color = in.hit_color;
    }
    return color;
}
",
        );

        Some(src)
    }

    /// Declarations both stages share: uniforms, helpers, varyings struct.
    fn prelude(&self) -> String {
        let mut src = String::new();
        src.push_str(chunks::FRAME_UNIFORMS);
        src.push('\n');

        if !self.uniforms.is_empty() {
            src.push_str("struct UserUniforms {\n");
            for (name, ty) in &self.uniforms {
                let _ = writeln!(src, "    {name}: {ty},");
            }
            src.push_str("};\n\n@group(0) @binding(1) var<uniform> u_user: UserUniforms;\n\n");
        }

        let _ = writeln!(
            src,
            "const LINE_ANGLE_COSINE_CUTOFF: f32 = {};\n",
            wgsl_float(LINE_ANGLE_COSINE_CUTOFF as f32)
        );
        src.push_str(chunks::COMMON_FUNCTIONS);
        src.push('\n');

        src.push_str(
            "struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) segment_start: vec2<f32>,
    @location(1) segment_end: vec2<f32>,
    @location(2) angle_start: f32,
    @location(3) angle_end: f32,
    @location(4) width: f32,
    @location(5) distance_offset_px: f32,
    @location(6) time_offset: f32,
    @location(7) hit_color: vec4<f32>,
",
        );
        for (i, v) in self.varyings.iter().enumerate() {
            let _ = writeln!(src, "    @location({}) {}: {},", BASE_VARYINGS + i, v.name, v.ty);
        }
        src.push_str("};\n\n");
        src
    }
}

/// Locations taken by the built-in varyings.
const BASE_VARYINGS: usize = 8;

/// Formats a float as a WGSL literal; `{:?}` always keeps a decimal point.
fn wgsl_float(v: f32) -> String {
    format!("{v:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AttributeSize, CustomAttribute};

    fn layout(stride: usize) -> LineVertexLayout {
        let attrs: Vec<CustomAttribute<()>> =
            vec![CustomAttribute::new("hit_color", AttributeSize::Four, |_: &()| [0.0f32; 4])];
        LineVertexLayout::new(stride, &attrs)
    }

    fn stroked() -> ShaderBuilder {
        ShaderBuilder::new(layout(3)).stroke_width("4.0").stroke_color("vec4<f32>(1.0, 0.0, 0.0, 1.0)")
    }

    #[test]
    fn no_stroke_no_shaders() {
        let builder = ShaderBuilder::new(layout(2));
        assert!(!builder.has_stroke());
        assert!(builder.stroke_vertex_shader().is_none());
        assert!(builder.stroke_fragment_shader().is_none());
    }

    #[test]
    fn vertex_inputs_follow_layout() {
        let vs = stroked().stroke_vertex_shader().unwrap();
        assert!(vs.contains("@location(0) a_segment_start: vec2<f32>,"));
        assert!(vs.contains("@location(4) a_parameters: f32,"));
        assert!(vs.contains("@location(5) a_time_offsets: vec2<f32>,"));
        assert!(vs.contains("@location(6) a_prop_hit_color: vec4<f32>,"));
        assert!(vs.contains("fn vs_main(in: VertexInput) -> VertexOutput"));
        assert!(vs.contains("let line_width = 4.0;"));
        assert!(vs.contains("/ 10000.0"));
    }

    #[test]
    fn cutoff_constant_is_shared() {
        let builder = stroked();
        let expected = format!("const LINE_ANGLE_COSINE_CUTOFF: f32 = {:?};", LINE_ANGLE_COSINE_CUTOFF as f32);
        assert!(builder.stroke_vertex_shader().unwrap().contains(&expected));
        assert!(builder.stroke_fragment_shader().unwrap().contains(&expected));
    }

    #[test]
    fn time_offsets_fall_back_without_extras() {
        let vs = ShaderBuilder::new(layout(2)).stroke_width("1.0").stroke_vertex_shader().unwrap();
        assert!(vs.contains("out.time_offset = 0.0;"));
        assert!(!vs.contains("a_time_offsets"));
    }

    #[test]
    fn fragment_uses_configured_styles() {
        let fs = stroked()
            .stroke_cap(CapStyle::Butt)
            .stroke_join(JoinStyle::Miter)
            .stroke_miter_limit("4.0")
            .stroke_fragment_shader()
            .unwrap();
        assert!(fs.contains("const CAP_BUTT: f32 = 0.0;"));
        assert!(fs.contains("let cap_type = CAP_BUTT;"));
        assert!(fs.contains("let join_type = JOIN_MITER;"));
        assert!(fs.contains("return 4.0;"));
        assert!(fs.contains("1.0 - smoothstep(-0.5, 0.5, dist)"));
        assert!(fs.contains("u.hit_detection > 0.5"));
    }

    #[test]
    fn pulse_gating_needs_time_offsets() {
        let pulse = PulseConfig { period_ms: 2000.0, start_time_s: 1.0, window_s: 0.25 };

        let fs = stroked().pulse(pulse).stroke_fragment_shader().unwrap();
        assert!(fs.contains("modulo((u.time - 1.0) * 1000.0, 2000.0)"));
        assert!(fs.contains("pulse_head - 0.25 * 1000.0"));

        let fs = ShaderBuilder::new(layout(2))
            .stroke_width("1.0")
            .pulse(pulse)
            .stroke_fragment_shader()
            .unwrap();
        assert!(!fs.contains("pulse_head"));
    }

    #[test]
    fn zero_period_emits_no_pulse_window() {
        // modulo by zero is NaN in WGSL and would discard every fragment
        for period_ms in [0.0, -500.0] {
            let pulse = PulseConfig { period_ms, ..PulseConfig::default() };
            let fs = stroked().pulse(pulse).stroke_fragment_shader().unwrap();
            assert!(!fs.contains("pulse_head"), "period {period_ms}");
            assert!(pulse.is_visible(0.0, 3.0));
        }
    }

    #[test]
    fn hit_color_reads_named_input() {
        let vs = stroked().hit_color_input("a_prop_hit_color").stroke_vertex_shader().unwrap();
        assert!(vs.contains("out.hit_color = in.a_prop_hit_color;"));

        let vs = stroked().stroke_vertex_shader().unwrap();
        assert!(vs.contains("out.hit_color = vec4<f32>(0.0, 0.0, 0.0, 0.0);"));
    }

    #[test]
    fn user_declarations_land_in_both_stages() {
        let builder = stroked()
            .uniform("dash_length", "f32")
            .varying("v_width", "f32", "line_width")
            .fragment_function("fn dash(x: f32) -> f32 { return x; }");
        assert!(builder.has_user_uniforms());

        let vs = builder.stroke_vertex_shader().unwrap();
        let fs = builder.stroke_fragment_shader().unwrap();
        for src in [&vs, &fs] {
            assert!(src.contains("struct UserUniforms {\n    dash_length: f32,\n};"));
            assert!(src.contains("@binding(1) var<uniform> u_user"));
            assert!(src.contains("@location(8) v_width: f32,"));
        }
        assert!(vs.contains("out.v_width = line_width;"));
        assert!(fs.contains("fn dash(x: f32)"));
        assert!(!vs.contains("fn dash(x: f32)"));
    }
}
