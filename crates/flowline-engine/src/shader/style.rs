/// Line cap treatment, selected in the fragment stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum CapStyle {
    Butt,
    Square,
    #[default]
    Round,
}

impl CapStyle {
    /// Numeric id compared against in the generated shader.
    pub const fn id(self) -> f32 {
        match self {
            CapStyle::Butt => 0.0,
            CapStyle::Square => 1.0,
            CapStyle::Round => 2.0,
        }
    }

    /// Name of the WGSL constant holding [`id`](Self::id).
    pub const fn wgsl(self) -> &'static str {
        match self {
            CapStyle::Butt => "CAP_BUTT",
            CapStyle::Square => "CAP_SQUARE",
            CapStyle::Round => "CAP_ROUND",
        }
    }
}

/// Line join treatment, selected in the fragment stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum JoinStyle {
    Bevel,
    Miter,
    #[default]
    Round,
}

impl JoinStyle {
    pub const fn id(self) -> f32 {
        match self {
            JoinStyle::Bevel => 0.0,
            JoinStyle::Miter => 1.0,
            JoinStyle::Round => 2.0,
        }
    }

    pub const fn wgsl(self) -> &'static str {
        match self {
            JoinStyle::Bevel => "JOIN_BEVEL",
            JoinStyle::Miter => "JOIN_MITER",
            JoinStyle::Round => "JOIN_ROUND",
        }
    }
}

/// Moving pulse along the line, driven by per-vertex time offsets.
///
/// A fragment is visible while its time offset (ms) lies inside a window of
/// `window_s` seconds whose head moves with `(time - start_time_s)` and wraps
/// every `period_ms`. A non-positive period disables the gate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PulseConfig {
    pub period_ms: f32,
    pub start_time_s: f32,
    pub window_s: f32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            period_ms: 10_000.0,
            start_time_s: 0.0,
            window_s: 0.5,
        }
    }
}

impl PulseConfig {
    /// CPU mirror of the fragment-stage window test.
    pub fn is_visible(&self, time_offset_ms: f32, time_s: f32) -> bool {
        if self.period_ms <= 0.0 {
            return true;
        }
        let head = modulo((time_s - self.start_time_s) * 1000.0, self.period_ms);
        let tail = head - self.window_s * 1000.0;
        (time_offset_ms < head && time_offset_ms > tail)
            || (tail < 0.0 && time_offset_ms > tail + self.period_ms)
    }
}

/// Floor-based modulo, matching the `modulo` helper emitted into WGSL.
#[inline]
pub fn modulo(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_slides_with_time() {
        let pulse = PulseConfig { period_ms: 10_000.0, start_time_s: 0.0, window_s: 0.5 };
        // head at 2000ms, tail at 1500ms
        assert!(pulse.is_visible(1800.0, 2.0));
        assert!(!pulse.is_visible(1400.0, 2.0));
        assert!(!pulse.is_visible(2100.0, 2.0));
        // one period later, same answer
        assert!(pulse.is_visible(1800.0, 12.0));
    }

    #[test]
    fn window_wraps_around_period() {
        let pulse = PulseConfig { period_ms: 1000.0, start_time_s: 0.0, window_s: 0.5 };
        // head at 200ms: window covers [0, 200) and (700, 1000)
        assert!(pulse.is_visible(100.0, 1.2));
        assert!(pulse.is_visible(900.0, 1.2));
        assert!(!pulse.is_visible(500.0, 1.2));
    }

    #[test]
    fn zero_period_disables_gating() {
        let pulse = PulseConfig { period_ms: 0.0, ..PulseConfig::default() };
        assert!(pulse.is_visible(123.0, 4.0));
    }

    #[test]
    fn modulo_is_floor_based() {
        assert_eq!(modulo(-1.0, 10.0), 9.0);
        assert_eq!(modulo(25.0, 10.0), 5.0);
    }
}
