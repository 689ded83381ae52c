//! Per-pixel blur strength.
//!
//! A [`WeightFunction`] decides how far apart the five taps of each pass are
//! spread for a given fragment. It exists twice: as a CPU function and as a
//! WGSL snippet spliced into the filter shader. The two must agree, and the
//! tests in this module pin the CPU side to the documented curve.

use crate::params::{AspectRatio, FocusPoint};

/// Name of the WGSL function every weight snippet has to define with the
/// signature `fn blur_weight(coord: vec2<f32>, focus: vec2<f32>, ratio: f32) -> f32`.
pub const WGSL_WEIGHT_FN: &str = "blur_weight";

/// Strategy plugged into [`crate::TwoPassFilter`].
pub trait WeightFunction: Send + Sync + 'static {
    /// Weight for a sample at `sample` (normalized screen space, y up).
    fn weight(&self, sample: [f32; 2], focus: FocusPoint, aspect_ratio: AspectRatio) -> f32;

    /// WGSL source defining `fn blur_weight`.
    fn wgsl(&self) -> String;
}

/// Tilt-shift weight: zero inside a circle around the focus, then a clamped
/// quadratic falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialWeight {
    /// Radius of the sharp zone around the focus point.
    pub center_radius: f32,
    /// Distance at which the quadratic term reaches 1.
    pub reference_radius: f32,
    /// Weight at `reference_radius`; scales the quadratic term.
    pub falloff: f32,
    /// Upper bound of the weight, limiting how far taps can wander.
    pub max_weight: f32,
}

impl Default for RadialWeight {
    fn default() -> Self {
        Self {
            center_radius: 0.2,
            reference_radius: 1.0,
            falloff: 1.4,
            max_weight: 2.0,
        }
    }
}

impl RadialWeight {
    /// Aspect-corrected distance of `sample` from `focus`.
    pub fn radius(sample: [f32; 2], focus: FocusPoint, aspect_ratio: AspectRatio) -> f32 {
        let dy = (sample[1] - focus.y) / aspect_ratio.get();
        let dx = sample[0] - focus.x;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn weight_at_radius(&self, radius: f32) -> f32 {
        if radius < self.center_radius {
            return 0.0;
        }
        let scaled = radius / self.reference_radius;
        (scaled * scaled * self.falloff).min(self.max_weight)
    }

    /// Smallest radius at which the weight is clamped to `max_weight`.
    pub fn saturation_radius(&self) -> f32 {
        self.reference_radius * (self.max_weight / self.falloff).sqrt()
    }
}

impl WeightFunction for RadialWeight {
    fn weight(&self, sample: [f32; 2], focus: FocusPoint, aspect_ratio: AspectRatio) -> f32 {
        self.weight_at_radius(Self::radius(sample, focus, aspect_ratio))
    }

    fn wgsl(&self) -> String {
        format!(
            r#"
const CENTER_RADIUS: f32 = {center};
const REFERENCE_RADIUS: f32 = {reference};
const FALLOFF: f32 = {falloff};
const MAX_WEIGHT: f32 = {max};

fn blur_weight(coord: vec2<f32>, focus: vec2<f32>, ratio: f32) -> f32 {{
    let dy = (coord.y - focus.y) / ratio;
    let dx = coord.x - focus.x;
    let radius = sqrt(dx * dx + dy * dy);
    if (radius < CENTER_RADIUS) {{
        return 0.0;
    }}
    let scaled = radius / REFERENCE_RADIUS;
    return min(scaled * scaled * FALLOFF, MAX_WEIGHT);
}}
"#,
            center = wgsl_float(self.center_radius),
            reference = wgsl_float(self.reference_radius),
            falloff = wgsl_float(self.falloff),
            max = wgsl_float(self.max_weight),
        )
    }
}

/// Same spread everywhere: a plain five tap box blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWeight(pub f32);

impl Default for UniformWeight {
    fn default() -> Self {
        Self(1.0)
    }
}

impl WeightFunction for UniformWeight {
    fn weight(&self, _sample: [f32; 2], _focus: FocusPoint, _aspect_ratio: AspectRatio) -> f32 {
        self.0
    }

    fn wgsl(&self) -> String {
        format!(
            r#"
fn blur_weight(coord: vec2<f32>, focus: vec2<f32>, ratio: f32) -> f32 {{
    return {};
}}
"#,
            wgsl_float(self.0)
        )
    }
}

/// Formats an `f32` as a WGSL float literal. `Debug` always keeps the
/// fractional part, so `1.0` does not turn into the integer `1`.
pub(crate) fn wgsl_float(value: f32) -> String {
    format!("{value:?}")
}
