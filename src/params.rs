//! Parameter types shared by the CPU and GPU sides of the filter.

use crate::error::FilterError;

/// Value the vertex stage writes to the `log` varying during normal operation.
/// Any other value makes the fragment stage emit `vec4(log, 0, 0, 1)`.
pub const LOG_SENTINEL: f32 = -10.0;

/// Multiplier of the texel step for the inner pair of taps.
pub const NEAR_TAP: f32 = 1.5;
/// Multiplier of the texel step for the outer pair of taps.
pub const FAR_TAP: f32 = 3.5;
/// Coefficient applied to each of the five taps.
pub const TAP_COEFFICIENT: f32 = 0.2;

/// Focus location in normalized screen space, `[-1, 1]` on both axes with y up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts a position in output pixels (origin top-left, y down) into
    /// normalized screen space.
    pub fn from_pixels(x: f32, y: f32, output_size: (u32, u32)) -> Self {
        Self {
            x: normalize(x, output_size.0),
            y: -normalize(y, output_size.1),
        }
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

fn normalize(value: f32, extent: u32) -> f32 {
    value / extent as f32 * 2.0 - 1.0
}

/// `width / height` of the output, used to keep the sharp zone circular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f32);

impl AspectRatio {
    pub fn from_output_size(width: u32, height: u32) -> Result<Self, FilterError> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidOutputSize { width, height });
        }
        Ok(Self(width as f32 / height as f32))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Scale applied to the base texel offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurSize(f32);

impl BlurSize {
    pub const DEFAULT: Self = Self(1.0);

    pub fn new(value: f32) -> Result<Self, FilterError> {
        if !value.is_finite() || value < 0.0 {
            return Err(FilterError::InvalidBlurSize(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for BlurSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The two passes of the separable blur, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDirection {
    Horizontal,
    Vertical,
}

impl PassDirection {
    pub const ALL: [PassDirection; 2] = [PassDirection::Horizontal, PassDirection::Vertical];

    pub fn index(self) -> usize {
        match self {
            PassDirection::Horizontal => 0,
            PassDirection::Vertical => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PassDirection::Horizontal => "horizontal",
            PassDirection::Vertical => "vertical",
        }
    }
}

/// Per-pass texel steps in texture coordinate units.
///
/// The horizontal pass steps `blur_size / width` along x, the vertical pass
/// `blur_size / height` along y. Both passes derive the near and far taps from
/// their step with [`NEAR_TAP`] and [`FAR_TAP`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleOffsets {
    pub horizontal: [f32; 2],
    pub vertical: [f32; 2],
}

impl SampleOffsets {
    pub fn compute(blur_size: BlurSize, output_size: (u32, u32)) -> Self {
        let (width, height) = output_size;
        if width == 0 || height == 0 {
            return Self::default();
        }
        let ratio = blur_size.get();
        Self {
            horizontal: [ratio / width as f32, 0.0],
            vertical: [0.0, ratio / height as f32],
        }
    }

    pub fn step(&self, direction: PassDirection) -> [f32; 2] {
        match direction {
            PassDirection::Horizontal => self.horizontal,
            PassDirection::Vertical => self.vertical,
        }
    }

    pub fn near(&self, direction: PassDirection) -> [f32; 2] {
        let [x, y] = self.step(direction);
        [x * NEAR_TAP, y * NEAR_TAP]
    }

    pub fn far(&self, direction: PassDirection) -> [f32; 2] {
        let [x, y] = self.step(direction);
        [x * FAR_TAP, y * FAR_TAP]
    }
}

/// Uniform block consumed by both shader stages. One instance per pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    pub texel_width_offset: f32,
    pub texel_height_offset: f32,
    pub screen_ratio: f32,
    pub debug_log: f32,
    pub focus_location: [f32; 2],
    pub _pad: [f32; 2],
}

impl Default for BlurUniforms {
    fn default() -> Self {
        Self::new([0.0; 2], AspectRatio::default(), FocusPoint::CENTER, None)
    }
}

impl BlurUniforms {
    pub fn new(
        step: [f32; 2],
        aspect_ratio: AspectRatio,
        focus: FocusPoint,
        debug_log: Option<f32>,
    ) -> Self {
        Self {
            texel_width_offset: step[0],
            texel_height_offset: step[1],
            screen_ratio: aspect_ratio.get(),
            debug_log: debug_log.unwrap_or(LOG_SENTINEL),
            focus_location: focus.to_array(),
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_center_maps_to_origin() {
        let focus = FocusPoint::from_pixels(960.0, 540.0, (1920, 1080));
        assert_eq!(focus, FocusPoint::CENTER);
    }

    #[test]
    fn top_left_pixel_maps_to_upper_left_corner() {
        let focus = FocusPoint::from_pixels(0.0, 0.0, (800, 600));
        assert_eq!(focus, FocusPoint::new(-1.0, 1.0));
    }

    #[test]
    fn full_hd_aspect_ratio() {
        let ratio = AspectRatio::from_output_size(1920, 1080).unwrap();
        assert!((ratio.get() - 1.7778).abs() < 1e-4);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            AspectRatio::from_output_size(640, 0),
            Err(FilterError::InvalidOutputSize {
                width: 640,
                height: 0
            })
        );
    }

    #[test]
    fn blur_size_rejects_nan_and_negative() {
        assert!(BlurSize::new(f32::NAN).is_err());
        assert!(BlurSize::new(-0.5).is_err());
        assert!(BlurSize::new(0.0).is_ok());
    }

    #[test]
    fn offsets_follow_blur_size_and_texel_size() {
        let offsets = SampleOffsets::compute(BlurSize::new(2.0).unwrap(), (200, 100));
        assert_close(offsets.horizontal, [0.01, 0.0]);
        assert_close(offsets.vertical, [0.0, 0.02]);
        assert_close(offsets.near(PassDirection::Horizontal), [0.015, 0.0]);
        assert_close(offsets.far(PassDirection::Vertical), [0.0, 0.07]);
    }

    fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn uniform_block_is_32_bytes() {
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 32);
    }

    #[test]
    fn uniforms_default_to_log_sentinel() {
        let uniforms = BlurUniforms::new(
            [0.1, 0.0],
            AspectRatio::default(),
            FocusPoint::CENTER,
            None,
        );
        assert_eq!(uniforms.debug_log, LOG_SENTINEL);
    }
}
