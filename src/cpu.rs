//! Software rendition of the two-pass blur.
//!
//! Mirrors the shader step by step: pixel centers as texture coordinates,
//! clamp-to-edge bilinear sampling, five taps at 0.2 each, and an 8-bit
//! intermediate between the passes like an `Rgba8Unorm` render target. Useful
//! to check GPU output and to blur images where no adapter is available.

use crate::error::FilterError;
use crate::filter::FilterState;
use crate::params::{PassDirection, SampleOffsets, FAR_TAP, LOG_SENTINEL, NEAR_TAP, TAP_COEFFICIENT};
use crate::weight::WeightFunction;

type Rgba = [f32; 4];

struct Plane {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Plane {
    fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| {
                [
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                    px[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|px| px.map(quantize))
            .collect()
    }

    fn texel(&self, x: i64, y: i64) -> Rgba {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Bilinear sample with clamp-to-edge addressing.
    fn sample(&self, uv: [f32; 2]) -> Rgba {
        let fx = uv[0] * self.width as f32 - 0.5;
        let fy = uv[1] * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(self.texel(x0, y0), self.texel(x0 + 1, y0), tx);
        let bottom = lerp(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), tx);
        lerp(top, bottom, ty)
    }
}

fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [0, 1, 2, 3].map(|i| a[i] + (b[i] - a[i]) * t)
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn run_pass<W: WeightFunction>(
    source: &Plane,
    weight: &W,
    state: &FilterState,
    step: [f32; 2],
) -> Plane {
    let (width, height) = (source.width, source.height);
    let focus = state.focus();
    let aspect_ratio = state.aspect_ratio();
    let mut pixels = Vec::with_capacity(source.pixels.len());

    for y in 0..height {
        for x in 0..width {
            let uv = [
                (x as f32 + 0.5) / width as f32,
                (y as f32 + 0.5) / height as f32,
            ];
            let screen = [uv[0] * 2.0 - 1.0, 1.0 - uv[1] * 2.0];
            let w = weight.weight(screen, focus, aspect_ratio);

            if w <= 0.0 {
                pixels.push(source.sample(uv));
                continue;
            }

            let near = [step[0] * NEAR_TAP * w, step[1] * NEAR_TAP * w];
            let far = [step[0] * FAR_TAP * w, step[1] * FAR_TAP * w];
            let taps = [
                uv,
                [uv[0] - near[0], uv[1] - near[1]],
                [uv[0] + near[0], uv[1] + near[1]],
                [uv[0] - far[0], uv[1] - far[1]],
                [uv[0] + far[0], uv[1] + far[1]],
            ];

            let mut color = [0.0; 4];
            for tap in taps {
                let sample = source.sample(tap);
                for channel in 0..4 {
                    color[channel] += sample[channel] * TAP_COEFFICIENT;
                }
            }
            pixels.push(color);
        }
    }

    Plane {
        width,
        height,
        pixels,
    }
}

/// Blurs tightly packed RGBA8 `pixels` sized like the state's output.
///
/// Uses the state's current parameters; offsets are derived from its blur
/// size directly, so the state does not need to be refreshed first.
pub fn blur_rgba8<W: WeightFunction>(
    weight: &W,
    state: &FilterState,
    pixels: &[u8],
) -> Result<Vec<u8>, FilterError> {
    let (width, height) = state.output_size().ok_or(FilterError::InvalidOutputSize {
        width: 0,
        height: 0,
    })?;

    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(FilterError::SourceSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    if let Some(value) = state.debug_log().filter(|value| *value != LOG_SENTINEL) {
        let pixel = [quantize(value), 0, 0, 255];
        return Ok(pixel.repeat(width as usize * height as usize));
    }

    let offsets = SampleOffsets::compute(state.blur_size(), (width, height));
    let mut plane = Plane::from_rgba8(width, height, pixels);
    for direction in PassDirection::ALL {
        plane = run_pass(&plane, weight, state, offsets.step(direction));
        // Intermediate and final targets store 8 bits per channel.
        plane = Plane::from_rgba8(width, height, &plane.to_rgba8());
    }

    Ok(plane.to_rgba8())
}
