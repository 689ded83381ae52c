//! Tilt-shift radial box blur on the GPU.
//!
//! Pixels close to a focus point stay sharp, pixels further away are blurred
//! by a five tap box kernel whose spread grows with the distance. The blur is
//! separable and runs as a horizontal pass followed by a vertical pass.
//!
//! ```no_run
//! # use futures::executor::block_on;
//! use tiltshift::{Renderer, RendererConfig};
//!
//! let mut renderer: Renderer = block_on(Renderer::new_headless((640, 480), RendererConfig::default()));
//! renderer.load_source_rgba((640, 480), &vec![255; 640 * 480 * 4]).unwrap();
//!
//! // Any thread can hold a handle.
//! let handle = renderer.handle();
//! handle.focus(320.0, 120.0).unwrap();
//! handle.set_blur_size(2.0).unwrap();
//!
//! let mut pixels = Vec::new();
//! renderer.render_to_buffer(&mut pixels).unwrap();
//! ```

pub use wgpu;

mod command;
pub mod cpu;
mod error;
mod filter;
mod params;
mod renderer;
mod shader;
mod two_pass;
mod weight;

pub use command::{FilterCommand, FilterHandle};
pub use error::FilterError;
pub use filter::{BlurFilter, BoxBlurFilter, FilterConfig, FilterState, TiltShiftFilter};
pub use params::{
    AspectRatio, BlurSize, BlurUniforms, FocusPoint, PassDirection, SampleOffsets, FAR_TAP,
    LOG_SENTINEL, NEAR_TAP, TAP_COEFFICIENT,
};
pub use renderer::{Renderer, RendererConfig};
pub use two_pass::TwoPassFilter;
pub use weight::{RadialWeight, UniformWeight, WeightFunction, WGSL_WEIGHT_FN};
