//! The blur filter: parameter state, command draining and drawing.

use crate::command::{CommandQueue, FilterCommand, FilterHandle};
use crate::error::FilterError;
use crate::params::{AspectRatio, BlurSize, BlurUniforms, FocusPoint, PassDirection, SampleOffsets};
use crate::two_pass::TwoPassFilter;
use crate::weight::{RadialWeight, UniformWeight, WeightFunction};

/// Tilt-shift blur: sharp around the focus point, blurrier further out.
pub type TiltShiftFilter = BlurFilter<RadialWeight>;
/// Constant spread everywhere.
pub type BoxBlurFilter = BlurFilter<UniformWeight>;

/// Construction parameters for [`BlurFilter`].
#[derive(Debug, Clone)]
pub struct FilterConfig<W = RadialWeight> {
    pub blur_size: f32,
    pub weight: W,
    /// Prefix of every GPU object label created by the filter.
    pub label_prefix: String,
}

impl<W: Default> Default for FilterConfig<W> {
    fn default() -> Self {
        Self {
            blur_size: 1.0,
            weight: W::default(),
            label_prefix: "tilt_shift".to_owned(),
        }
    }
}

/// Filter parameters as seen by the draw thread.
///
/// Only the draw thread mutates this, by applying [`FilterCommand`]s. Any
/// change that affects the uniforms marks the state dirty; [`Self::refresh`]
/// recomputes the offsets once and reports whether an upload is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    output_size: Option<(u32, u32)>,
    aspect_ratio: AspectRatio,
    focus: FocusPoint,
    /// Focus request received before the output size was known.
    pending_focus: Option<(f32, f32)>,
    blur_size: BlurSize,
    offsets: SampleOffsets,
    debug_log: Option<f32>,
    dirty: bool,
}

impl FilterState {
    pub fn new(blur_size: BlurSize) -> Self {
        Self {
            output_size: None,
            aspect_ratio: AspectRatio::default(),
            focus: FocusPoint::CENTER,
            pending_focus: None,
            blur_size,
            offsets: SampleOffsets::default(),
            debug_log: None,
            dirty: true,
        }
    }

    pub fn apply(&mut self, command: FilterCommand) -> Result<(), FilterError> {
        match command {
            FilterCommand::SetBlurSize(blur_size) => self.set_blur_size(blur_size),
            FilterCommand::Focus { x, y } => self.set_focus_pixels(x, y),
            FilterCommand::SetDebugLog(value) => self.set_debug_log(value),
            FilterCommand::Resize { width, height } => self.set_output_size(width, height)?,
        }
        Ok(())
    }

    /// Recomputes the aspect ratio, and resolves a focus request that was
    /// waiting for a known size.
    pub fn set_output_size(&mut self, width: u32, height: u32) -> Result<(), FilterError> {
        self.aspect_ratio = AspectRatio::from_output_size(width, height)?;
        self.output_size = Some((width, height));
        if let Some((x, y)) = self.pending_focus.take() {
            self.focus = FocusPoint::from_pixels(x, y, (width, height));
        }
        self.dirty = true;
        Ok(())
    }

    pub fn set_blur_size(&mut self, blur_size: BlurSize) {
        self.blur_size = blur_size;
        self.dirty = true;
    }

    /// `x`, `y` in output pixels, origin top-left.
    pub fn set_focus_pixels(&mut self, x: f32, y: f32) {
        match self.output_size {
            Some(size) => self.focus = FocusPoint::from_pixels(x, y, size),
            None => self.pending_focus = Some((x, y)),
        }
        self.dirty = true;
    }

    /// Sets the focus in normalized screen space and drops any pending
    /// pixel focus.
    pub fn set_focus(&mut self, focus: FocusPoint) {
        self.focus = focus;
        self.pending_focus = None;
        self.dirty = true;
    }

    pub fn set_debug_log(&mut self, value: Option<f32>) {
        self.debug_log = value;
        self.dirty = true;
    }

    /// Recomputes offsets if anything changed since the last call. Returns
    /// `true` when the uniforms have to be uploaded again.
    pub fn refresh(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        if let Some(size) = self.output_size {
            self.offsets = SampleOffsets::compute(self.blur_size, size);
        }
        self.dirty = false;
        true
    }

    /// Uniforms of both passes. Everything but the texel step is shared.
    pub fn uniforms(&self) -> [BlurUniforms; 2] {
        PassDirection::ALL.map(|direction| {
            BlurUniforms::new(
                self.offsets.step(direction),
                self.aspect_ratio,
                self.focus,
                self.debug_log,
            )
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn output_size(&self) -> Option<(u32, u32)> {
        self.output_size
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn focus(&self) -> FocusPoint {
        self.focus
    }

    pub fn blur_size(&self) -> BlurSize {
        self.blur_size
    }

    pub fn offsets(&self) -> SampleOffsets {
        self.offsets
    }

    pub fn debug_log(&self) -> Option<f32> {
        self.debug_log
    }
}

/// Two-pass blur with a weight strategy and a command queue.
///
/// Setters may be called from any thread through a [`FilterHandle`]; their
/// effects land right before the next [`Self::draw`], which must run on the
/// thread that owns the device and queue.
pub struct BlurFilter<W: WeightFunction = RadialWeight> {
    passes: TwoPassFilter<W>,
    state: FilterState,
    commands: CommandQueue,
}

impl<W: WeightFunction> BlurFilter<W> {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        config: FilterConfig<W>,
    ) -> Result<Self, FilterError> {
        let blur_size = BlurSize::new(config.blur_size)?;
        let passes = TwoPassFilter::new(device, format, config.weight, &config.label_prefix)?;
        Ok(Self {
            passes,
            state: FilterState::new(blur_size),
            commands: CommandQueue::new(),
        })
    }

    /// A sender for parameter changes that can be moved to other threads.
    pub fn handle(&self) -> FilterHandle {
        self.commands.handle()
    }

    /// Scale of the sampling offsets, 1.0 by default.
    pub fn set_blur_size(&self, blur_size: f32) -> Result<(), FilterError> {
        self.handle().set_blur_size(blur_size)
    }

    /// Moves the sharp zone to `(x, y)` in output pixels.
    pub fn focus(&self, x: f32, y: f32) -> Result<(), FilterError> {
        self.handle().focus(x, y)
    }

    /// Forces every fragment to `vec4(value, 0, 0, 1)`; `None` turns it off.
    pub fn set_debug_log(&self, value: Option<f32>) -> Result<(), FilterError> {
        self.handle().set_debug_log(value)
    }

    /// Applies a new output size immediately. Called from the draw thread.
    pub fn on_output_size_changed(&mut self, width: u32, height: u32) -> Result<(), FilterError> {
        self.state.set_output_size(width, height)?;
        tracing::debug!(
            width,
            height,
            aspect_ratio = self.state.aspect_ratio().get(),
            "output size changed"
        );
        Ok(())
    }

    /// Applies every queued command in order. Commands that fail are logged
    /// and dropped.
    pub fn run_pending(&mut self) {
        for command in self.commands.drain() {
            match self.state.apply(command) {
                Ok(()) => tracing::debug!(?command, "applied filter command"),
                Err(error) => tracing::warn!(?command, %error, "dropped filter command"),
            }
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn weight(&self) -> &W {
        self.passes.weight()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.passes.format()
    }

    /// Drains the queue, uploads uniforms if they changed, and records both
    /// passes from `source_view` into `target_view`. The target must have the
    /// output size in effect after the drain; queued resizes are applied here.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
    ) -> Result<(), FilterError> {
        self.run_pending();
        self.draw_applied(device, queue, encoder, source_view, target_view)
    }

    /// Like [`Self::draw`] but with the state as it is, for callers that
    /// drained the queue themselves and sized their target from it.
    pub(crate) fn draw_applied(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
    ) -> Result<(), FilterError> {
        let size = self
            .state
            .output_size()
            .ok_or(FilterError::InvalidOutputSize {
                width: 0,
                height: 0,
            })?;

        if self.state.refresh() {
            self.passes.write_uniforms(queue, &self.state.uniforms());
        }

        tracing::trace!(width = size.0, height = size.1, "encoding blur passes");
        self.passes
            .encode(device, encoder, source_view, target_view, size);
        Ok(())
    }
}
