//! Headless host for a [`BlurFilter`].
//!
//! Owns the device and queue, the source texture, an output texture sized to
//! the filter's output and a readback buffer. It is the minimal collaborator
//! needed to run the filter end to end without a window.

use std::sync::Arc;

use crate::command::FilterHandle;
use crate::error::FilterError;
use crate::filter::{BlurFilter, FilterConfig};
use crate::weight::{RadialWeight, WeightFunction};

mod construction;
mod readback;
mod source;

use readback::{compute_padded_bytes_per_row, copy_padded_readback_rows};
use source::SourceTexture;

/// Construction parameters for [`Renderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig<W = RadialWeight> {
    /// Format of the output and intermediate textures.
    pub format: wgpu::TextureFormat,
    pub power_preference: wgpu::PowerPreference,
    pub filter: FilterConfig<W>,
}

impl<W: Default> Default for RendererConfig<W> {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Rgba8Unorm,
            power_preference: wgpu::PowerPreference::HighPerformance,
            filter: FilterConfig::default(),
        }
    }
}

pub struct Renderer<W: WeightFunction = RadialWeight> {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    /// Size of the filter output
    physical_size: (u32, u32),
    filter: BlurFilter<W>,
    source: Option<SourceTexture>,
    output_texture: Option<wgpu::Texture>,
    readback_buffer: Option<wgpu::Buffer>,
    readback_bytes: Vec<u8>,
}

impl<W: WeightFunction> Renderer<W> {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn size(&self) -> (u32, u32) {
        self.physical_size
    }

    pub fn filter(&self) -> &BlurFilter<W> {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut BlurFilter<W> {
        &mut self.filter
    }

    /// Shortcut for [`BlurFilter::handle`].
    pub fn handle(&self) -> FilterHandle {
        self.filter.handle()
    }

    /// Changes the output size. The output texture and readback buffer are
    /// recreated lazily on the next render.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), FilterError> {
        self.filter.on_output_size_changed(width, height)?;
        if self.physical_size != (width, height) {
            self.physical_size = (width, height);
            self.output_texture = None;
            self.readback_buffer = None;
        }
        Ok(())
    }

    /// Applies queued commands and adopts the output size the filter ended
    /// up with, so a `Resize` sent through a handle sizes the textures of the
    /// frame about to be drawn. Call it before sizing a target for
    /// [`Self::render_into`].
    pub fn apply_pending(&mut self) {
        self.filter.run_pending();
        if let Some(size) = self.filter.state().output_size() {
            if size != self.physical_size {
                tracing::debug!(width = size.0, height = size.1, "adopted queued output size");
                self.physical_size = size;
                self.output_texture = None;
                self.readback_buffer = None;
            }
        }
    }

    fn ensure_output_texture(&mut self) -> &wgpu::Texture {
        let (width, height) = self.physical_size;
        self.output_texture.get_or_insert_with(|| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("filter_output"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.filter.format(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        })
    }

    /// Runs the filter from the loaded source into `target_view`, recording
    /// into `encoder`. The caller submits.
    ///
    /// Queued commands are not drained here: call [`Self::apply_pending`]
    /// first and size `target_view` from [`Self::size`].
    pub fn render_into(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target_view: &wgpu::TextureView,
    ) -> Result<(), FilterError> {
        let source = self.source.as_ref().ok_or(FilterError::SourceNotLoaded)?;
        self.filter.draw_applied(
            &self.device,
            &self.queue,
            encoder,
            &source.view,
            target_view,
        )
    }

    /// Renders and reads back the output as tightly packed rows of 4 bytes
    /// per pixel, in the byte order of the configured format.
    pub fn render_to_buffer(&mut self, buffer: &mut Vec<u8>) -> Result<(), FilterError> {
        self.apply_pending();
        let (width, height) = self.physical_size;
        let (unpadded_bytes_per_row, padded_bytes_per_row) =
            compute_padded_bytes_per_row(width, 4);

        let output_view = self
            .ensure_output_texture()
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("filter_encoder"),
            });

        self.render_into(&mut encoder, &output_view)?;

        let buffer_size = padded_bytes_per_row as u64 * height as u64;
        let readback_buffer = self.readback_buffer.get_or_insert_with(|| {
            readback::create_readback_buffer(&self.device, Some("filter_readback"), buffer_size)
        });

        if let Some(output_texture) = self.output_texture.as_ref() {
            readback::encode_copy_texture_to_buffer(
                &mut encoder,
                output_texture,
                readback_buffer,
                width,
                height,
                padded_bytes_per_row,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let mut readback_bytes = std::mem::take(&mut self.readback_bytes);
        let mapped = readback::map_readback_buffer_into(
            &self.device,
            readback_buffer,
            &mut readback_bytes,
        );
        let result = mapped.map(|()| {
            copy_padded_readback_rows(
                &readback_bytes,
                height,
                unpadded_bytes_per_row,
                padded_bytes_per_row,
                buffer,
            )
        });
        self.readback_bytes = readback_bytes;
        result
    }
}
