use super::*;

/// The image the filter reads from.
pub(super) struct SourceTexture {
    pub(super) texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
    pub(super) size: (u32, u32),
}

impl SourceTexture {
    fn allocate(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("filter_source"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Linear RGBA so the blur averages the stored values directly
            format: wgpu::TextureFormat::Rgba8Unorm,
            // TEXTURE_BINDING to sample in the shader, COPY_DST to upload pixels
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
        }
    }

    fn write(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.size.0),
                rows_per_image: Some(self.size.1),
            },
            wgpu::Extent3d {
                width: self.size.0,
                height: self.size.1,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl<W: WeightFunction> Renderer<W> {
    /// Uploads tightly packed RGBA8 pixels as the filter input. The texture is
    /// reused while the dimensions stay the same.
    ///
    /// The source does not have to match the output size; it is sampled with
    /// normalized coordinates and stretched to fill the output.
    pub fn load_source_rgba(
        &mut self,
        dimensions: (u32, u32),
        pixels: &[u8],
    ) -> Result<(), FilterError> {
        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(FilterError::InvalidOutputSize {
                width: dimensions.0,
                height: dimensions.1,
            });
        }

        let expected = dimensions.0 as usize * dimensions.1 as usize * 4;
        if pixels.len() != expected {
            return Err(FilterError::SourceSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let reuse = self
            .source
            .as_ref()
            .map(|source| source.size == dimensions)
            .unwrap_or(false);
        if !reuse {
            self.source = Some(SourceTexture::allocate(&self.device, dimensions));
        }

        if let Some(source) = self.source.as_ref() {
            source.write(&self.queue, pixels);
        }
        tracing::debug!(width = dimensions.0, height = dimensions.1, "loaded source");
        Ok(())
    }

    pub fn is_source_loaded(&self) -> bool {
        self.source.is_some()
    }
}
