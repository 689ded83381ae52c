//! Generic two-pass separable filter.
//!
//! Compiles one WGSL module per weight strategy and runs it twice: the
//! horizontal pass reads the source and writes an intermediate texture, the
//! vertical pass reads the intermediate and writes the caller's target. Each
//! pass has its own uniform buffer so the texel step can differ.

use wgpu::util::DeviceExt;

use crate::error::FilterError;
use crate::params::{BlurUniforms, PassDirection};
use crate::shader::{build_filter_wgsl, validate_filter_wgsl, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::weight::WeightFunction;

/// A compiled pass with its uniforms.
pub(crate) struct FilterPass {
    pub direction: PassDirection,
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
}

/// Output of the first pass, input of the second. Recreated on size change.
struct IntermediateTarget {
    view: wgpu::TextureView,
    size: (u32, u32),
}

pub struct TwoPassFilter<W: WeightFunction> {
    weight: W,
    passes: [FilterPass; 2],
    input_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
    label_prefix: String,
    intermediate: Option<IntermediateTarget>,
}

/// Creates the bind group layout for pass input: texture_2d + sampler at group(0).
fn create_input_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blur_input_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Uniforms are read by both stages: the vertex stage builds the tap
/// coordinates, the fragment stage evaluates the weight.
fn create_uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blur_uniforms_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<BlurUniforms>() as u64
                ),
            },
            count: None,
        }],
    })
}

fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("blur_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn create_texture_sample_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_pass(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    pipeline_layout: &wgpu::PipelineLayout,
    uniform_bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    direction: PassDirection,
    label_prefix: &str,
) -> FilterPass {
    let pipeline_label = format!("{label_prefix}_{}_pipeline", direction.label());
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&pipeline_label),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[], // Fullscreen triangle, no vertex buffers
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let buffer_label = format!("{label_prefix}_{}_uniforms", direction.label());
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&buffer_label),
        contents: bytemuck::bytes_of(&BlurUniforms::default()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group_label = format!("{label_prefix}_{}_uniforms_bg", direction.label());
    let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&bind_group_label),
        layout: uniform_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    FilterPass {
        direction,
        pipeline,
        uniform_buffer,
        uniform_bind_group,
    }
}

impl<W: WeightFunction> TwoPassFilter<W> {
    /// Compiles the module for `weight` and builds both passes.
    ///
    /// Fails before touching the device when the composed WGSL is missing the
    /// weight function or one of the uniform members.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        weight: W,
        label_prefix: &str,
    ) -> Result<Self, FilterError> {
        let source = build_filter_wgsl(&weight.wgsl());
        validate_filter_wgsl(&source)?;

        let shader_label = format!("{label_prefix}_shader");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&shader_label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let input_bind_group_layout = create_input_bind_group_layout(device);
        let uniform_bind_group_layout = create_uniform_bind_group_layout(device);

        let layout_label = format!("{label_prefix}_pipeline_layout");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&layout_label),
            bind_group_layouts: &[&input_bind_group_layout, &uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let passes = PassDirection::ALL.map(|direction| {
            create_pass(
                device,
                &shader,
                &pipeline_layout,
                &uniform_bind_group_layout,
                format,
                direction,
                label_prefix,
            )
        });

        tracing::debug!(label = label_prefix, ?format, "compiled two-pass filter");

        Ok(Self {
            weight,
            passes,
            input_bind_group_layout,
            sampler: create_sampler(device),
            format,
            label_prefix: label_prefix.to_owned(),
            intermediate: None,
        })
    }

    pub fn weight(&self) -> &W {
        &self.weight
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Uploads per-pass uniforms, indexed by [`PassDirection::index`].
    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &[BlurUniforms; 2]) {
        for pass in &self.passes {
            queue.write_buffer(
                &pass.uniform_buffer,
                0,
                bytemuck::bytes_of(&uniforms[pass.direction.index()]),
            );
        }
    }

    fn ensure_intermediate(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let needs_recreate = self
            .intermediate
            .as_ref()
            .map(|target| target.size != size)
            .unwrap_or(true);

        if !needs_recreate {
            return;
        }

        let label = format!("{}_intermediate", self.label_prefix);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!(width = size.0, height = size.1, "recreated intermediate target");
        self.intermediate = Some(IntermediateTarget { view, size });
    }

    /// Records both passes into `encoder`. `target_view` must have the
    /// filter's format and the given `size`.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
        size: (u32, u32),
    ) {
        self.ensure_intermediate(device, size);
        let Some(intermediate) = self.intermediate.as_ref() else {
            return;
        };

        let mut previous_input_view = source_view;

        for pass in &self.passes {
            let output_view = match pass.direction {
                PassDirection::Horizontal => &intermediate.view,
                PassDirection::Vertical => target_view,
            };

            let input_bind_group = create_texture_sample_bind_group(
                device,
                &self.input_bind_group_layout,
                previous_input_view,
                &self.sampler,
                &format!("{}_{}_input_bg", self.label_prefix, pass.direction.label()),
            );

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!(
                    "{}_{}_pass",
                    self.label_prefix,
                    pass.direction.label()
                )),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&pass.pipeline);
            render_pass.set_bind_group(0, &input_bind_group, &[]);
            render_pass.set_bind_group(1, &pass.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            previous_input_view = output_view;
        }
    }
}
