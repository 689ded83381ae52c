use super::*;

impl<W: WeightFunction> Renderer<W> {
    /// Creates a headless renderer, or an error if no adapter or device is
    /// available.
    pub async fn try_new_headless(
        physical_size: (u32, u32),
        config: RendererConfig<W>,
    ) -> Result<Self, FilterError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| FilterError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        tracing::info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "using GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tiltshift_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|error| FilterError::RequestDevice(error.to_string()))?;

        Self::build_from_device(Arc::new(device), Arc::new(queue), physical_size, config)
    }

    /// Creates a headless renderer, panicking if no suitable GPU adapter is
    /// available.
    ///
    /// If you need a non-panicking variant (e.g. in tests), use
    /// [`Self::try_new_headless`] instead.
    pub async fn new_headless(physical_size: (u32, u32), config: RendererConfig<W>) -> Self {
        Self::try_new_headless(physical_size, config)
            .await
            .expect("Failed to create a headless renderer")
    }

    /// Builds a renderer around an existing device, e.g. one shared with the
    /// rest of an application.
    pub fn build_from_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        physical_size: (u32, u32),
        config: RendererConfig<W>,
    ) -> Result<Self, FilterError> {
        let mut filter = BlurFilter::new(&device, config.format, config.filter)?;
        filter.on_output_size_changed(physical_size.0, physical_size.1)?;

        Ok(Self {
            device,
            queue,
            physical_size,
            filter,
            source: None,
            output_texture: None,
            readback_buffer: None,
            readback_bytes: Vec::new(),
        })
    }
}
