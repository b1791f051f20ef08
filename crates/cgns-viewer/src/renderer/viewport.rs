//! Off-screen render target sized to the viewport panel, not the window.

/// Color + depth/stencil attachment pair the scene is rendered into. The
/// color attachment is sampled by the UI as a regular texture.
pub struct ViewportTarget {
    // Keep the textures alive for the lifetime of the views.
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,

    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,

    pub color_fmt: wgpu::TextureFormat,
    pub depth_fmt: wgpu::TextureFormat,

    width: u32,
    height: u32,
}

impl ViewportTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        // Guard against the zero-sized panel egui reports on the first frame.
        let width = width.max(1);
        let height = height.max(1);

        let tex_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_fmt = wgpu::TextureFormat::Rgba8UnormSrgb;
        let depth_fmt = wgpu::TextureFormat::Depth24PlusStencil8;

        let color_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Color Target"),
            size: tex_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_fmt,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Depth Target"),
            size: tex_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: depth_fmt,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            color_fmt,
            depth_fmt,
            width,
            height,
        }
    }

    /// Whether the currently allocated attachments already match the given
    /// panel size. Callers use this to skip reallocating every frame.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Drops both attachments and reallocates them at the new size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
