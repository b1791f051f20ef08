use crate::renderer::pipelines::points::PointsPipeline;
use wgpu::util::DeviceExt;

/// GPU-resident point cloud. The packed `[x, y, z]` triples are uploaded
/// once at construction; loading a new file constructs a replacement
/// instance rather than mutating this one.
pub struct PointCloud {
    vtx: wgpu::Buffer,
    point_count: u32,
}

impl PointCloud {
    /// Uploads packed position triples. `vertices.len()` must be a multiple
    /// of three; the draw count is derived from it.
    pub fn upload(device: &wgpu::Device, vertices: &[f32]) -> Self {
        debug_assert_eq!(vertices.len() % 3, 0);

        let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Cloud VB"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vtx,
            point_count: (vertices.len() / 3) as u32,
        }
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pipeline: &'a PointsPipeline) {
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_vertex_buffer(0, self.vtx.slice(..));
        pass.draw(0..self.point_count, 0..1);
    }
}
