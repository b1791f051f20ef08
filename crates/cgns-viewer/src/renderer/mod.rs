//! Rendering orchestrator. Owns the GPU context, the off-screen viewport
//! target and the point pipeline, and keeps the target registered with the
//! egui renderer so the UI can composite it as an image.

pub mod context;
pub mod pipelines;
pub mod viewport;

use self::{context::GfxContext, pipelines::points::PointsPipeline, viewport::ViewportTarget};
use crate::scene::Scene;
use std::sync::Arc;
use winit::window::Window;

/// Background color of the viewport and the window, from the original tool.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.45,
    g: 0.55,
    b: 0.60,
    a: 1.0,
};

pub struct Renderer {
    pub gfx: GfxContext,
    pub viewport: ViewportTarget,
    pub points: PointsPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
    viewport_tex_id: egui::TextureId,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;

        let viewport = ViewportTarget::new(&gfx.device, size.width, size.height);
        let points = PointsPipeline::new(&gfx.device, viewport.color_fmt, viewport.depth_fmt)?;

        let mut egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);
        let viewport_tex_id = egui_renderer.register_native_texture(
            &gfx.device,
            &viewport.color,
            wgpu::FilterMode::Linear,
        );

        Ok(Self {
            gfx,
            viewport,
            points,
            egui_renderer,
            viewport_tex_id,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        // Only the swap chain follows the window; the viewport target tracks
        // the panel size reported by the UI each frame.
        self.gfx.resize(new_size);
    }

    /// Texture id the UI uses to display the off-screen render.
    pub fn viewport_texture(&self) -> egui::TextureId {
        self.viewport_tex_id
    }

    /// Resizes the viewport target to the given panel size if it changed.
    /// Degenerate sizes are ignored; around startup egui can report a zero
    /// height for the panel. The previously registered egui texture is freed
    /// before the replacement view is registered.
    pub fn ensure_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.viewport.fits(width, height) {
            return;
        }

        self.viewport.resize(&self.gfx.device, width, height);

        self.egui_renderer.free_texture(&self.viewport_tex_id);
        self.viewport_tex_id = self.egui_renderer.register_native_texture(
            &self.gfx.device,
            &self.viewport.color,
            wgpu::FilterMode::Linear,
        );

        let (w, h) = self.viewport.size();
        log::debug!("Viewport target resized to {}x{}", w, h);
    }

    /// Records the scene pass into the viewport target: clears color and
    /// depth, then draws the point cloud if one is loaded.
    pub fn render_scene(&self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Viewport Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.viewport.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.viewport.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        scene.render(&mut pass, &self.points);
    }
}
