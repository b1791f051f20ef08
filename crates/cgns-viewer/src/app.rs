use crate::{renderer::Renderer, scene::Scene, ui};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

pub struct App {
    pub renderer: Renderer,
    pub scene: Scene,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
}

impl App {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let scene = Scene::new();

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            scene,
            egui_ctx,
            egui_state,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize(new_size);
    }

    /// Forwards an event to the UI first; returns true when it was consumed.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        match event {
            WindowEvent::Resized(physical_size) => {
                self.resize(*physical_size);
                false
            }
            WindowEvent::DroppedFile(path) => {
                self.load_mesh(path);
                true
            }
            _ => false,
        }
    }

    /// Loads a mesh file into the scene. Failures are logged and leave the
    /// previously loaded scene untouched.
    pub fn load_mesh(&mut self, path: &Path) {
        match self.scene.load_file(&self.renderer.gfx.device, path) {
            Ok(()) => log::info!(
                "Loaded {} ({} points)",
                path.display(),
                self.scene.point_count()
            ),
            Err(err) => log::error!("Failed to load {}: {}", path.display(), err),
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Build the UI. The viewport panel resizes the off-screen target to
        // its current size, so the scene pass below renders at panel size.
        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_properties(&self.egui_ctx, &mut self.scene);
        ui::draw_viewport(&self.egui_ctx, &mut self.renderer);

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.renderer.render_scene(&mut encoder, &self.scene);

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(crate::renderer::CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
