//! egui panels: the mesh properties side panel and the central viewport
//! panel the off-screen render is composited into.

use crate::renderer::Renderer;
use crate::scene::Scene;
use cgns::Zone;

/// Left panel: loaded file, material scalars and the CGNS metadata tree.
pub fn draw_properties(ctx: &egui::Context, scene: &mut Scene) {
    egui::SidePanel::left("properties")
        .default_width(260.0)
        .show(ctx, |ui| {
            egui::CollapsingHeader::new("Mesh")
                .default_open(true)
                .show(ui, |ui| {
                    match scene.file() {
                        Some(path) => {
                            ui.label(path.display().to_string());
                            ui.label(format!("{} points", scene.point_count()));
                        }
                        None => {
                            ui.label("No file loaded.");
                            ui.label("Drop a .cgns file onto the window to open it.");
                        }
                    };
                });

            egui::CollapsingHeader::new("Material").show(ui, |ui| {
                let mut rgb = scene.color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Albedo");
                    ui.color_edit_button_rgb(&mut rgb);
                });
                scene.color = glam::Vec3::from_array(rgb);

                ui.add(egui::Slider::new(&mut scene.roughness, 0.0..=1.0).text("Roughness"));
                ui.add(egui::Slider::new(&mut scene.metallic, 0.0..=1.0).text("Metallic"));
            });

            if let Some(root) = scene.root() {
                egui::CollapsingHeader::new("CGNS")
                    .default_open(true)
                    .show(ui, |ui| {
                        for (i, base) in root.bases.iter().enumerate() {
                            draw_base(ui, i, base);
                        }
                    });
            }
        });
}

fn draw_base(ui: &mut egui::Ui, index: usize, base: &cgns::Base) {
    egui::CollapsingHeader::new(&base.name)
        .id_source(("base", index))
        .show(ui, |ui| {
            egui::CollapsingHeader::new("Zones")
                .id_source(("zones", index))
                .show(ui, |ui| {
                    for zone in &base.zones {
                        ui.label(describe_zone(zone));
                    }
                });

            egui::CollapsingHeader::new("Families")
                .id_source(("families", index))
                .show(ui, |ui| {
                    for family in &base.families {
                        ui.label(&family.name);
                    }
                });
        });
}

fn describe_zone(zone: &Zone) -> String {
    match zone {
        Zone::Structured(z) => format!(
            "{} (structured, {}x{}x{} vertices)",
            z.name, z.vertex_counts[0], z.vertex_counts[1], z.vertex_counts[2]
        ),
        Zone::Unstructured(z) => {
            format!("{} (unstructured, {} vertices)", z.name, z.vertex_count)
        }
    }
}

/// Central panel: sizes the off-screen target to the panel and shows its
/// color attachment as an image.
pub fn draw_viewport(ctx: &egui::Context, renderer: &mut Renderer) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            let avail = ui.available_size();
            let ppp = ctx.pixels_per_point();

            // The target is allocated in physical pixels; the image widget
            // is laid out in points.
            renderer.ensure_viewport(
                (avail.x * ppp).round() as u32,
                (avail.y * ppp).round() as u32,
            );

            if avail.x > 0.0 && avail.y > 0.0 {
                ui.add(egui::Image::new(egui::load::SizedTexture::new(
                    renderer.viewport_texture(),
                    avail,
                )));
            }
        });
}
