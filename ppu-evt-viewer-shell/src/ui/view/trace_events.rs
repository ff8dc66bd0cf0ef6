use egui::{vec2, Color32, ColorImage, Pos2, Rect, RichText, TextureHandle, TextureOptions, Ui};
use egui_extras::{Column, TableBuilder};

use ppu_evt_viewer::{
    framebuffer::Framebuffer,
    hover::HoverReadout,
    prefs::MemoryPreferences,
    transform::PixelPos,
    viewer::Viewer,
};

use crate::ui::{blank_texture_for_framebuffer, full_framebuffer_image_delta};

const SURFACE_TEXTURE_NAME: &str = "trace_events_surface";
const REFERENCE_TEXTURE_NAME: &str = "trace_events_reference";

/// Lower bound so a narrow window still leaves something to hover over
const MIN_SURFACE_WIDTH: f32 = 320.0;

struct TypeRow {
    event_type: String,
    enabled: bool,
    supported: bool,
    count: usize,
}

pub struct TraceEventsView {
    surface_texture: TextureHandle,
    reference_texture: Option<TextureHandle>,

    frame_text: String,
    hover: Option<HoverReadout>,
}

impl TraceEventsView {
    pub fn new(ctx: &egui::Context, fb: &Framebuffer) -> Self {
        Self {
            surface_texture: blank_texture_for_framebuffer(ctx, fb, SURFACE_TEXTURE_NAME),
            reference_texture: None,
            frame_text: String::new(),
            hover: None,
        }
    }

    pub fn set_reference_image(&mut self, ctx: &egui::Context, image: ColorImage) {
        log::debug!("Reference image is {}x{}", image.size[0], image.size[1]);
        self.reference_texture = Some(ctx.load_texture(REFERENCE_TEXTURE_NAME, image, TextureOptions::NEAREST));
    }

    pub fn set_frame_text(&mut self, text: String) {
        self.frame_text = text;
    }

    fn draw_type_table(&mut self, viewer: &mut Viewer<MemoryPreferences>, ui: &mut Ui) {
        // Snapshot the rows so toggling can borrow the viewer mutably
        let rows: Vec<TypeRow> = viewer
            .toggles()
            .iter()
            .map(|t| TypeRow {
                event_type: t.event_type.clone(),
                enabled: t.enabled,
                supported: t.supported,
                count: viewer.type_count(&t.event_type),
            })
            .collect();

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(24.0))
            .column(Column::auto().at_least(160.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|_ui| {});
                header.col(|ui| {
                    ui.strong("Event");
                });
                header.col(|ui| {
                    ui.strong("Count");
                });
            })
            .body(|mut body| {
                for row in rows {
                    body.row(20.0, |mut table_row| {
                        table_row.col(|ui| {
                            let mut enabled = row.enabled;
                            if ui
                                .add_enabled(row.supported, egui::Checkbox::new(&mut enabled, ""))
                                .changed()
                            {
                                viewer.set_type_enabled(&row.event_type, enabled);
                            }
                        });
                        table_row.col(|ui| {
                            if row.supported {
                                ui.label(row.event_type.as_str());
                            } else {
                                ui.label(RichText::new(format!("{} (Not supported)", row.event_type)).weak());
                            }
                        });
                        table_row.col(|ui| {
                            ui.label(row.count.to_string());
                        });
                    });
                }
            });
    }

    fn draw_options(&mut self, viewer: &mut Viewer<MemoryPreferences>, ui: &mut Ui) {
        let frames = viewer.frame_count();
        let frames_color = match frames {
            0 => ui.visuals().text_color(),
            1 => Color32::GREEN,
            _ => Color32::YELLOW,
        };
        ui.horizontal(|ui| {
            ui.label("Frames:");
            ui.label(RichText::new(frames.to_string()).color(frames_color));
            ui.separator();
            ui.label(format!("Points: {}", viewer.point_count()));
        });
        if frames > 1 {
            ui.label(RichText::new("Multiple frames overlap, filter to a single frame").color(Color32::YELLOW));
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Frame:");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.frame_text).desired_width(48.0));
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Filter").clicked() || submitted {
                match self.frame_text.trim().parse::<usize>() {
                    Ok(frame) => viewer.set_frame_filter(Some(frame)),
                    Err(_) => log::warn!("Not a frame index: {:?}", self.frame_text),
                }
            }
            if ui.button("Show All").clicked() {
                self.frame_text.clear();
                viewer.set_frame_filter(None);
            }
        });
        if let Some(frame) = viewer.frame_filter() {
            ui.label(format!("Showing frame {frame} of {}", viewer.trace_frame_count()));
        }

        let counts = viewer.frame_event_counts();
        egui::CollapsingHeader::new(format!("Events per frame ({})", counts.len()))
            .id_source("trace_events_frame_counts")
            .show(ui, |ui| {
                egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                    for (frame, count) in counts.iter().enumerate() {
                        let selected = viewer.frame_filter() == Some(frame);
                        if ui
                            .selectable_label(selected, format!("Frame {frame}: {count} events"))
                            .clicked()
                        {
                            self.frame_text = frame.to_string();
                            viewer.set_frame_filter(Some(frame));
                        }
                    }
                });
            });

        ui.separator();
        let overlay = viewer.overlay();
        ui.horizontal(|ui| {
            ui.label("Reference offset:");
            let mut offset = overlay.offset;
            if ui.add(egui::DragValue::new(&mut offset).speed(0.25)).changed() {
                viewer.set_overlay_offset(offset);
            }
            if ui.button("Reset").clicked() {
                viewer.reset_overlay_offset();
            }
        });
        let mut hidden = overlay.hidden;
        if ui.checkbox(&mut hidden, "Hide reference image").changed() {
            viewer.set_overlay_hidden(hidden);
        }

        ui.separator();
        self.draw_type_table(viewer, ui);
    }

    fn draw_surface(&mut self, viewer: &mut Viewer<MemoryPreferences>, ui: &mut Ui) {
        let width = ui.available_width().max(MIN_SURFACE_WIDTH).floor() as usize;
        let (width, height) = Viewer::<MemoryPreferences>::surface_size_for_width(width);
        viewer.resize(width, height);

        if viewer.take_repaint() {
            let fb = viewer.framebuffer();
            if fb.width() > 0 && fb.height() > 0 {
                let delta = full_framebuffer_image_delta(fb);
                ui.ctx().tex_manager().write().set(self.surface_texture.id(), delta);
            }
        }

        let (response, painter) = ui.allocate_painter(vec2(width as f32, height as f32), egui::Sense::hover());
        let origin = response.rect.left_top();
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        let overlay = viewer.overlay();
        if let (Some(reference), false) = (&self.reference_texture, overlay.hidden) {
            let [ref_w, ref_h] = reference.size();
            if ref_w > 0 {
                let ref_height = ref_h as f32 * (width as f32 / ref_w as f32);
                let x = overlay.pixel_offset(&viewer.transform());
                let rect = Rect::from_min_size(origin + vec2(x, 0.0), vec2(width as f32, ref_height));
                painter.with_clip_rect(response.rect).image(reference.id(), rect, uv, Color32::WHITE);
            }
        }
        painter.image(self.surface_texture.id(), response.rect, uv, Color32::WHITE);

        self.hover = response.hover_pos().and_then(|pos| {
            viewer.hover(PixelPos {
                x: pos.x - origin.x,
                y: pos.y - origin.y,
            })
        });
        if let Some(readout) = self.hover {
            response.on_hover_ui_at_pointer(|ui| {
                ui.label(format!("lx: {}", readout.lx));
                ui.label(format!("ly: {}", readout.ly));
                ui.label(format!("dots: {}", readout.dots));
            });
        }
    }

    pub fn draw(&mut self, viewer: &mut Viewer<MemoryPreferences>, ctx: &egui::Context) {
        egui::SidePanel::left("trace_events_options_panel")
            .resizable(true)
            .min_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_options(viewer, ui);
                });
            });

        egui::TopBottomPanel::bottom("trace_events_footer").show(ctx, |ui| match self.hover {
            Some(readout) => {
                ui.label(format!("lx = {}, ly = {}, dots = {}", readout.lx, readout.ly, readout.dots));
            }
            None => {
                ui.label(" ");
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_surface(viewer, ui);
            });
        });
    }
}
