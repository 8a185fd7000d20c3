use eframe::egui;
use egui_extras::{Column, TableBuilder};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::AppConfig;
use crate::export::{self, ExportError};
use crate::geometry::{self, Rectangle};
use crate::interaction::{Editor, Interaction};
use crate::ocr::{self, OcrClient, OcrDispatcher, OcrEndpoint, OcrError, OcrScope};
use crate::overlay;

const EXPORT_FAILED_MESSAGE: &str = "Failed to export the image.";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

pub fn load_image(path: &Path) -> Result<DynamicImage, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn color_image(img: &DynamicImage) -> egui::ColorImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

fn ocr_status(result: &Result<String, OcrError>) -> &'static str {
    match result {
        Ok(_) => "Text extracted.",
        Err(_) => "Text extraction failed.",
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotateApp {
    config: AppConfig,
    raw_image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,

    editor: Editor,

    ocr: Option<OcrDispatcher>,
    ocr_endpoint: OcrEndpoint,
    ocr_scope: OcrScope,
    ocr_output: String,

    show_coordinates: bool,
    status: String,
}

impl AnnotateApp {
    pub fn new(config: AppConfig, image_path: Option<PathBuf>) -> Self {
        let ocr = match OcrClient::new(&config.ocr) {
            Ok(client) => Some(OcrDispatcher::new(client)),
            Err(e) => {
                log::error!("OCR disabled: {e}");
                None
            }
        };
        let mut app = Self {
            ocr_endpoint: config.ocr.endpoint,
            ocr_scope: config.ocr.scope,
            config,
            raw_image: None,
            texture: None,
            editor: Editor::new(),
            ocr,
            ocr_output: String::new(),
            show_coordinates: false,
            status: "Open an image to start.".to_string(),
        };
        if let Some(path) = image_path {
            app.open_image(path);
        }
        app
    }

    fn open_image(&mut self, path: PathBuf) {
        match load_image(&path) {
            Ok(img) => {
                log::info!(
                    "Loaded {} ({}x{})",
                    path.display(),
                    img.width(),
                    img.height()
                );
                self.status = format!("{}", path.display());
                self.raw_image = Some(img);
                self.texture = None;
                self.editor.clear();
            }
            Err(e) => {
                log::error!("{e}");
                self.status = e.to_string();
            }
        }
    }

    fn pick_image(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
            .pick_file();
        if let Some(path) = picked {
            self.open_image(path);
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_none() {
            self.texture = self.raw_image.as_ref().map(|img| {
                ctx.load_texture("page", color_image(img), egui::TextureOptions::NEAREST)
            });
        }
    }

    fn composite(&self) -> Result<image::RgbaImage, ExportError> {
        let raw = self.raw_image.as_ref().ok_or(ExportError::NoImage)?;
        Ok(export::composite(
            raw,
            self.editor.rectangles().as_slice(),
            self.config.stroke,
        ))
    }

    fn export_image(&mut self) {
        let img = match self.composite() {
            Ok(img) => img,
            Err(e) => {
                log::error!("{EXPORT_FAILED_MESSAGE} {e}");
                self.status = EXPORT_FAILED_MESSAGE.to_string();
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.config.export.file_name)
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };
        match export::save_png(&img, &path) {
            Ok(()) => self.status = format!("Exported to {}", path.display()),
            Err(e) => {
                log::error!("{EXPORT_FAILED_MESSAGE} {e}");
                self.status = EXPORT_FAILED_MESSAGE.to_string();
            }
        }
    }

    fn ocr_payload(&self) -> Result<String, ExportError> {
        let img = match (self.ocr_scope, self.editor.active_rectangle()) {
            (OcrScope::Selection, Some(rect)) => {
                let raw = self.raw_image.as_ref().ok_or(ExportError::NoImage)?;
                export::crop_to(&raw.to_rgba8(), rect)?
            }
            (OcrScope::Selection, None) => {
                log::warn!("no rectangle selected, sending the whole image");
                self.composite()?
            }
            (OcrScope::Composite, _) => self.composite()?,
        };
        Ok(export::to_data_url(&export::encode_png(&img)?))
    }

    fn run_ocr(&mut self, ctx: &egui::Context) {
        let payload = match self.ocr_payload() {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("could not rasterize image for OCR: {e}");
                self.ocr_output = ocr::OCR_FAILED_MESSAGE.to_string();
                return;
            }
        };
        let Some(dispatcher) = self.ocr.as_mut() else {
            self.ocr_output = ocr::OCR_FAILED_MESSAGE.to_string();
            return;
        };
        let ctx = ctx.clone();
        match dispatcher.dispatch(self.ocr_endpoint, payload, move || ctx.request_repaint()) {
            Ok(()) => self.status = "Extracting text…".to_string(),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn poll_ocr(&mut self) {
        let Some(result) = self.ocr.as_mut().and_then(|d| d.poll()) else {
            return;
        };
        self.status = ocr_status(&result).to_string();
        self.ocr_output = ocr::output_text(result);
    }

    fn ocr_busy(&self) -> bool {
        self.ocr.as_ref().is_some_and(|d| d.is_busy())
    }

    fn print_coordinates(&mut self) {
        for line in self.editor.coordinate_report() {
            log::info!("{line}");
        }
        self.show_coordinates = true;
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("📂 Open").clicked() {
                self.pick_image();
            }
            ui.separator();
            let draw = self.editor.draw_mode();
            if ui
                .selectable_label(draw, "✏ Draw")
                .on_hover_text("Toggle drawing")
                .clicked()
            {
                self.editor.toggle_draw_mode();
            }
            if ui.button("💾 Export").on_hover_text("Download").clicked() {
                self.export_image();
            }
            if ui
                .button("🖨 Coordinates")
                .on_hover_text("Print coordinates")
                .clicked()
            {
                self.print_coordinates();
            }
            ui.separator();

            egui::ComboBox::from_id_salt("ocr_endpoint")
                .selected_text(self.ocr_endpoint.label())
                .show_ui(ui, |ui| {
                    for endpoint in [OcrEndpoint::Ocr, OcrEndpoint::SimpleOcr] {
                        ui.selectable_value(&mut self.ocr_endpoint, endpoint, endpoint.label());
                    }
                });
            ui.selectable_value(&mut self.ocr_scope, OcrScope::Composite, "Whole image");
            ui.selectable_value(&mut self.ocr_scope, OcrScope::Selection, "Selection");

            let busy = self.ocr_busy();
            if ui
                .add_enabled(!busy && self.raw_image.is_some(), egui::Button::new("🔍 Extract text"))
                .clicked()
            {
                self.run_ocr(ui.ctx());
            }
            if busy {
                ui.spinner();
            }
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Extracted text");
        egui::ScrollArea::vertical()
            .id_salt("ocr_output")
            .max_height(ui.available_height() * 0.5)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.ocr_output.as_str())
                        .desired_width(f32::INFINITY),
                );
            });

        if !self.show_coordinates {
            return;
        }
        ui.separator();
        ui.horizontal(|ui| {
            ui.heading("Rectangles");
            if ui.small_button("✖").clicked() {
                self.show_coordinates = false;
            }
        });

        let rects: Vec<Rectangle> = self.editor.rectangles().iter().copied().collect();
        let active = self.editor.active();
        let mut clicked = None;
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .columns(Column::remainder(), 4)
            .header(20.0, |mut header| {
                for title in ["#", "x", "y", "width", "height"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (i, r) in rects.iter().enumerate() {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            if ui
                                .selectable_label(active == Some(i), format!("{}", i + 1))
                                .clicked()
                            {
                                clicked = Some(i);
                            }
                        });
                        for v in [r.x, r.y, r.width, r.height] {
                            row.col(|ui| {
                                ui.label(format!("{v:.0}"));
                            });
                        }
                    });
                }
            });
        if let Some(i) = clicked {
            self.editor.select(i);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(tex) = self.texture.clone() else {
            ui.centered_and_justified(|ui| {
                ui.label("No image loaded.");
            });
            return;
        };
        let stroke = self.config.stroke.to_egui();
        image_canvas(ui, &mut self.editor, tex.size_vec2(), stroke, |painter, rect| {
            painter.image(
                tex.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        });
    }
}

// ── Canvas ──────────────────────────────────────────────────────────────────

/// Lays out an image of `size` at 1:1 inside a scroll area and runs the
/// pointer gestures over it. Returns the image's top-left in window space.
fn image_canvas(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    size: egui::Vec2,
    stroke: egui::Stroke,
    paint_image: impl FnOnce(&egui::Painter, egui::Rect),
) -> egui::Pos2 {
    egui::ScrollArea::both()
        .drag_to_scroll(false)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
            paint_image(&painter, response.rect);
            let origin = response.rect.min;
            if editor.draw_mode() && response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
            }

            let events = overlay::show(ui, editor, origin, stroke);
            let (pressed, press, latest, primary_down) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.press_origin(),
                    i.pointer.latest_pos(),
                    i.pointer.primary_down(),
                )
            });
            let press = press.map(|p| geometry::to_image_local(p, origin));
            overlay::apply(editor, &events, press);

            if pressed && response.is_pointer_button_down_on() {
                if let Some(pos) = response.interact_pointer_pos() {
                    editor.pointer_down(geometry::to_image_local(pos, origin));
                }
            }

            if editor.interaction() != Interaction::Idle {
                if let Some(pos) = latest {
                    editor.pointer_move(geometry::to_image_local(pos, origin));
                }
                if !primary_down {
                    editor.pointer_up();
                }
            }
            origin
        })
        .inner
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);
        self.poll_ocr();

        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            self.editor.delete_active();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.editor.deselect();
            self.editor.set_draw_mode(false);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{} rectangle(s)", self.editor.rectangles().len()));
                });
            });
        });

        egui::SidePanel::right("side")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));
    }
}
