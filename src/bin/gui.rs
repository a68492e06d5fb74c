//! Desktop application for picking face-mesh landmark indices.
//!
//! Run with: cargo run --features gui --bin mesh-picker-gui

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eframe::egui;
use mesh_picker::camera::NokhwaCamera;
use mesh_picker::mesh::FaceMesh;
use mesh_picker::{LandmarkDetector, MeshTopology, Notice, SelectorSession, Settings, Severity};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

#[derive(Parser, Debug)]
#[command(name = "mesh-picker-gui")]
#[command(author, version, about = "Face Landmark Selector - Webcam/Image", long_about = None)]
struct Args {
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index, overrides the settings file
    #[arg(long)]
    camera: Option<u32>,

    /// Image to open at startup
    image: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = match Settings::load_or_default(args.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}, using default settings");
            show_notice(&Notice {
                severity: Severity::Warning,
                title: "Settings Error".to_string(),
                message: format!("{e}\n\nDefault settings will be used."),
            });
            Settings::default()
        }
    };
    if let Some(index) = args.camera {
        settings.capture.camera_index = index;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window.width, settings.window.height])
            .with_min_inner_size([settings.window.min_width, settings.window.min_height]),
        ..Default::default()
    };

    log::info!("Application started - running main loop");
    let result = eframe::run_native(
        "Face Landmark Selector - Webcam/Image",
        options,
        Box::new(move |cc| Ok(Box::new(PickerApp::new(cc, settings, args.image)))),
    );
    log::info!("Application closed");
    result
}

struct PickerApp {
    session: SelectorSession<NokhwaCamera>,
    settings: Settings,
    canvas_texture: Option<egui::TextureHandle>,
    canvas_size: egui::Vec2,
}

impl PickerApp {
    fn new(_cc: &eframe::CreationContext<'_>, settings: Settings, image: Option<PathBuf>) -> Self {
        let detector: Option<Box<dyn LandmarkDetector>> = match FaceMesh::new(&settings.detector) {
            Ok(mesh) => Some(Box::new(mesh)),
            Err(e) => {
                log::error!("face mesh unavailable: {e}");
                show_notice(&Notice {
                    severity: Severity::Error,
                    title: "Model Error".to_string(),
                    message: format!("Failed to load the face mesh detector: {e}"),
                });
                None
            }
        };
        let topology = MeshTopology::load_or_default(settings.detector.tesselation.as_deref());

        let mut session = SelectorSession::new(&settings, detector, topology);
        if let Some(path) = image {
            let _ = session.load_image(path);
        }

        Self {
            session,
            settings,
            canvas_texture: None,
            canvas_size: egui::Vec2::ZERO,
        }
    }

    fn load_image(&mut self) {
        self.session.stop_capture();
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Select an image file")
            .add_filter("Image files", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
            .add_filter("All files", &["*"])
            .pick_file()
        {
            let _ = self.session.load_image(path);
        }
    }

    fn toggle_webcam(&mut self) {
        if self.session.is_live() {
            self.session.stop_capture();
        } else {
            self.session.start_capture(NokhwaCamera::open(&self.settings.capture));
        }
    }

    fn save_selection(&mut self) {
        if !self.session.begin_save() {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Save Selected Landmark Indices")
            .set_file_name("landmarks.txt")
            .add_filter("Text files", &["txt"])
            .add_filter("All files", &["*"])
            .save_file()
        {
            let _ = self.session.save_selection(path);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.group(|ui| {
                ui.label("Input Source");
                if ui.button("Load Image").clicked() {
                    self.load_image();
                }
                let webcam_label = if self.session.is_live() {
                    "Stop Webcam"
                } else {
                    "Start Webcam"
                };
                if ui.button(webcam_label).clicked() {
                    self.toggle_webcam();
                }
            });

            ui.group(|ui| {
                ui.label("Display Options");
                let mut overlays = self.session.overlays();
                ui.checkbox(&mut overlays.wireframe, "Show Wireframe");
                ui.checkbox(&mut overlays.contours, "Show Contours");
                self.session.set_overlays(overlays);
            });

            ui.group(|ui| {
                ui.label("Selection Controls");
                if ui.button("Select Default").clicked() {
                    self.session.select_default();
                }
                if ui.button("Clear Selection").clicked() {
                    self.session.clear_selection();
                }
                if ui.button("Save Selection").clicked() {
                    self.save_selection();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn selection_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.label("Selected Landmarks (Indices):");
        egui::ScrollArea::vertical()
            .id_salt("selected_landmarks")
            .max_height(ui.available_height() * 0.5)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for label in self.session.listbox_labels() {
                    ui.label(label);
                }
            });
        ui.separator();

        ui.label("Selected Indices (Python List):");
        let list = self.session.list_literal();
        ui.add(
            egui::TextEdit::multiline(&mut list.as_str())
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        if ui
            .add_sized([ui.available_width(), 24.0], egui::Button::new("Copy List to Clipboard"))
            .clicked()
        {
            if let Some(text) = self.session.clipboard_text() {
                ctx.copy_text(text);
            }
        }
        ui.add_space(10.0);
        ui.label(
            "Click on landmarks to select/deselect them.\n\
             Selected landmarks will appear in red.",
        );
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

        let canvas = (rect.width().floor() as u32, rect.height().floor() as u32);
        if self.session.needs_redraw(canvas) {
            if let Some(out) = self.session.render(canvas) {
                let (w, h) = out.canvas.dimensions();
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [w as usize, h as usize],
                    out.canvas.as_raw(),
                );
                match self.canvas_texture.as_mut() {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.canvas_texture =
                            Some(ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR))
                    }
                }
                self.canvas_size = egui::vec2(w as f32, h as f32);
            }
        }

        if self.session.has_frame() {
            if let Some(texture) = &self.canvas_texture {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                let image_rect = egui::Rect::from_min_size(rect.min, self.canvas_size);
                painter.image(texture.id(), image_rect, uv, egui::Color32::WHITE);
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                self.session.click(local.x as i32, local.y as i32);
            }
        }
    }
}

impl eframe::App for PickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.session.tick(now);
        if let Some(due) = self.session.next_capture_due() {
            ctx.request_repaint_after(due.saturating_duration_since(now));
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls(ui, ctx);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.session.status());
        });

        egui::SidePanel::right("selection")
            .min_width(220.0)
            .show(ctx, |ui| {
                self.selection_panel(ui, ctx);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas(ui, ctx);
        });

        // Handle drag and drop
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            let _ = self.session.load_image(path);
        }

        for notice in self.session.take_notices() {
            show_notice(&notice);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.shutdown();
    }
}

fn show_notice(notice: &Notice) {
    let level = match notice.severity {
        Severity::Info => MessageLevel::Info,
        Severity::Warning => MessageLevel::Warning,
        Severity::Error => MessageLevel::Error,
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(&notice.title)
        .set_description(&notice.message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
