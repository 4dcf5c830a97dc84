//! Desktop front-end for yt-dlp

// yt-dlp argument assembly
mod command;
// Environment-derived settings
mod config;
// Child process supervision
mod downloader;
// Error enums
mod error;
// Requests, events and outcomes
mod model;
// Percentage scraping
mod progress;
// Form, log and progress owned by the window
mod state;

use config::Settings;
use model::{Format, Resolution};
use state::AppState;

// eframe/egui for GUI application framework
use eframe::{egui, App, Frame};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use std::{error::Error, sync::Arc, time::Duration};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use egui::Visuals;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: initializes logging and the runtime, then launches the GUI
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yt_dlp_gui=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = RUNTIME.get_or_try_init(|| Runtime::new().map(Arc::new))?;
    let settings = Settings::from_env();
    info!(tool = %settings.tool.display(), folder = %settings.default_folder.display(), "starting up");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("yt-dlp Advanced GUI")
            .with_inner_size([700.0, 580.0]),
        ..Default::default()
    };
    let app = DownloaderApp::new(settings, Arc::clone(rt));

    eframe::run_native(
        "yt-dlp Advanced GUI",
        options,
        Box::new(|cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(app)
        }),
    )?;
    Ok(())
}

struct DownloaderApp {
    state: AppState,
    runtime: Arc<Runtime>,
}

impl DownloaderApp {
    fn new(settings: Settings, runtime: Arc<Runtime>) -> Self {
        Self {
            state: AppState::new(&settings),
            runtime,
        }
    }

    fn form(&mut self, ui: &mut egui::Ui) {
        let state = &mut self.state;

        ui.label("Video URL:");
        ui.add(egui::TextEdit::singleline(&mut state.url).desired_width(f32::INFINITY));

        ui.label("Download Folder:");
        ui.horizontal(|ui| {
            let browse_width = 70.0;
            ui.add(
                egui::TextEdit::singleline(&mut state.output_folder)
                    .desired_width(ui.available_width() - browse_width),
            );
            if ui.button("Browse").clicked() {
                if let Some(folder) = FileDialog::new().set_directory(&state.output_folder).pick_folder() {
                    state.output_folder = folder.display().to_string();
                }
            }
        });

        ui.add_space(6.0);
        ui.label("Format:");
        egui::ComboBox::from_id_source("format")
            .selected_text(state.format.label())
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for format in Format::ALL {
                    ui.selectable_value(&mut state.format, format, format.label());
                }
            });

        ui.add_space(6.0);
        ui.label("Resolution:");
        ui.add_enabled_ui(state.format.uses_resolution(), |ui| {
            egui::ComboBox::from_id_source("resolution")
                .selected_text(state.resolution.label())
                .width(ui.available_width())
                .show_ui(ui, |ui| {
                    for res in Resolution::ALL {
                        ui.selectable_value(&mut state.resolution, res, res.label());
                    }
                });
        });

        ui.add_space(6.0);
        ui.label("Options:");
        ui.checkbox(&mut state.use_aria2, "Use Aria2 (faster downloads)");
        ui.checkbox(&mut state.download_thumbnail, "Download Thumbnail");
        ui.checkbox(&mut state.download_subtitles, "Download Subtitles");
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.label("Progress:");
        ui.add(egui::ProgressBar::new(f32::from(self.state.progress) / 100.0).show_percentage());

        ui.horizontal(|ui| {
            let start = ui.add_enabled(self.state.can_start(), egui::Button::new("Start Download"));
            if start.clicked() {
                self.state.start(self.runtime.handle());
            }
            let cancel = ui.add_enabled(self.state.can_cancel(), egui::Button::new("Cancel"));
            if cancel.clicked() {
                self.state.cancel();
            }
        });
    }

    fn log(&self, ui: &mut egui::Ui) {
        ui.label("Log:");
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.state.log {
                    ui.label(egui::RichText::new(line).monospace().color(egui::Color32::from_rgb(0x00, 0xff, 0x66)));
                }
            });
    }

    fn error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.error.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.state.error = None;
                }
            });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.state.poll();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.form(ui);
            self.controls(ui);
            self.log(ui);
        });

        self.error_dialog(ctx);

        // Worker events arrive on a channel, so keep polling while one runs
        if self.state.is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
