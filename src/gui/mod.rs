//! GUI module for the application.
//!
//! Provides a graphical interface using egui/eframe. The session runs on a
//! worker thread; the UI polls its status snapshot every frame.

pub mod render;
pub mod state;

use eframe::egui::{self, Vec2};
use std::path::PathBuf;

use crate::automation::runner::{read_snapshot, start_session, SessionHandle};
use crate::automation::{is_session_active, AttemptConfig};
use crate::capture::DesktopSampler;
use crate::input::platform_injector;

use state::{GuiState, SessionStatus};

/// Main GUI application struct.
pub struct GuiApp {
    /// Application state.
    state: GuiState,
    /// Handle of the running session, if any.
    session: Option<SessionHandle>,
    /// Where "Save settings" writes the config.
    config_path: PathBuf,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AttemptConfig, config_path: PathBuf) -> Self {
        Self {
            state: GuiState::new(config),
            session: None,
            config_path,
        }
    }

    /// Update session status by polling the worker's snapshot.
    fn update_session_status(&mut self) {
        let Some(handle) = &self.session else {
            return;
        };

        let snapshot = read_snapshot(&handle.status());
        self.state.log_lines = snapshot.recent_lines.iter().cloned().collect();

        if handle.is_finished() {
            if let Some(handle) = self.session.take() {
                let report = handle.join();
                log::info!("GUI: Session finished: {}", report.state);
                self.state.latest_session_path = report.session_dir;
                self.state.status = SessionStatus::Finished {
                    state: report.state,
                    attempts: report.attempts,
                };
            }
        } else {
            self.state.status = SessionStatus::Running(snapshot);
        }
    }

    /// Handle start button click.
    fn handle_start(&mut self) {
        if is_session_active() {
            log::warn!("GUI: A session is already running");
            return;
        }

        let config = self.state.form.to_config(&self.state.base_config);
        let injector = platform_injector(config.failsafe_enabled);
        let sampler = Box::new(DesktopSampler::new(config.capture_region));

        match start_session(config, injector, sampler, &crate::paths::get_output_dir()) {
            Ok(handle) => {
                self.state.status = SessionStatus::Running(handle.snapshot());
                self.state.latest_session_path = handle.snapshot().session_dir;
                self.session = Some(handle);
                log::info!("GUI: Started session");
            }
            Err(e) => {
                log::warn!("GUI: Failed to start session: {}", e);
                self.state.status = SessionStatus::Error(e.to_string());
            }
        }
    }

    /// Handle stop button click.
    fn handle_stop(&mut self) {
        if let Some(handle) = &self.session {
            handle.request_stop();
            log::info!("GUI: Requested session stop");
        }
    }

    fn handle_pause(&mut self, pause: bool) {
        if let Some(handle) = &self.session {
            if pause {
                handle.pause();
            } else {
                handle.resume();
            }
        }
    }

    /// Writes the current form to the config file.
    fn handle_save_settings(&mut self) {
        let config = self.state.form.to_config(&self.state.base_config);
        match config.save(&self.config_path) {
            Ok(()) => {
                log::info!("GUI: Saved settings to {}", self.config_path.display());
                self.state.base_config = config;
            }
            Err(e) => {
                log::warn!("GUI: Failed to save settings: {}", e);
                self.state.status = SessionStatus::Error(e.to_string());
            }
        }
    }

    /// Handle open folder button click.
    fn handle_open_folder(&self) {
        if let Some(path) = &self.state.latest_session_path {
            let opener = if cfg!(windows) {
                "explorer"
            } else if cfg!(target_os = "macos") {
                "open"
            } else {
                "xdg-open"
            };
            if let Err(e) = std::process::Command::new(opener).arg(path).spawn() {
                log::warn!("GUI: Failed to open folder: {}", e);
            }
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_session_status();

        // Request repaint while running (for progress updates)
        if self.state.status.is_running() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Passcode Autotyper");
            ui.add_space(12.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                render::render_settings(ui, &mut self.state);

                let clicks = render::render_controls(ui, &self.state);
                if clicks.start {
                    self.handle_start();
                }
                if clicks.pause {
                    self.handle_pause(true);
                }
                if clicks.resume {
                    self.handle_pause(false);
                }
                if clicks.stop {
                    self.handle_stop();
                }

                render::render_progress(ui, &self.state);
                render::render_log(ui, &self.state);

                let (save_clicked, open_folder_clicked) = render::render_actions(ui, &self.state);
                if save_clicked {
                    self.handle_save_settings();
                }
                if open_folder_clicked {
                    self.handle_open_folder();
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(handle) = self.session.take() {
            handle.request_stop();
            let report = handle.join();
            log::info!("GUI: Session ended on exit: {}", report.state);
        }
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui(config: AttemptConfig, config_path: PathBuf) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(560.0, 640.0))
            .with_min_inner_size(Vec2::new(420.0, 480.0))
            .with_title("Passcode Autotyper"),
        ..Default::default()
    };

    eframe::run_native(
        "Passcode Autotyper",
        options,
        Box::new(|cc| Ok(Box::new(GuiApp::new(cc, config, config_path)))),
    )
}
