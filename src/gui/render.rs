//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, Color32, RichText};

use super::state::{GuiState, SessionStatus};
use crate::automation::AttemptState;
use crate::candidate::MAX_LENGTH;

/// Buttons clicked in the controls section this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlClicks {
    pub start: bool,
    pub stop: bool,
    pub pause: bool,
    pub resume: bool,
}

/// Render the configuration form.
pub fn render_settings(ui: &mut egui::Ui, state: &mut GuiState) {
    let editable = !state.status.is_running();
    let form = &mut state.form;

    ui.heading("Settings");
    ui.add_space(8.0);

    ui.add_enabled_ui(editable, |ui| {
        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Success image:");
                ui.text_edit_singleline(&mut form.reference_image_path);
                ui.end_row();

                ui.label("Code length:");
                ui.add(egui::DragValue::new(&mut form.password_length).range(1..=MAX_LENGTH));
                ui.end_row();

                ui.label("Start from:");
                ui.add(egui::DragValue::new(&mut form.start_from).speed(1.0));
                ui.end_row();

                ui.label("Max attempts:");
                ui.add(
                    egui::DragValue::new(&mut form.max_attempts)
                        .range(1..=u64::MAX)
                        .speed(10.0),
                );
                ui.end_row();

                ui.label("Delay (s):");
                ui.add(
                    egui::DragValue::new(&mut form.attempt_delay)
                        .range(0.0..=60.0)
                        .speed(0.05)
                        .fixed_decimals(2),
                );
                ui.end_row();

                ui.label("Focus lead-in (s):");
                ui.add(
                    egui::DragValue::new(&mut form.focus_delay)
                        .range(0.0..=60.0)
                        .speed(0.1)
                        .fixed_decimals(1),
                );
                ui.end_row();

                ui.label("");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut form.press_enter, "Press Enter");
                    ui.checkbox(&mut form.demo_mode, "Demo mode");
                });
                ui.end_row();
            });
    });

    if !state.form.demo_mode {
        ui.add_space(4.0);
        ui.label(
            RichText::new("After Start, click into the target input before the lead-in ends. Move the cursor to the top-left corner to abort.")
                .small()
                .color(Color32::GRAY),
        );
    }
}

/// Render the start/pause/stop buttons.
pub fn render_controls(ui: &mut egui::Ui, state: &GuiState) -> ControlClicks {
    let mut clicks = ControlClicks::default();

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        let is_running = state.status.is_running();
        let is_paused = state.status.is_paused();

        // Start button - disabled while running
        ui.add_enabled_ui(!is_running, |ui| {
            if ui.button(RichText::new("▶ Start").size(16.0)).clicked() {
                clicks.start = true;
            }
        });

        ui.add_space(12.0);

        ui.add_enabled_ui(is_running, |ui| {
            if is_paused {
                if ui.button(RichText::new("⏵ Resume").size(16.0)).clicked() {
                    clicks.resume = true;
                }
            } else if ui.button(RichText::new("⏸ Pause").size(16.0)).clicked() {
                clicks.pause = true;
            }
        });

        ui.add_space(12.0);

        // Stop button - enabled only while running
        ui.add_enabled_ui(is_running, |ui| {
            if ui.button(RichText::new("◼ Stop").size(16.0)).clicked() {
                clicks.stop = true;
            }
        });
    });

    clicks
}

/// Render the progress display section.
pub fn render_progress(ui: &mut egui::Ui, state: &GuiState) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("Status:");

        let status_color = match &state.status {
            SessionStatus::Idle => Color32::GRAY,
            SessionStatus::Running(_) => Color32::from_rgb(0, 120, 200),
            SessionStatus::Finished { state, .. } => match state {
                AttemptState::Success(_) => Color32::from_rgb(0, 150, 0),
                AttemptState::Failed(_) => Color32::from_rgb(200, 0, 0),
                _ => Color32::from_rgb(200, 150, 0),
            },
            SessionStatus::Error(_) => Color32::from_rgb(200, 0, 0),
        };

        ui.label(RichText::new(state.status.status_text()).color(status_color));
    });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label("Progress:");
        let progress_bar = egui::ProgressBar::new(state.status.progress())
            .show_percentage()
            .animate(state.status.is_running());
        ui.add_sized([ui.available_width() - 20.0, 20.0], progress_bar);
    });

    if let SessionStatus::Running(snapshot) = &state.status {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(format!("Elapsed: {}", snapshot.elapsed_text()));
            ui.add_space(16.0);
            ui.label(format!("Rate: {:.2}/s", snapshot.rate_per_second));
            if let Some(similarity) = snapshot.last_similarity {
                ui.add_space(16.0);
                ui.label(format!("Similarity: {:.3}", similarity));
            }
        });
    }
}

/// Render the scrolling log panel.
pub fn render_log(ui: &mut egui::Ui, state: &GuiState) {
    ui.add_space(8.0);
    ui.separator();
    ui.label("Log");

    egui::ScrollArea::vertical()
        .max_height(180.0)
        .stick_to_bottom(true)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for line in &state.log_lines {
                ui.monospace(line);
            }
        });
}

/// Render the action buttons.
/// Returns (save_settings_clicked, open_folder_clicked).
pub fn render_actions(ui: &mut egui::Ui, state: &GuiState) -> (bool, bool) {
    let mut save_clicked = false;
    let mut open_folder_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        if ui.button("💾 Save settings").clicked() {
            save_clicked = true;
        }

        ui.add_space(12.0);

        ui.add_enabled_ui(state.latest_session_path.is_some(), |ui| {
            if ui.button("📁 Open session folder").clicked() {
                open_folder_clicked = true;
            }
        });
    });

    (save_clicked, open_folder_clicked)
}
