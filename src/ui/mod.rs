use std::time::Duration;

use crate::scene::TranslucentParams;

const TITLE: &str = "Candlelight";
const MAX_STATUS_LINES: usize = 4;

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiActions {
    pub explore: bool,
    pub exit: bool,
    /// The wax panel edited the parameters passed to [`UiState::draw`].
    pub wax_changed: bool,
}

/// Overlay visibility: the intro container, the exit button, the wax tuning
/// panel and a short status log.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    container_visible: bool,
    exit_visible: bool,
    wax_panel_open: bool,
    reveal_at: Option<Duration>,
    status: Vec<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container_visible(&self) -> bool {
        self.container_visible
    }

    pub fn exit_visible(&self) -> bool {
        self.exit_visible
    }

    pub fn wax_panel_open(&self) -> bool {
        self.wax_panel_open
    }

    pub fn status_lines(&self) -> &[String] {
        &self.status
    }

    /// The container appears once `now` reaches `at`. Only the first call
    /// counts.
    pub fn schedule_reveal(&mut self, at: Duration) {
        if self.reveal_at.is_none() && !self.container_visible {
            self.reveal_at = Some(at);
        }
    }

    /// Returns `true` on the frame the container becomes visible.
    pub fn tick(&mut self, now: Duration) -> bool {
        match self.reveal_at {
            Some(at) if now >= at => {
                self.reveal_at = None;
                if self.exit_visible {
                    return false;
                }
                self.container_visible = true;
                true
            }
            _ => false,
        }
    }

    pub fn explore(&mut self) {
        self.reveal_at = None;
        self.container_visible = false;
        self.exit_visible = true;
    }

    pub fn exit(&mut self) {
        self.container_visible = true;
        self.exit_visible = false;
    }

    pub fn toggle_wax_panel(&mut self) {
        self.wax_panel_open = !self.wax_panel_open;
    }

    pub fn push_status(&mut self, line: impl Into<String>) {
        self.status.push(line.into());
        if self.status.len() > MAX_STATUS_LINES {
            let overflow = self.status.len() - MAX_STATUS_LINES;
            self.status.drain(..overflow);
        }
    }

    /// Lays out the overlay. `wax` is the live parameter block of the wax
    /// node the panel edits, if the scene has one.
    pub fn draw(&mut self, ctx: &egui::Context, wax: Option<&mut TranslucentParams>) -> UiActions {
        let mut actions = UiActions::default();

        if self.container_visible {
            egui::Area::new(egui::Id::new("intro"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading(egui::RichText::new(TITLE).size(42.0).color(egui::Color32::WHITE));
                        ui.add_space(12.0);
                        if ui.button("Explore").clicked() {
                            actions.explore = true;
                        }
                    });
                });
        }

        if self.exit_visible {
            egui::Area::new(egui::Id::new("exit"))
                .anchor(egui::Align2::RIGHT_TOP, [-16.0, 16.0])
                .show(ctx, |ui| {
                    if ui.button("Exit").clicked() {
                        actions.exit = true;
                    }
                });
        }

        if self.wax_panel_open {
            let mut open = true;
            egui::Window::new("Wax")
                .open(&mut open)
                .resizable(false)
                .show(ctx, |ui| match wax {
                    Some(params) => actions.wax_changed = wax_controls(ui, params),
                    None => {
                        ui.label("No wax node loaded");
                    }
                });
            self.wax_panel_open = open;
        }

        if !self.status.is_empty() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                for line in &self.status {
                    ui.label(line);
                }
            });
        }

        actions
    }
}

fn wax_controls(ui: &mut egui::Ui, params: &mut TranslucentParams) -> bool {
    let mut changed = false;
    let mut slider = |ui: &mut egui::Ui, value: &mut f32, range: std::ops::RangeInclusive<f32>, label: &str| {
        changed |= ui
            .add(egui::Slider::new(value, range).step_by(0.01).text(label))
            .changed();
    };
    slider(ui, &mut params.roughness, 0.0..=1.0, "roughness");
    slider(ui, &mut params.internal_roughness, 0.0..=1.0, "internal roughness");
    slider(ui, &mut params.scattering_absorption, 0.0..=1.0, "scattering absorption");
    slider(ui, &mut params.scattering, 0.0..=1.0, "scattering");
    slider(ui, &mut params.roughness_blur_scale, 0.0..=32.0, "roughness blur scale");
    slider(ui, &mut params.attenuation_distance, 0.01..=10.0, "attenuation distance");
    ui.horizontal(|ui| {
        changed |= ui.color_edit_button_rgb(&mut params.attenuation_color).changed();
        ui.label("attenuation color");
    });
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_appears_after_the_reveal_delay() {
        let mut ui = UiState::new();
        assert!(!ui.container_visible());
        ui.schedule_reveal(Duration::from_secs(2));
        assert!(!ui.tick(Duration::from_millis(1999)));
        assert!(!ui.container_visible());
        assert!(ui.tick(Duration::from_secs(2)));
        assert!(ui.container_visible());
        assert!(!ui.tick(Duration::from_secs(3)));
    }

    #[test]
    fn explore_and_exit_swap_visibility() {
        let mut ui = UiState::new();
        ui.schedule_reveal(Duration::ZERO);
        ui.tick(Duration::ZERO);

        ui.explore();
        assert!(!ui.container_visible());
        assert!(ui.exit_visible());

        ui.exit();
        assert!(ui.container_visible());
        assert!(!ui.exit_visible());
    }

    #[test]
    fn exploring_before_reveal_cancels_it() {
        let mut ui = UiState::new();
        ui.schedule_reveal(Duration::from_secs(2));
        ui.explore();
        assert!(!ui.tick(Duration::from_secs(5)));
        assert!(!ui.container_visible());
        assert!(ui.exit_visible());
    }

    #[test]
    fn status_log_keeps_the_latest_lines() {
        let mut ui = UiState::new();
        for index in 0..6 {
            ui.push_status(format!("line {index}"));
        }
        assert_eq!(ui.status_lines().len(), MAX_STATUS_LINES);
        assert_eq!(ui.status_lines()[0], "line 2");
        assert_eq!(ui.status_lines()[3], "line 5");
    }

    #[test]
    fn hidden_overlay_reports_no_actions() {
        let ctx = egui::Context::default();
        let mut ui = UiState::new();
        let mut actions = UiActions::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = ui.draw(ctx, None);
        });
        assert_eq!(actions, UiActions::default());
    }

    #[test]
    fn wax_panel_toggles() {
        let mut ui = UiState::new();
        ui.toggle_wax_panel();
        assert!(ui.wax_panel_open());
        ui.toggle_wax_panel();
        assert!(!ui.wax_panel_open());
    }
}
