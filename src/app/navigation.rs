use std::time::Duration;

use crate::config::CameraConfig;
use crate::render::{
    CameraAnimator, CameraPose, OrbitControls, PerspectiveCamera, TransitionUpdate,
};
use crate::ui::UiState;

/// Camera, orbit controls and the tweens that move between the intro view
/// and the explore view.
pub struct Navigation {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    animator: CameraAnimator,
    explore_pose: CameraPose,
    exit_pose: CameraPose,
}

impl Navigation {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = PerspectiveCamera::new(config.fov_y_deg, aspect, config.near, config.far);
        camera.position = config.initial.position;
        camera.look_at = config.initial.target;

        let mut controls = OrbitControls::new(config.initial.target, &config.orbit);
        controls.enable_rotate = false;

        Self {
            camera,
            controls,
            animator: CameraAnimator::new(config.transition),
            explore_pose: config.explore,
            exit_pose: config.exit,
        }
    }

    /// Only available while the intro container is showing. Returns whether
    /// the transition started.
    pub fn explore(&mut self, ui: &mut UiState, now: Duration) -> bool {
        if !ui.container_visible() {
            return false;
        }
        ui.explore();
        self.controls.enable_rotate = true;
        self.controls.enabled = true;
        self.animator
            .start(now, &self.camera, &self.controls, self.explore_pose);
        true
    }

    /// Only available while exploring. Controls stay disabled until the
    /// position tween lands.
    pub fn exit(&mut self, ui: &mut UiState, now: Duration) -> bool {
        if !ui.exit_visible() {
            return false;
        }
        ui.exit();
        self.controls.enable_rotate = false;
        self.controls.max_polar_angle = std::f32::consts::PI;
        self.controls.enabled = false;
        self.animator
            .start(now, &self.camera, &self.controls, self.exit_pose);
        true
    }

    /// Orbit damping first, then the camera tweens.
    pub fn update(&mut self, now: Duration) -> TransitionUpdate {
        self.controls.update(&mut self.camera);
        self.animator
            .update(now, &mut self.camera, &mut self.controls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn navigation() -> Navigation {
        Navigation::new(&CameraConfig::default(), 1.0)
    }

    fn revealed_ui() -> UiState {
        let mut ui = UiState::new();
        ui.schedule_reveal(Duration::ZERO);
        ui.tick(Duration::ZERO);
        ui
    }

    #[test]
    fn starts_with_rotation_off() {
        let nav = navigation();
        let config = CameraConfig::default();
        assert!(!nav.controls.enable_rotate);
        assert_eq!(nav.camera.position, config.initial.position);
        assert_eq!(nav.controls.target, config.initial.target);
    }

    #[test]
    fn explore_lands_on_the_configured_pose() {
        let mut nav = navigation();
        let mut ui = revealed_ui();
        let explore = CameraConfig::default().explore;

        assert!(nav.explore(&mut ui, Duration::ZERO));
        assert!(nav.controls.enable_rotate);
        assert!(nav.controls.enabled);
        assert!(ui.exit_visible());

        nav.update(Duration::from_millis(50));
        nav.update(Duration::from_millis(2600));
        assert!(nav.camera.position.distance(explore.position) < 1e-4);
        assert_eq!(nav.controls.target, Vec3::ZERO);
        assert!(nav.controls.enabled);
    }

    #[test]
    fn exit_locks_controls_until_the_tween_lands() {
        let mut nav = navigation();
        let mut ui = revealed_ui();
        assert!(nav.explore(&mut ui, Duration::ZERO));
        nav.update(Duration::from_millis(2600));

        let start = Duration::from_secs(3);
        assert!(nav.exit(&mut ui, start));
        assert!(!nav.controls.enable_rotate);
        assert!(!nav.controls.enabled);
        assert_eq!(nav.controls.max_polar_angle, std::f32::consts::PI);
        assert!(ui.container_visible());

        nav.update(start + Duration::from_millis(1000));
        assert!(!nav.controls.enabled);
        nav.update(start + Duration::from_millis(2600));
        assert!(nav.controls.enabled);
        let exit = CameraConfig::default().exit;
        assert!(nav.camera.position.distance(exit.position) < 1e-4);
    }

    #[test]
    fn exit_before_exploring_is_ignored() {
        let mut nav = navigation();
        let mut ui = UiState::new();
        let polar = nav.controls.max_polar_angle;

        assert!(!nav.exit(&mut ui, Duration::ZERO));
        assert!(!ui.container_visible());
        assert_eq!(nav.controls.max_polar_angle, polar);
        assert_eq!(nav.update(Duration::from_secs(5)).in_flight, 0);

        // The reveal still arms once the model loads.
        ui.schedule_reveal(Duration::from_secs(6));
        assert!(ui.tick(Duration::from_secs(6)));
    }

    #[test]
    fn explore_needs_the_intro_container() {
        let mut nav = navigation();
        let mut ui = UiState::new();
        assert!(!nav.explore(&mut ui, Duration::ZERO));
        assert!(!ui.exit_visible());
        assert!(!nav.controls.enable_rotate);

        let mut ui = revealed_ui();
        assert!(nav.explore(&mut ui, Duration::ZERO));
        assert!(!nav.explore(&mut ui, Duration::from_millis(10)));
    }
}
