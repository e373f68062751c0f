use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A camera position together with the point the orbit controls look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    /// Point the camera looks at; kept in sync by [`OrbitControls::update`].
    pub look_at: Vec3,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            fov_y_deg,
            aspect,
            near,
            far,
        }
    }

    /// Recomputes the aspect ratio as `width / height`. A zero-height
    /// viewport (minimized window) leaves the projection unchanged.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            min_distance: 8.0,
            max_distance: 17.0,
            max_polar_angle: std::f32::consts::PI / 2.2,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

const POLAR_EPS: f32 = 1e-6;

/// Orbit-style camera input around a target point: rotate by dragging, zoom
/// with the wheel, damped motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3, settings: &OrbitSettings) -> Self {
        Self {
            target,
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_damping: true,
            damping_factor: settings.damping_factor,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: settings.max_polar_angle,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Mouse drag in physical pixels; a drag the height of the viewport is a
    /// full turn.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled || !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        let turn = std::f32::consts::TAU * self.rotate_speed / viewport_height;
        self.delta_theta -= dx * turn;
        self.delta_phi -= dy * turn;
    }

    /// Positive `steps` zoom in (wheel away from the user).
    pub fn zoom(&mut self, steps: f32) {
        if !self.enabled || !self.enable_zoom || steps == 0.0 {
            return;
        }
        let step_scale = 0.95f32.powf(self.zoom_speed);
        self.scale *= step_scale.powf(steps);
    }

    /// Applies pending rotation/zoom, clamps distance and polar angle, and
    /// points `camera` at the target. Runs whether or not input is enabled.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, 0.0)
        };

        if self.enable_damping {
            theta += self.delta_theta * self.damping_factor;
            phi += self.delta_phi * self.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle.max(self.min_polar_angle))
            .clamp(POLAR_EPS, std::f32::consts::PI - POLAR_EPS);

        radius *= self.scale;
        radius = radius.clamp(self.min_distance, self.max_distance.max(self.min_distance));

        let sin_phi = phi.sin();
        let spherical = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = self.target + spherical;
        camera.look_at = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview() -> (PerspectiveCamera, OrbitControls) {
        let mut camera = PerspectiveCamera::new(35.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.position = Vec3::new(10.9, 2.7, -9.44);
        let controls = OrbitControls::new(Vec3::new(2.33, 1.23, 1.72), &OrbitSettings::default());
        (camera, controls)
    }

    #[test]
    fn resize_sets_exact_aspect() {
        let mut camera = PerspectiveCamera::new(35.0, 1.0, 0.1, 1000.0);
        assert!(camera.set_viewport_size(1920, 1080));
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
        assert!(camera.set_viewport_size(333, 777));
        assert_eq!(camera.aspect, 333.0 / 777.0);
    }

    #[test]
    fn zero_sized_viewport_keeps_previous_aspect() {
        let mut camera = PerspectiveCamera::new(35.0, 1.5, 0.1, 1000.0);
        assert!(!camera.set_viewport_size(800, 0));
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn update_clamps_distance_and_polar_angle() {
        let (mut camera, mut controls) = overview();
        camera.position = controls.target + Vec3::new(0.0, 0.5, 40.0);
        controls.update(&mut camera);

        let offset = camera.position - controls.target;
        assert!((offset.length() - 17.0).abs() < 1e-3);
        let phi = (offset.y / offset.length()).acos();
        assert!(phi <= controls.max_polar_angle + 1e-4);
        assert_eq!(camera.look_at, controls.target);
    }

    #[test]
    fn rotation_is_ignored_while_disabled() {
        let (mut camera, mut controls) = overview();
        controls.enable_rotate = false;
        controls.update(&mut camera);
        let settled = camera.position;

        controls.rotate_by_pixels(300.0, 0.0, 720.0);
        controls.update(&mut camera);
        assert!((camera.position - settled).length() < 1e-4);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let (mut camera, mut controls) = overview();
        controls.update(&mut camera);
        let start = camera.position;

        controls.rotate_by_pixels(100.0, 0.0, 720.0);
        controls.update(&mut camera);
        let first = camera.position;
        controls.update(&mut camera);
        let second = camera.position;

        assert!((first - start).length() > 0.0);
        assert!((second - first).length() > 0.0);
        assert!((second - first).length() < (first - start).length());
    }

    #[test]
    fn zoom_in_shrinks_distance_within_limits() {
        let (mut camera, mut controls) = overview();
        controls.update(&mut camera);
        let before = (camera.position - controls.target).length();
        controls.zoom(2.0);
        controls.update(&mut camera);
        let after = (camera.position - controls.target).length();
        assert!(after < before);
        assert!(after >= controls.min_distance - 1e-4);
    }
}
