use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::camera::{CameraPose, OrbitControls, PerspectiveCamera};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuarticInOut,
}

impl Easing {
    pub fn apply(self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);
        match self {
            Easing::Linear => k,
            Easing::QuarticInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k * k * k
                } else {
                    let k = k - 2.0;
                    -0.5 * (k * k * k * k - 2.0)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTiming {
    pub duration_ms: u64,
    pub delay_ms: u64,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            duration_ms: 2500,
            delay_ms: 100,
        }
    }
}

impl TransitionTiming {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenState {
    /// Still inside the start delay; nothing is written.
    Waiting,
    Running(Vec3),
    Finished(Vec3),
}

/// Interpolates a vector from `from` to `to`. Times are offsets on the
/// application clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Vec3,
    pub to: Vec3,
    pub started_at: Duration,
    pub delay: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, started_at: Duration, timing: &TransitionTiming) -> Self {
        Self {
            from,
            to,
            started_at,
            delay: timing.delay(),
            duration: timing.duration(),
            easing: Easing::QuarticInOut,
        }
    }

    /// Linear progress in `[0, 1]` at `now`, `None` during the delay.
    pub fn progress(&self, now: Duration) -> Option<f32> {
        let begin = self.started_at + self.delay;
        if now < begin {
            return None;
        }
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let local = (now - begin).as_secs_f64() / self.duration.as_secs_f64();
        Some(local.clamp(0.0, 1.0) as f32)
    }

    pub fn sample(&self, now: Duration) -> TweenState {
        match self.progress(now) {
            None => TweenState::Waiting,
            Some(progress) if progress >= 1.0 => TweenState::Finished(self.to),
            Some(progress) => {
                let eased = self.easing.apply(progress);
                TweenState::Running(self.from + (self.to - self.from) * eased)
            }
        }
    }
}

/// Position and orbit-target tweens started by one button press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransition {
    pub position: Tween,
    pub target: Tween,
    position_done: bool,
    target_done: bool,
}

impl CameraTransition {
    pub fn is_finished(&self) -> bool {
        self.position_done && self.target_done
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionUpdate {
    /// Position tweens that completed during this update.
    pub completed: usize,
    /// Transitions still in flight after the update.
    pub in_flight: usize,
}

/// Runs camera transitions. Starting a transition while another is in
/// flight does not cancel the older one: both keep writing every frame in
/// start order, so the newest one wins.
#[derive(Debug, Clone, Default)]
pub struct CameraAnimator {
    active: Vec<CameraTransition>,
    timing: TransitionTiming,
}

impl CameraAnimator {
    pub fn new(timing: TransitionTiming) -> Self {
        Self {
            active: Vec::new(),
            timing,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn transitions(&self) -> &[CameraTransition] {
        &self.active
    }

    /// Starts tweening from the current camera position and orbit target
    /// toward `destination`.
    pub fn start(
        &mut self,
        now: Duration,
        camera: &PerspectiveCamera,
        controls: &OrbitControls,
        destination: CameraPose,
    ) {
        log::debug!(
            "Camera transition to {:?} (target {:?})",
            destination.position,
            destination.target
        );
        self.active.push(CameraTransition {
            position: Tween::new(camera.position, destination.position, now, &self.timing),
            target: Tween::new(controls.target, destination.target, now, &self.timing),
            position_done: false,
            target_done: false,
        });
    }

    /// Writes tweened values into the camera and controls. A finished
    /// position tween re-enables the controls.
    pub fn update(
        &mut self,
        now: Duration,
        camera: &mut PerspectiveCamera,
        controls: &mut OrbitControls,
    ) -> TransitionUpdate {
        let mut update = TransitionUpdate::default();
        for transition in &mut self.active {
            if !transition.position_done {
                match transition.position.sample(now) {
                    TweenState::Waiting => {}
                    TweenState::Running(value) => camera.position = value,
                    TweenState::Finished(value) => {
                        camera.position = value;
                        transition.position_done = true;
                        controls.enabled = true;
                        update.completed += 1;
                    }
                }
            }
            if !transition.target_done {
                match transition.target.sample(now) {
                    TweenState::Waiting => {}
                    TweenState::Running(value) => controls.target = value,
                    TweenState::Finished(value) => {
                        controls.target = value;
                        transition.target_done = true;
                    }
                }
            }
        }
        self.active.retain(|transition| !transition.is_finished());
        update.in_flight = self.active.len();
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::camera::OrbitSettings;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn rig() -> (PerspectiveCamera, OrbitControls) {
        let mut camera = PerspectiveCamera::new(35.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(10.9, 2.7, -9.44);
        let controls = OrbitControls::new(Vec3::new(2.33, 1.23, 1.72), &OrbitSettings::default());
        (camera, controls)
    }

    fn explore() -> CameraPose {
        CameraPose {
            position: Vec3::new(10.0, 2.5, -8.44),
            target: Vec3::ZERO,
        }
    }

    #[test]
    fn quartic_easing_hits_endpoints_without_overshoot() {
        let ease = Easing::QuarticInOut;
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
        assert!((ease.apply(0.5) - 0.5).abs() < 1e-6);
        let mut previous = 0.0;
        for step in 0..=1000 {
            let value = ease.apply(step as f32 / 1000.0);
            assert!(value >= previous);
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn tween_starts_at_origin_and_ends_at_destination() {
        let timing = TransitionTiming::default();
        let from = Vec3::new(10.9, 2.7, -9.44);
        let to = Vec3::new(10.0, 2.5, -8.44);
        let tween = Tween::new(from, to, ms(1_000), &timing);

        assert_eq!(tween.sample(ms(1_050)), TweenState::Waiting);
        assert_eq!(tween.sample(ms(1_100)), TweenState::Running(from));
        assert_eq!(tween.sample(ms(3_600)), TweenState::Finished(to));
        assert_eq!(tween.sample(ms(9_000)), TweenState::Finished(to));
    }

    #[test]
    fn tween_moves_monotonically_per_axis() {
        let from = Vec3::new(10.9, 2.7, -9.44);
        let to = Vec3::new(10.0, 2.5, -8.44);
        let tween = Tween::new(from, to, Duration::ZERO, &TransitionTiming::default());
        let mut previous = from;
        for frame in 0..=200 {
            let value = match tween.sample(ms(100 + frame * 13)) {
                TweenState::Running(value) | TweenState::Finished(value) => value,
                TweenState::Waiting => panic!("delay already elapsed"),
            };
            assert!(value.x <= previous.x + 1e-6 && value.x >= to.x - 1e-6);
            assert!(value.y <= previous.y + 1e-6 && value.y >= to.y - 1e-6);
            assert!(value.z >= previous.z - 1e-6 && value.z <= to.z + 1e-6);
            previous = value;
        }
    }

    #[test]
    fn completing_position_tween_reenables_controls() {
        let (mut camera, mut controls) = rig();
        controls.enabled = false;
        let mut animator = CameraAnimator::new(TransitionTiming::default());
        animator.start(Duration::ZERO, &camera, &controls, explore());

        let mid = animator.update(ms(1_000), &mut camera, &mut controls);
        assert_eq!(mid.completed, 0);
        assert!(!controls.enabled);

        let done = animator.update(ms(2_600), &mut camera, &mut controls);
        assert_eq!(done.completed, 1);
        assert_eq!(done.in_flight, 0);
        assert!(controls.enabled);
        assert_eq!(camera.position, explore().position);
        assert_eq!(controls.target, explore().target);
    }

    #[test]
    fn newer_transition_wins_without_cancelling_older() {
        let (mut camera, mut controls) = rig();
        let mut animator = CameraAnimator::new(TransitionTiming::default());
        animator.start(Duration::ZERO, &camera, &controls, explore());
        animator.update(ms(1_000), &mut camera, &mut controls);

        let exit = CameraPose {
            position: Vec3::new(10.0, 2.5, -9.44),
            target: Vec3::new(2.33, 1.23, 1.72),
        };
        let midway = camera.position;
        animator.start(ms(1_000), &camera, &controls, exit);
        assert_eq!(animator.in_flight(), 2);
        assert_eq!(animator.transitions()[1].position.from, midway);

        // The first transition finishes first but the second keeps writing.
        let update = animator.update(ms(2_700), &mut camera, &mut controls);
        assert_eq!(update.completed, 1);
        assert_eq!(update.in_flight, 1);
        assert_ne!(camera.position, explore().position);

        animator.update(ms(3_700), &mut camera, &mut controls);
        assert_eq!(camera.position, exit.position);
        assert_eq!(controls.target, exit.target);
        assert_eq!(animator.in_flight(), 0);
    }
}
