use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::material::{rgb8, Rgb};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
    /// Light contribution reaches zero at this distance.
    pub distance: f32,
    pub decay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    /// Half angle of the cone, radians.
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub distance: f32,
    pub cast_shadow: bool,
    pub shadow: SpotShadow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotShadow {
    pub bias: f32,
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        let direction = (self.target - self.position).normalize_or_zero();
        if direction == Vec3::ZERO {
            Vec3::NEG_Y
        } else {
            direction
        }
    }
}

/// Tuning for the candle flicker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerParams {
    pub base_intensity: f32,
    pub frequency: f32,
    pub amplitude: f32,
    pub intensity_range: f32,
    pub position_range: f32,
    /// Per-axis bound on how far jitter may carry a light from its origin.
    pub max_drift: f32,
}

impl Default for FlickerParams {
    fn default() -> Self {
        Self {
            base_intensity: 2.0,
            frequency: 9.0,
            amplitude: 0.5,
            intensity_range: 0.1,
            position_range: 0.01,
            max_drift: 0.05,
        }
    }
}

impl FlickerParams {
    /// Inclusive bounds every flickered intensity stays within.
    pub fn intensity_bounds(&self) -> (f32, f32) {
        let spread = self.amplitude.abs() + self.intensity_range.abs() / 2.0;
        (self.base_intensity - spread, self.base_intensity + spread)
    }

    /// Deterministic part of the intensity at `elapsed` seconds.
    pub fn wave(&self, elapsed: f32) -> f32 {
        self.base_intensity + self.amplitude * (self.frequency * elapsed * 0.002).sin()
    }
}

/// Static spot light plus the three candle point lights.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub spot: SpotLight,
    pub points: [PointLight; 3],
    origins: [Vec3; 3],
}

impl Default for LightRig {
    fn default() -> Self {
        let orange = rgb8(0xff, 0xa5, 0x00);
        let point = |intensity: f32, position: Vec3, distance: f32| PointLight {
            color: orange,
            intensity,
            position,
            distance,
            decay: 2.0,
        };
        Self::new(
            SpotLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.95,
                position: Vec3::new(10.0, 15.0, -10.0),
                target: Vec3::new(0.0, 2.0, 6.0),
                angle: std::f32::consts::PI / 5.0,
                penumbra: 0.7,
                decay: 1.0,
                distance: 100.0,
                cast_shadow: true,
                shadow: SpotShadow {
                    bias: -0.0009,
                    map_size: 256,
                    near: 1.0,
                    far: 40.0,
                },
            },
            [
                point(2.25, Vec3::new(0.79, 1.53, -0.05), 2.5),
                point(3.25, Vec3::new(-1.06, 1.03, -0.72), 3.5),
                point(3.25, Vec3::new(0.08, 2.33, 1.21), 3.0),
            ],
        )
    }
}

impl LightRig {
    pub fn new(spot: SpotLight, points: [PointLight; 3]) -> Self {
        let origins = points.map(|light| light.position);
        Self {
            spot,
            points,
            origins,
        }
    }

    pub fn origins(&self) -> &[Vec3; 3] {
        &self.origins
    }
}

/// Recomputes candle light intensities and nudges their positions once per
/// frame.
#[derive(Debug, Clone, Copy)]
pub struct Flicker {
    params: FlickerParams,
}

impl Flicker {
    pub fn new(params: FlickerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FlickerParams {
        &self.params
    }

    /// Intensity for one channel: sine wave plus uniform noise in
    /// `[-range / 2, range / 2]`.
    pub fn sample_intensity<R: Rng + ?Sized>(&self, elapsed: f32, rng: &mut R) -> f32 {
        self.params.wave(elapsed) + self.symmetric(rng, self.params.intensity_range)
    }

    /// Channel one drives lights 0 and 1, channel two drives light 2. Light 0
    /// and 1 share a position offset, light 2 gets its own.
    pub fn update<R: Rng + ?Sized>(&self, elapsed: f32, rig: &mut LightRig, rng: &mut R) {
        let elapsed = elapsed.max(0.0);
        let primary = self.sample_intensity(elapsed, rng);
        let secondary = self.sample_intensity(elapsed, rng);
        rig.points[0].intensity = primary;
        rig.points[1].intensity = primary;
        rig.points[2].intensity = secondary;

        let shared = self.jitter(rng);
        let own = self.jitter(rng);
        let offsets = [shared, shared, own];
        for ((light, origin), offset) in rig.points.iter_mut().zip(rig.origins).zip(offsets) {
            light.position = self.clamp_drift(light.position + offset, origin);
        }
    }

    fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let range = self.params.position_range;
        Vec3::new(self.symmetric(rng, range), 0.0, self.symmetric(rng, range))
    }

    fn symmetric<R: Rng + ?Sized>(&self, rng: &mut R, range: f32) -> f32 {
        rng.gen::<f32>() * range - range / 2.0
    }

    fn clamp_drift(&self, position: Vec3, origin: Vec3) -> Vec3 {
        let drift = Vec3::splat(self.params.max_drift.abs());
        position.clamp(origin - drift, origin + drift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn intensity_stays_within_bounds() {
        let flicker = Flicker::new(FlickerParams::default());
        let (low, high) = flicker.params().intensity_bounds();
        assert!((low - 1.45).abs() < 1e-6);
        assert!((high - 2.55).abs() < 1e-6);

        let mut rng = StdRng::seed_from_u64(7);
        for step in 0..20_000 {
            let elapsed = step as f32 * 0.37;
            let value = flicker.sample_intensity(elapsed, &mut rng);
            assert!(value >= low - 1e-5 && value <= high + 1e-5, "t={elapsed}: {value}");
        }
    }

    #[test]
    fn first_two_lights_share_a_channel() {
        let flicker = Flicker::new(FlickerParams::default());
        let mut rig = LightRig::default();
        let mut rng = StdRng::seed_from_u64(11);
        flicker.update(12.5, &mut rig, &mut rng);
        assert_eq!(rig.points[0].intensity, rig.points[1].intensity);

        let moved_0 = rig.points[0].position - rig.origins()[0];
        let moved_1 = rig.points[1].position - rig.origins()[1];
        assert!((moved_0 - moved_1).length() < 1e-6);
    }

    #[test]
    fn jitter_only_moves_lights_horizontally() {
        let flicker = Flicker::new(FlickerParams::default());
        let mut rig = LightRig::default();
        let mut rng = StdRng::seed_from_u64(3);
        for frame in 0..100 {
            flicker.update(frame as f32 / 60.0, &mut rig, &mut rng);
        }
        for (light, origin) in rig.points.iter().zip(rig.origins()) {
            assert_eq!(light.position.y, origin.y);
        }
    }

    #[test]
    fn drift_is_bounded_over_long_sessions() {
        let params = FlickerParams {
            position_range: 0.5,
            max_drift: 0.05,
            ..FlickerParams::default()
        };
        let flicker = Flicker::new(params);
        let mut rig = LightRig::default();
        let mut rng = StdRng::seed_from_u64(99);
        for frame in 0..50_000 {
            flicker.update(frame as f32 / 60.0, &mut rig, &mut rng);
            for (light, origin) in rig.points.iter().zip(rig.origins()) {
                let offset = (light.position - *origin).abs();
                assert!(offset.max_element() <= 0.05 + 1e-5);
            }
        }
    }

    #[test]
    fn negative_elapsed_time_is_treated_as_zero() {
        let params = FlickerParams {
            intensity_range: 0.0,
            ..FlickerParams::default()
        };
        let flicker = Flicker::new(params);
        let mut rig = LightRig::default();
        let mut rng = StdRng::seed_from_u64(1);
        flicker.update(-5.0, &mut rig, &mut rng);
        assert_eq!(rig.points[2].intensity, params.base_intensity);
    }

    #[test]
    fn spot_points_at_its_target() {
        let rig = LightRig::default();
        let dir = rig.spot.direction();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.y < 0.0);
    }
}
