//! Wind sway for the flame mesh.
//!
//! The vertex shader in `render/shaders/scene.wgsl` evaluates the same
//! functions on the GPU; this module keeps a CPU copy so the displacement can
//! be reasoned about (and tested) without a device.

use glam::Vec2;

pub const SPATIAL_SCALE: f32 = 0.9;
pub const TIME_SCALE: Vec2 = Vec2::new(0.5, 0.9);
/// `0.5 + uv.y` has to exceed this before a vertex moves at all.
pub const BASE_THRESHOLD: f32 = 0.8;
pub const STRENGTH: f32 = 0.95;

fn mod289(x: f32) -> f32 {
    x - (x / 289.0).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

fn fract_gl(x: f32) -> f32 {
    x - x.floor()
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Classic 2D gradient noise (Gustavson's formulation), roughly in [-1, 1].
pub fn classic_noise_2d(p: Vec2) -> f32 {
    let cell = p.floor();
    let pi = [
        mod289(cell.x),
        mod289(cell.y),
        mod289(cell.x + 1.0),
        mod289(cell.y + 1.0),
    ];
    let pf = [
        fract_gl(p.x),
        fract_gl(p.y),
        fract_gl(p.x) - 1.0,
        fract_gl(p.y) - 1.0,
    ];

    let ix = [pi[0], pi[2], pi[0], pi[2]];
    let iy = [pi[1], pi[1], pi[3], pi[3]];
    let fx = [pf[0], pf[2], pf[0], pf[2]];
    let fy = [pf[1], pf[1], pf[3], pf[3]];

    // Corner order: 00, 10, 01, 11.
    let mut grads = [Vec2::ZERO; 4];
    for corner in 0..4 {
        let i = permute(permute(ix[corner]) + iy[corner]);
        let gx = 2.0 * fract_gl(i * 0.024_390_243_9) - 1.0;
        let gy = gx.abs() - 0.5;
        let tx = (gx + 0.5).floor();
        grads[corner] = Vec2::new(gx - tx, gy);
    }
    for grad in &mut grads {
        let norm = 1.792_842_914_001_59 - 0.853_734_720_953_14 * grad.dot(*grad);
        *grad *= norm;
    }

    let n00 = grads[0].dot(Vec2::new(fx[0], fy[0]));
    let n10 = grads[1].dot(Vec2::new(fx[1], fy[1]));
    let n01 = grads[2].dot(Vec2::new(fx[2], fy[2]));
    let n11 = grads[3].dot(Vec2::new(fx[3], fy[3]));

    let fade_x = fade(pf[0]);
    let fade_y = fade(pf[1]);
    let n_x0 = mix(n00, n10, fade_x);
    let n_x1 = mix(n01, n11, fade_x);
    2.3 * mix(n_x0, n_x1, fade_y)
}

/// World-space z offset for a flame vertex at `world_xz` with texture
/// coordinate `uv_y` at shader time `time` (seconds).
pub fn displacement_z(world_xz: Vec2, uv_y: f32, time: f32) -> f32 {
    let noise = classic_noise_2d(world_xz * SPATIAL_SCALE + TIME_SCALE * time);
    let strength = (1.0 - uv_y) * noise;
    (0.5 + uv_y - BASE_THRESHOLD).max(0.0) * strength * STRENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_vanishes_on_lattice_points() {
        for x in -3..3 {
            for y in -3..3 {
                let value = classic_noise_2d(Vec2::new(x as f32, y as f32));
                assert!(value.abs() < 1e-5, "noise at ({x}, {y}) = {value}");
            }
        }
    }

    #[test]
    fn noise_stays_bounded() {
        let mut max = 0.0f32;
        for ix in 0..200 {
            for iy in 0..200 {
                let p = Vec2::new(ix as f32 * 0.037 - 3.0, iy as f32 * 0.041 - 4.0);
                max = max.max(classic_noise_2d(p).abs());
            }
        }
        assert!(max < 1.5, "max |noise| = {max}");
        assert!(max > 0.1);
    }

    #[test]
    fn noise_is_continuous() {
        let step = 1e-3;
        for ix in 0..100 {
            let p = Vec2::new(ix as f32 * 0.173 - 5.0, ix as f32 * 0.091 + 1.3);
            let a = classic_noise_2d(p);
            let b = classic_noise_2d(p + Vec2::new(step, step));
            assert!((a - b).abs() < 0.05, "jump at {p:?}: {a} -> {b}");
        }
    }

    #[test]
    fn base_of_the_flame_does_not_move() {
        for time in [0.0, 1.7, 42.0] {
            for uv_y in [0.0, 0.1, 0.29] {
                assert_eq!(displacement_z(Vec2::new(0.4, -1.2), uv_y, time), 0.0);
            }
        }
    }

    #[test]
    fn tip_sways_over_time() {
        let xz = Vec2::new(0.31, 0.77);
        let samples: Vec<f32> = (0..50)
            .map(|frame| displacement_z(xz, 0.6, frame as f32 * 0.1))
            .collect();
        assert!(samples.iter().any(|value| value.abs() > 1e-4));
        for pair in samples.windows(2) {
            assert!((pair[0] - pair[1]).abs() < 0.1);
        }
    }
}
