//! Runtime configuration. Every field has a default reproducing the
//! hand-tuned still-life, so an empty JSON object is a valid config file.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::render::camera::{CameraPose, OrbitSettings};
use crate::render::tween::TransitionTiming;
use crate::scene::{FlickerParams, TranslucentParams};

pub const CONFIG_ENV_VAR: &str = "CANDLELIGHT_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid wax parameters: {0}")]
    Wax(#[from] crate::scene::material::ParamError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub model: PathBuf,
    pub environment: PathBuf,
    pub spot_mask: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/candles.glb"),
            environment: PathBuf::from("assets/gem_2.hdr"),
            spot_mask: PathBuf::from("assets/fakeShadow.jpg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Candlelight".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Pose on startup.
    pub initial: CameraPose,
    /// Destination of the "explore" transition.
    pub explore: CameraPose,
    /// Destination of the "exit" transition.
    pub exit: CameraPose,
    pub orbit: OrbitSettings,
    pub transition: TransitionTiming,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let overview_target = Vec3::new(2.33, 1.23, 1.72);
        Self {
            fov_y_deg: 35.0,
            near: 0.1,
            far: 1000.0,
            initial: CameraPose {
                position: Vec3::new(10.9, 2.7, -9.44),
                target: overview_target,
            },
            explore: CameraPose {
                position: Vec3::new(10.0, 2.5, -8.44),
                target: Vec3::ZERO,
            },
            exit: CameraPose {
                position: Vec3::new(10.0, 2.5, -9.44),
                target: overview_target,
            },
            orbit: OrbitSettings::default(),
            transition: TransitionTiming::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub bloom_intensity: f32,
    pub bloom_threshold: f32,
    pub bloom_smoothing: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub saturation: f32,
    pub exposure: f32,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            bloom_intensity: 2.0,
            bloom_threshold: 0.9,
            bloom_smoothing: 0.025,
            vignette_offset: 0.3,
            vignette_darkness: 0.7,
            saturation: 0.3,
            exposure: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assets: AssetPaths,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub flicker: FlickerParams,
    pub wax: TranslucentParams,
    pub post: PostConfig,
    /// Clear color, `#rrggbb` in sRGB.
    pub background: String,
    /// Delay between the scene finishing loading and the overlay appearing.
    pub reveal_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            flicker: FlickerParams::default(),
            wax: TranslucentParams::default(),
            post: PostConfig::default(),
            background: "#936045".to_string(),
            reveal_delay_ms: 2000,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        config.wax.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json, &path.display().to_string())
    }

    /// Loads the file named by the first CLI argument or by
    /// `CANDLELIGHT_CONFIG`; falls back to defaults when neither is set.
    pub fn discover() -> Result<Self, ConfigError> {
        let path = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                log::info!("No config file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}", "inline").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let json = r#"{
            "flicker": { "amplitude": 0.25 },
            "camera": { "transition": { "duration_ms": 1000 } },
            "wax": { "scattering": 0.5 }
        }"#;
        let config = AppConfig::from_json(json, "inline").unwrap();
        assert_eq!(config.flicker.amplitude, 0.25);
        assert_eq!(config.flicker.base_intensity, 2.0);
        assert_eq!(config.camera.transition.duration_ms, 1000);
        assert_eq!(config.camera.transition.delay_ms, 100);
        assert_eq!(config.wax.scattering, 0.5);
        assert_eq!(config.wax.ior, 2.9);
    }

    #[test]
    fn invalid_wax_parameters_are_rejected() {
        let err = AppConfig::from_json(r#"{ "wax": { "roughness": 3.0 } }"#, "inline")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Wax(_)));
    }

    #[test]
    fn malformed_json_reports_origin() {
        let err = AppConfig::from_json("{ nope", "scene.json").unwrap_err();
        assert!(err.to_string().contains("scene.json"));
    }

    #[test]
    fn save_and_load_via_file() {
        let mut config = AppConfig::default();
        config.reveal_delay_ms = 500;
        config.camera.explore.position = Vec3::new(1.0, 2.0, 3.0);

        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "candlelight_config_{}_{}.json",
            std::process::id(),
            nonce
        ));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load_from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
